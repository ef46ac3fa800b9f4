//! # CF 时间坐标
//!
//! 解析 `units = "<unit> since YYYY-MM-DD[ hh:mm:ss]"` 并将数值时间轴转换为日期。
//!
//! ## 依赖关系
//! - 被 `parsers/netcdf.rs` 使用
//! - 使用 `regex`, `chrono`

use crate::error::{Result, UnseenError};

use chrono::{Duration, NaiveDate};
use regex::Regex;

/// 时间单位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl TimeUnit {
    fn seconds(&self) -> f64 {
        match self {
            TimeUnit::Days => 86_400.0,
            TimeUnit::Hours => 3_600.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Seconds => 1.0,
        }
    }
}

/// 解析后的 CF 时间单位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeAxis {
    pub unit: TimeUnit,
    pub reference: NaiveDate,
}

impl TimeAxis {
    /// 解析 units 属性
    pub fn parse(units: &str) -> Result<Self> {
        let re = Regex::new(r"^\s*(days|hours|minutes|seconds)\s+since\s+(\d{4})-(\d{1,2})-(\d{1,2})")
            .map_err(|e| UnseenError::Other(e.to_string()))?;
        let invalid = || UnseenError::InvalidArgument(format!("unsupported CF time units '{}'", units));

        let caps = re.captures(units).ok_or_else(invalid)?;
        let unit = match &caps[1] {
            "days" => TimeUnit::Days,
            "hours" => TimeUnit::Hours,
            "minutes" => TimeUnit::Minutes,
            _ => TimeUnit::Seconds,
        };
        let year: i32 = caps[2].parse().map_err(|_| invalid())?;
        let month: u32 = caps[3].parse().map_err(|_| invalid())?;
        let day: u32 = caps[4].parse().map_err(|_| invalid())?;
        let reference = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)?;

        Ok(Self { unit, reference })
    }

    /// 数值时间转日期（向下取整到日）
    pub fn to_date(&self, value: f64) -> Option<NaiveDate> {
        if !value.is_finite() {
            return None;
        }
        let secs = (value * self.unit.seconds()).floor();
        let days = (secs / 86_400.0).floor() as i64;
        self.reference.checked_add_signed(Duration::days(days))
    }

    /// 整条时间轴转换
    pub fn decode(&self, values: &[f64]) -> Result<Vec<NaiveDate>> {
        values
            .iter()
            .map(|&v| {
                self.to_date(v).ok_or_else(|| {
                    UnseenError::InvalidArgument(format!("time value {} is out of range", v))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_units() {
        let axis = TimeAxis::parse("days since 1981-01-01 00:00:00").unwrap();
        assert_eq!(axis.unit, TimeUnit::Days);
        assert_eq!(axis.reference, NaiveDate::from_ymd_opt(1981, 1, 1).unwrap());

        let axis = TimeAxis::parse("hours since 1900-1-1").unwrap();
        assert_eq!(axis.unit, TimeUnit::Hours);

        assert!(TimeAxis::parse("months since 1900-01-01").is_err());
        assert!(TimeAxis::parse("days since 1900-13-01").is_err());
    }

    #[test]
    fn test_decode() {
        let axis = TimeAxis::parse("hours since 2023-06-01").unwrap();
        let dates = axis.decode(&[0.0, 12.0, 24.0, 36.0]).unwrap();
        let d = |day| NaiveDate::from_ymd_opt(2023, 6, day).unwrap();
        assert_eq!(dates, vec![d(1), d(1), d(2), d(2)]);

        let axis = TimeAxis::parse("days since 2023-06-01").unwrap();
        assert_eq!(axis.to_date(-1.0), Some(NaiveDate::from_ymd_opt(2023, 5, 31).unwrap()));
        assert!(axis.decode(&[f64::NAN]).is_err());
    }
}
