//! # 季节定义
//!
//! 描述分析使用的季节窗口（如 JJA、DJF），支持跨年季节。
//!
//! ## 约定
//! - 月份为 1-12，必须连续（允许 12 -> 1 跨年）
//! - "季节年" 指季节首月所在的年份，例如 1993 DJF 对应 1993-12 ~ 1994-02
//! - 季节逐日数组长度统一为 `max_length()`，非闰年缺少的 2 月 29 日在末尾补 NaN
//!
//! ## 依赖关系
//! - 被 `models/observation.rs`, `unseen/observed.rs`, `config.rs` 使用
//! - 使用 `chrono` 计算日期

use crate::error::{Result, UnseenError};

use chrono::{Datelike, NaiveDate};

/// 季节窗口
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Season {
    /// 按时间顺序排列的月份 (1-12)
    months: Vec<u32>,
    /// 季节名称（如 "JJA"）
    name: String,
}

impl Season {
    /// 创建季节并校验月份连续性
    pub fn new(months: Vec<u32>, name: impl Into<String>) -> Result<Self> {
        if months.is_empty() || months.len() > 12 {
            return Err(UnseenError::InvalidArgument(format!(
                "season must contain 1-12 months, got {}",
                months.len()
            )));
        }
        if let Some(bad) = months.iter().find(|m| !(1..=12).contains(*m)) {
            return Err(UnseenError::InvalidArgument(format!(
                "invalid month {} in season",
                bad
            )));
        }
        for pair in months.windows(2) {
            if pair[1] != pair[0] % 12 + 1 {
                return Err(UnseenError::InvalidArgument(format!(
                    "season months must be consecutive, got {:?}",
                    months
                )));
            }
        }

        Ok(Self {
            months,
            name: name.into(),
        })
    }

    /// 北半球夏季 June-July-August
    pub fn jja() -> Self {
        Self {
            months: vec![6, 7, 8],
            name: "JJA".to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn months(&self) -> &[u32] {
        &self.months
    }

    /// 是否包含 2 月（决定是否需要闰日补齐）
    pub fn contains_february(&self) -> bool {
        self.months.contains(&2)
    }

    /// 季节内各月对应的 (年, 月)
    pub fn months_with_years(&self, year: i32) -> Vec<(i32, u32)> {
        let first = self.months[0];
        self.months
            .iter()
            .map(|&m| if m >= first { (year, m) } else { (year + 1, m) })
            .collect()
    }

    /// 指定季节年的天数
    pub fn length_in(&self, year: i32) -> usize {
        self.months_with_years(year)
            .into_iter()
            .map(|(y, m)| days_in_month(y, m) as usize)
            .sum()
    }

    /// 季节最大天数（2 月按 29 天计）
    pub fn max_length(&self) -> usize {
        self.months
            .iter()
            .map(|&m| days_in_month(2000, m) as usize)
            .sum()
    }

    /// 季节首日
    pub fn start_date(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.months[0], 1)
    }

    /// 季节末日
    pub fn end_date(&self, year: i32) -> Option<NaiveDate> {
        let start = self.start_date(year)?;
        start.checked_add_signed(chrono::Duration::days(self.length_in(year) as i64 - 1))
    }

    /// 日期在季节中的位置：返回 (季节年, 季节内第几天，0 起)
    pub fn day_index(&self, date: NaiveDate) -> Option<(i32, usize)> {
        for year in [date.year(), date.year() - 1] {
            let Some(start) = self.start_date(year) else {
                continue;
            };
            let offset = (date - start).num_days();
            if offset >= 0 && (offset as usize) < self.length_in(year) {
                return Some((year, offset as usize));
            }
        }
        None
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// 某年某月的天数
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jja_length() {
        let season = Season::jja();
        assert_eq!(season.length_in(1993), 92);
        assert_eq!(season.length_in(2000), 92);
        assert_eq!(season.max_length(), 92);
        assert!(!season.contains_february());
    }

    #[test]
    fn test_djf_wraps_year() {
        let season = Season::new(vec![12, 1, 2], "DJF").unwrap();
        assert_eq!(
            season.months_with_years(1999),
            vec![(1999, 12), (2000, 1), (2000, 2)]
        );
        // 2000 年 2 月为闰月
        assert_eq!(season.length_in(1999), 91);
        assert_eq!(season.length_in(2000), 90);
        assert_eq!(season.max_length(), 91);
        assert!(season.contains_february());
    }

    #[test]
    fn test_rejects_non_consecutive_months() {
        assert!(Season::new(vec![6, 8], "JA").is_err());
        assert!(Season::new(vec![], "none").is_err());
        assert!(Season::new(vec![13], "bad").is_err());
    }

    #[test]
    fn test_day_index() {
        let season = Season::jja();
        let d = NaiveDate::from_ymd_opt(2023, 6, 15).unwrap();
        assert_eq!(season.day_index(d), Some((2023, 14)));
        let outside = NaiveDate::from_ymd_opt(2023, 9, 1).unwrap();
        assert_eq!(season.day_index(outside), None);

        let djf = Season::new(vec![12, 1, 2], "DJF").unwrap();
        let jan = NaiveDate::from_ymd_opt(2001, 1, 1).unwrap();
        assert_eq!(djf.day_index(jan), Some((2000, 31)));
    }

    #[test]
    fn test_end_date() {
        let season = Season::jja();
        assert_eq!(
            season.end_date(2010),
            NaiveDate::from_ymd_opt(2010, 8, 31)
        );
    }
}
