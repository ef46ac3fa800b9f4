//! # 观测数据模型
//!
//! 区域平均逐日 SST 观测记录，以及按季节切片后的 `[region, year, day]` 数组。
//!
//! ## 依赖关系
//! - 被 `parsers/` 构造
//! - 被 `unseen/` 和 `commands/` 使用
//! - 使用 `models/season.rs`, `stats/descriptive.rs`

use crate::error::{Result, UnseenError};
use crate::models::Season;
use crate::stats::descriptive::nanmean;

use chrono::{Datelike, NaiveDate};
use ndarray::{Array2, Array3, Axis};

/// 逐日观测记录
#[derive(Debug, Clone)]
pub struct ObsRecord {
    /// 区域名称
    pub regions: Vec<String>,
    /// 严格递增的日期
    pub dates: Vec<NaiveDate>,
    /// 数据 `[region, time]`
    pub values: Array2<f64>,
}

impl ObsRecord {
    /// 创建观测记录并校验维度
    pub fn new(regions: Vec<String>, dates: Vec<NaiveDate>, values: Array2<f64>) -> Result<Self> {
        if values.dim() != (regions.len(), dates.len()) {
            return Err(UnseenError::DimensionMismatch {
                what: "observation values".to_string(),
                expected: regions.len() * dates.len(),
                found: values.len(),
            });
        }
        if dates.windows(2).any(|w| w[1] <= w[0]) {
            return Err(UnseenError::InvalidArgument(
                "observation dates must be strictly increasing".to_string(),
            ));
        }
        Ok(Self {
            regions,
            dates,
            values,
        })
    }

    /// 按给定顺序选择区域
    pub fn select_regions(&self, names: &[String]) -> Result<Self> {
        let indices = region_indices(&self.regions, names)?;
        Ok(Self {
            regions: names.to_vec(),
            dates: self.dates.clone(),
            values: self.values.select(Axis(0), &indices),
        })
    }

    /// 截取日期区间（两端包含）
    pub fn slice_dates(&self, start: NaiveDate, end: NaiveDate) -> Self {
        let indices: Vec<usize> = self
            .dates
            .iter()
            .enumerate()
            .filter(|(_, d)| **d >= start && **d <= end)
            .map(|(i, _)| i)
            .collect();
        Self {
            regions: self.regions.clone(),
            dates: indices.iter().map(|&i| self.dates[i]).collect(),
            values: self.values.select(Axis(1), &indices),
        }
    }

    /// 记录中出现的年份（去重、升序）
    pub fn years(&self) -> Vec<i32> {
        let mut years: Vec<i32> = self.dates.iter().map(|d| d.year()).collect();
        years.dedup();
        years
    }

    /// 季节完全落在记录范围内的季节年
    pub fn complete_season_years(&self, season: &Season) -> Vec<i32> {
        let (Some(first), Some(last)) = (self.dates.first(), self.dates.last()) else {
            return Vec::new();
        };
        (first.year() - 1..=last.year())
            .filter(|&y| match (season.start_date(y), season.end_date(y)) {
                (Some(s), Some(e)) => s >= *first && e <= *last,
                _ => false,
            })
            .collect()
    }

    /// 取单个日期的数据（缺测返回 None）
    pub fn value_on(&self, region: usize, date: NaiveDate) -> Option<f64> {
        self.dates
            .binary_search(&date)
            .ok()
            .map(|t| self.values[[region, t]])
    }

    /// 按季节抽取逐日数据 `[region, year, day]`
    ///
    /// 每年从季节首月 1 日开始，取该季节年的实际天数；
    /// 不足 `max_length()` 的部分（非闰年 2 月）在末尾补 NaN，缺测日同样为 NaN。
    pub fn extract_season(&self, season: &Season, years: &[i32]) -> Result<SeasonalObs> {
        if years.is_empty() {
            return Err(UnseenError::InsufficientData {
                what: format!("{} season extraction", season),
                needed: 1,
                got: 0,
            });
        }

        let n_days = season.max_length();
        let mut values = Array3::from_elem((self.regions.len(), years.len(), n_days), f64::NAN);

        for (yi, &year) in years.iter().enumerate() {
            let start = season.start_date(year).ok_or_else(|| {
                UnseenError::InvalidArgument(format!("invalid season start for year {}", year))
            })?;
            for day in 0..season.length_in(year) {
                let date = start + chrono::Duration::days(day as i64);
                if let Ok(t) = self.dates.binary_search(&date) {
                    for r in 0..self.regions.len() {
                        values[[r, yi, day]] = self.values[[r, t]];
                    }
                }
            }
        }

        Ok(SeasonalObs {
            regions: self.regions.clone(),
            years: years.to_vec(),
            values,
        })
    }
}

/// 季节切片后的观测 `[region, year, day]`
#[derive(Debug, Clone)]
pub struct SeasonalObs {
    pub regions: Vec<String>,
    pub years: Vec<i32>,
    pub values: Array3<f64>,
}

impl SeasonalObs {
    /// 季节内天数
    pub fn n_days(&self) -> usize {
        self.values.dim().2
    }

    /// 季节平均 `[region, year]`（跳过 NaN）
    pub fn seasonal_means(&self) -> Array2<f64> {
        let (n_reg, n_year, _) = self.values.dim();
        Array2::from_shape_fn((n_reg, n_year), |(r, y)| {
            let days: Vec<f64> = self.values.slice(ndarray::s![r, y, ..]).to_vec();
            nanmean(&days)
        })
    }

    /// 逐日气候态 `[region, day]`（跨年平均，跳过 NaN）
    pub fn day_climatology(&self) -> Array2<f64> {
        let (n_reg, _, n_days) = self.values.dim();
        Array2::from_shape_fn((n_reg, n_days), |(r, d)| {
            let column: Vec<f64> = self.values.slice(ndarray::s![r, .., d]).to_vec();
            nanmean(&column)
        })
    }

    /// 按年份选择（保持给定顺序）
    pub fn select_years(&self, years: &[i32]) -> Result<Self> {
        let indices = years
            .iter()
            .map(|y| {
                self.years.iter().position(|x| x == y).ok_or_else(|| {
                    UnseenError::InvalidArgument(format!("year {} not in observations", y))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            regions: self.regions.clone(),
            years: years.to_vec(),
            values: self.values.select(Axis(1), &indices),
        })
    }
}

/// 按名称查找区域索引
pub fn region_indices(available: &[String], names: &[String]) -> Result<Vec<usize>> {
    names
        .iter()
        .map(|name| {
            available
                .iter()
                .position(|r| r == name)
                .ok_or_else(|| UnseenError::MissingRegion(name.clone()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn daily_record(start: NaiveDate, n: usize, regions: &[&str]) -> ObsRecord {
        let dates: Vec<NaiveDate> = (0..n)
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect();
        let values = Array2::from_shape_fn((regions.len(), n), |(r, t)| r as f64 * 100.0 + t as f64);
        ObsRecord::new(regions.iter().map(|s| s.to_string()).collect(), dates, values).unwrap()
    }

    #[test]
    fn test_extract_jja() {
        let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let obs = daily_record(start, 366 * 2, &["A"]);
        let season = Season::jja();

        let years = obs.complete_season_years(&season);
        assert_eq!(years, vec![2000, 2001]);

        let seasonal = obs.extract_season(&season, &years).unwrap();
        assert_eq!(seasonal.values.dim(), (1, 2, 92));
        // 2000-06-01 是第 152 天（闰年，0 起）
        assert_eq!(seasonal.values[[0, 0, 0]], 152.0);
        assert!(seasonal.values.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_extract_djf_pads_non_leap_february() {
        let start = NaiveDate::from_ymd_opt(1999, 12, 1).unwrap();
        let obs = daily_record(start, 500, &["A"]);
        let season = Season::new(vec![12, 1, 2], "DJF").unwrap();

        let seasonal = obs.extract_season(&season, &[1999, 2000]).unwrap();
        assert_eq!(seasonal.n_days(), 91);
        // 1999 DJF 含 2000-02-29
        assert!(seasonal.values[[0, 0, 90]].is_finite());
        // 2000 DJF 不含闰日，末尾补 NaN
        assert!(seasonal.values[[0, 1, 89]].is_finite());
        assert!(seasonal.values[[0, 1, 90]].is_nan());
    }

    #[test]
    fn test_select_regions_keeps_order() {
        let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let obs = daily_record(start, 3, &["A", "B"]);
        let picked = obs
            .select_regions(&["B".to_string(), "A".to_string()])
            .unwrap();
        assert_eq!(picked.regions, vec!["B", "A"]);
        assert_eq!(picked.values[[0, 0]], 100.0);

        assert!(obs.select_regions(&["C".to_string()]).is_err());
    }

    #[test]
    fn test_seasonal_means_and_climatology() {
        let values = Array3::from_shape_vec((1, 2, 2), vec![1.0, 3.0, 5.0, f64::NAN]).unwrap();
        let seasonal = SeasonalObs {
            regions: vec!["A".to_string()],
            years: vec![2000, 2001],
            values,
        };
        let means = seasonal.seasonal_means();
        assert_eq!(means[[0, 0]], 2.0);
        assert_eq!(means[[0, 1]], 5.0);

        let clim = seasonal.day_climatology();
        assert_eq!(clim[[0, 0]], 3.0);
        assert_eq!(clim[[0, 1]], 3.0);
    }

    #[test]
    fn test_slice_dates_inclusive() {
        let start = NaiveDate::from_ymd_opt(2023, 6, 1).unwrap();
        let obs = daily_record(start, 60, &["A"]);
        let june = obs.slice_dates(start, NaiveDate::from_ymd_opt(2023, 6, 30).unwrap());
        assert_eq!(june.dates.len(), 30);
    }
}
