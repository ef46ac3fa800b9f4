//! # 观测侧指标
//!
//! - 与回报期重叠年份的观测 NMAX（用于保真度检验）
//! - 关注事件（如 2023 年 6 月）的距平峰值
//!
//! 观测距平均相对于重叠年份的逐日气候态，与模式距平口径一致。
//!
//! ## 依赖关系
//! - 被 `commands/context.rs` 使用
//! - 使用 `unseen/nmax.rs`, `models/observation.rs`

use crate::error::{Result, UnseenError};
use crate::models::{ObsRecord, Season, SeasonalObs};
use crate::unseen::nmax::rolling_max;

use chrono::NaiveDate;
use ndarray::Array2;

/// 重叠年份观测的 NMAX `[region, year]`
///
/// 先减去枢轴偏移量，再减去（未去趋势的）逐日气候态，最后取滑动平均最大值。
/// `offsets` 的年份必须与 `obs_match.years` 一致。
pub fn observed_nmax(
    obs_match: &SeasonalObs,
    offsets: &Array2<f64>,
    window: usize,
) -> Result<Array2<f64>> {
    let (n_reg, n_year, n_day) = obs_match.values.dim();
    if offsets.dim() != (n_reg, n_year) {
        return Err(UnseenError::DimensionMismatch {
            what: "observed years vs. hindcast years".to_string(),
            expected: n_reg * n_year,
            found: offsets.len(),
        });
    }

    let clim = obs_match.day_climatology();
    let mut out = Array2::from_elem((n_reg, n_year), f64::NAN);
    let mut series = vec![0.0; n_day];
    for r in 0..n_reg {
        for y in 0..n_year {
            for (d, slot) in series.iter_mut().enumerate() {
                *slot = obs_match.values[[r, y, d]] - offsets[[r, y]] - clim[[r, d]];
            }
            out[[r, y]] = rolling_max(&series, window);
        }
    }
    Ok(out)
}

/// 关注事件
#[derive(Debug, Clone)]
pub struct FocusEvent {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// 逐日距平 `[region, day]`
    pub anomalies: Array2<f64>,
    /// 各区域距平的 N 日滑动平均最大值
    pub peaks: Vec<f64>,
}

/// 计算关注事件峰值
///
/// 事件时段必须落在同一个季节内；缺测日记为 NaN。
pub fn focus_event_peak(
    obs: &ObsRecord,
    climatology: &Array2<f64>,
    season: &Season,
    start: NaiveDate,
    end: NaiveDate,
    window: usize,
    label: &str,
) -> Result<FocusEvent> {
    if start > end {
        return Err(UnseenError::InvalidRange(format!(
            "event start {} is after end {}",
            start, end
        )));
    }
    if climatology.nrows() != obs.regions.len() {
        return Err(UnseenError::DimensionMismatch {
            what: "climatology regions".to_string(),
            expected: obs.regions.len(),
            found: climatology.nrows(),
        });
    }

    let dates: Vec<NaiveDate> = start.iter_days().take_while(|d| *d <= end).collect();
    let mut day_indices = Vec::with_capacity(dates.len());
    let mut season_year = None;
    for date in &dates {
        let (year, day) = season.day_index(*date).ok_or_else(|| {
            UnseenError::InvalidRange(format!(
                "event date {} is outside the {} season",
                date, season
            ))
        })?;
        match season_year {
            None => season_year = Some(year),
            Some(y) if y != year => {
                return Err(UnseenError::InvalidRange(format!(
                    "event {} - {} spans more than one {} season",
                    start, end, season
                )))
            }
            _ => {}
        }
        if day >= climatology.ncols() {
            return Err(UnseenError::DimensionMismatch {
                what: "season day in climatology".to_string(),
                expected: day + 1,
                found: climatology.ncols(),
            });
        }
        day_indices.push(day);
    }

    let n_reg = obs.regions.len();
    let mut anomalies = Array2::from_elem((n_reg, dates.len()), f64::NAN);
    for r in 0..n_reg {
        for (k, (date, &day)) in dates.iter().zip(&day_indices).enumerate() {
            if let Some(v) = obs.value_on(r, *date) {
                anomalies[[r, k]] = v - climatology[[r, day]];
            }
        }
    }

    let peaks = anomalies
        .rows()
        .into_iter()
        .map(|row| rolling_max(&row.to_vec(), window))
        .collect();

    Ok(FocusEvent {
        label: label.to_string(),
        start,
        end,
        anomalies,
        peaks,
    })
}
