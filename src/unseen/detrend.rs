//! # 枢轴去趋势 (pivot detrending)
//!
//! 对季节平均做线性回归，将每年的数据平移到枢轴年份的气候背景：
//!
//! offset(y) = fit(y) - fit(pivot) = slope * (y - pivot)
//!
//! 数据减去 offset 后，枢轴年份保持不变，其余年份沿趋势线平移。
//! 枢轴年份可以超出拟合年份（外推）。
//!
//! ## 依赖关系
//! - 被 `unseen/distribution.rs`, `unseen/risk.rs`, `commands/` 使用
//! - 使用 `stats/regression.rs`

use crate::config::TrendSource;
use crate::error::{Result, UnseenError};
use crate::models::{PooledEnsemble, SeasonalObs};
use crate::stats::regression::{linregress, LinearFit};

use ndarray::Array2;

/// 对 `[region, year]` 季节平均逐区域回归
fn fit_rows(means: &Array2<f64>, years: &[i32], what: &str) -> Result<Vec<LinearFit>> {
    if means.ncols() != years.len() {
        return Err(UnseenError::DimensionMismatch {
            what: format!("{} years", what),
            expected: years.len(),
            found: means.ncols(),
        });
    }
    let x: Vec<f64> = years.iter().map(|&y| y as f64).collect();
    means
        .rows()
        .into_iter()
        .map(|row| linregress(&x, &row.to_vec()))
        .collect()
}

/// 观测季节平均的线性趋势（每区域一个）
pub fn observed_trends(obs: &SeasonalObs) -> Result<Vec<LinearFit>> {
    fit_rows(&obs.seasonal_means(), &obs.years, "observed seasonal mean")
}

/// 集合平均季节平均的线性趋势（每区域一个）
pub fn model_trends(pooled: &PooledEnsemble) -> Result<Vec<LinearFit>> {
    fit_rows(
        &pooled.ensemble_mean_seasonal(),
        &pooled.years,
        "ensemble-mean seasonal mean",
    )
}

/// 按趋势来源选择回归
pub fn trend_fits(
    source: TrendSource,
    obs_full: &SeasonalObs,
    pooled: &PooledEnsemble,
) -> Result<Vec<LinearFit>> {
    match source {
        TrendSource::Obs => observed_trends(obs_full),
        TrendSource::Model => model_trends(pooled),
    }
}

/// 各年份相对枢轴年份的偏移量
pub fn pivot_offsets(fit: &LinearFit, years: &[i32], pivot: i32) -> Vec<f64> {
    let at_pivot = fit.predict(pivot as f64);
    years
        .iter()
        .map(|&y| fit.predict(y as f64) - at_pivot)
        .collect()
}

/// 所有区域的偏移量 `[region, year]`；`fits` 为 None 时全为 0（不去趋势）
pub fn offset_table(
    fits: Option<&[LinearFit]>,
    n_regions: usize,
    years: &[i32],
    pivot: i32,
) -> Array2<f64> {
    let mut table = Array2::zeros((n_regions, years.len()));
    if let Some(fits) = fits {
        for (r, fit) in fits.iter().enumerate().take(n_regions) {
            for (y, v) in pivot_offsets(fit, years, pivot).into_iter().enumerate() {
                table[[r, y]] = v;
            }
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn fit_with_slope(slope: f64) -> LinearFit {
        let x = [2000.0, 2001.0, 2002.0];
        let y: Vec<f64> = x.iter().map(|v| 10.0 + slope * (v - 2000.0)).collect();
        linregress(&x, &y).unwrap()
    }

    #[test]
    fn test_pivot_year_is_unchanged() {
        let fit = fit_with_slope(0.05);
        let years = [1993, 2000, 2016, 2024];
        let offsets = pivot_offsets(&fit, &years, 2016);
        assert!(offsets[2].abs() < 1e-12);
        assert!((offsets[0] - 0.05 * (1993.0 - 2016.0)).abs() < 1e-9);
        // 外推枢轴年份
        assert!((offsets[3] - 0.05 * 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_observed_trends_per_region() {
        // 两个区域，趋势分别为 0.1 与 -0.2 / 年
        let values = Array3::from_shape_fn((2, 5, 3), |(r, y, _)| {
            let slope = if r == 0 { 0.1 } else { -0.2 };
            15.0 + slope * y as f64
        });
        let obs = SeasonalObs {
            regions: vec!["A".to_string(), "B".to_string()],
            years: (2000..2005).collect(),
            values,
        };
        let fits = observed_trends(&obs).unwrap();
        assert_eq!(fits.len(), 2);
        assert!((fits[0].slope - 0.1).abs() < 1e-10);
        assert!((fits[1].slope + 0.2).abs() < 1e-10);
    }

    #[test]
    fn test_offset_table_without_fits_is_zero() {
        let table = offset_table(None, 2, &[1993, 1994], 2024);
        assert!(table.iter().all(|&v| v == 0.0));

        let fits = vec![fit_with_slope(1.0)];
        let table = offset_table(Some(&fits), 1, &[2022, 2024], 2024);
        assert!((table[[0, 0]] + 2.0).abs() < 1e-9);
        assert!(table[[0, 1]].abs() < 1e-9);
    }
}
