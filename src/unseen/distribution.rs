//! # UNSEEN 分布
//!
//! 由合并集合构造 JJA-NMAX 样本分布。
//!
//! ## 流程
//! 1. 减去集合逐日气候态（先对 realisation、再对年份平均）去季节
//! 2. 对每个 (region, realisation, year) 取 N 日滑动平均最大值
//! 3. 减去枢轴去趋势偏移量
//!
//! 季节内偏移量为常数，`NMAX(x - c) = NMAX(x) - c`，因此第 2 步只需做一次，
//! 不同枢轴年份只需重新减去偏移量（见 `unseen/risk.rs`）。
//!
//! ## 依赖关系
//! - 被 `unseen/risk.rs`, `unseen/fidelity.rs`, `unseen/extremes.rs`, `commands/` 使用
//! - 使用 `unseen/nmax.rs`, `unseen/detrend.rs`

use crate::error::{Result, UnseenError};
use crate::models::{PooledEnsemble, RealisationLabel};
use crate::stats::descriptive::{exceedance_probability, mean, nanmax, percentile_rank, std_dev};
use crate::stats::LinearFit;
use crate::unseen::detrend::offset_table;
use crate::unseen::nmax::rolling_max;

use ndarray::{s, Array2, Array3};

/// 去季节（未去趋势）的 NMAX `[region, realisation, year]`
#[derive(Debug, Clone)]
pub struct NmaxField {
    pub regions: Vec<String>,
    pub years: Vec<i32>,
    pub labels: Vec<RealisationLabel>,
    pub window: usize,
    pub values: Array3<f64>,
}

impl NmaxField {
    /// 从合并集合计算
    pub fn from_ensemble(pooled: &PooledEnsemble, window: usize) -> Result<Self> {
        let (n_reg, n_real, n_year, n_day) = pooled.values.dim();
        if window == 0 || window > n_day {
            return Err(UnseenError::InvalidArgument(format!(
                "averaging window must be between 1 and {} days, got {}",
                n_day, window
            )));
        }

        let clim = pooled.climatology();
        let mut values = Array3::from_elem((n_reg, n_real, n_year), f64::NAN);
        let mut series = vec![0.0; n_day];
        for r in 0..n_reg {
            for i in 0..n_real {
                for y in 0..n_year {
                    for (d, slot) in series.iter_mut().enumerate() {
                        *slot = pooled.values[[r, i, y, d]] - clim[[r, d]];
                    }
                    values[[r, i, y]] = rolling_max(&series, window);
                }
            }
        }

        Ok(Self {
            regions: pooled.regions.clone(),
            years: pooled.years.clone(),
            labels: pooled.labels.clone(),
            window,
            values,
        })
    }

    pub fn n_realisations(&self) -> usize {
        self.values.dim().1
    }

    pub fn n_years(&self) -> usize {
        self.years.len()
    }

    /// 某区域的样本（realisation 在外层，年份在内层）减去逐年偏移量
    pub fn samples(&self, region: usize, offsets: &[f64]) -> Vec<f64> {
        let block = self.values.slice(s![region, .., ..]);
        block
            .outer_iter()
            .flat_map(|row| {
                row.iter()
                    .zip(offsets)
                    .map(|(v, o)| v - o)
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// 单个 realisation 的逐年序列（已减去偏移量）
    pub fn year_series(&self, region: usize, realisation: usize, offsets: &[f64]) -> Vec<f64> {
        self.values
            .slice(s![region, realisation, ..])
            .iter()
            .zip(offsets)
            .map(|(v, o)| v - o)
            .collect()
    }
}

/// 区域分布摘要
#[derive(Debug, Clone)]
pub struct RegionSummary {
    pub region: String,
    pub n: usize,
    pub mean: f64,
    pub std_dev: f64,
    pub max: f64,
}

/// 枢轴去趋势后的 UNSEEN 分布
#[derive(Debug, Clone)]
pub struct UnseenDistribution {
    pub regions: Vec<String>,
    pub years: Vec<i32>,
    pub labels: Vec<RealisationLabel>,
    /// None 表示未去趋势
    pub pivot_year: Option<i32>,
    /// 各区域逐年偏移量 `[region, year]`
    pub offsets: Array2<f64>,
    /// 各区域样本，长度 n_realisation * n_year
    pub samples: Vec<Vec<f64>>,
}

impl UnseenDistribution {
    /// 由 NMAX 场与趋势构造；`fits` 为 None 时不去趋势
    pub fn build(field: &NmaxField, fits: Option<&[LinearFit]>, pivot_year: i32) -> Result<Self> {
        if let Some(f) = fits {
            if f.len() != field.regions.len() {
                return Err(UnseenError::DimensionMismatch {
                    what: "trend fits per region".to_string(),
                    expected: field.regions.len(),
                    found: f.len(),
                });
            }
        }

        let offsets = offset_table(fits, field.regions.len(), &field.years, pivot_year);
        let samples = (0..field.regions.len())
            .map(|r| {
                let row = offsets.row(r).to_vec();
                field.samples(r, &row)
            })
            .collect();

        Ok(Self {
            regions: field.regions.clone(),
            years: field.years.clone(),
            labels: field.labels.clone(),
            pivot_year: fits.map(|_| pivot_year),
            offsets,
            samples,
        })
    }

    /// 区域名称查找
    pub fn region_index(&self, name: &str) -> Result<usize> {
        self.regions
            .iter()
            .position(|r| r == name)
            .ok_or_else(|| UnseenError::MissingRegion(name.to_string()))
    }

    pub fn region_samples(&self, region: usize) -> &[f64] {
        &self.samples[region]
    }

    /// 样本序号对应的 (realisation 标签, 年份)
    pub fn sample_origin(&self, index: usize) -> (RealisationLabel, i32) {
        let n_year = self.years.len();
        (self.labels[index / n_year], self.years[index % n_year])
    }

    /// x 在分布中的百分位排名（%）
    pub fn percentile_rank(&self, region: usize, x: f64) -> f64 {
        percentile_rank(&self.samples[region], x)
    }

    /// 超过 x 的概率（%）
    pub fn exceedance(&self, region: usize, x: f64) -> f64 {
        exceedance_probability(&self.samples[region], x)
    }

    pub fn summary(&self) -> Vec<RegionSummary> {
        self.regions
            .iter()
            .zip(&self.samples)
            .map(|(region, xs)| {
                let finite: Vec<f64> = xs.iter().copied().filter(|x| !x.is_nan()).collect();
                RegionSummary {
                    region: region.clone(),
                    n: finite.len(),
                    mean: mean(&finite),
                    std_dev: std_dev(&finite),
                    max: nanmax(&finite),
                }
            })
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::HindcastEnsemble;
    use crate::stats::linregress;
    use ndarray::Array6;

    /// 小型合成集合：2 hindcast × 2 startdate × 2 member，10 年，20 天
    pub(crate) fn synthetic_pooled() -> PooledEnsemble {
        let values = Array6::from_shape_fn((1, 2, 2, 2, 10, 20), |(_, h, sd, m, y, d)| {
            let seasonal = 14.0 + (d as f64 / 19.0 * std::f64::consts::PI).sin();
            let member = ((h * 4 + sd * 2 + m) as f64 * 0.37).sin() * 0.3;
            let year = ((y * 7 + h + m) % 5) as f64 * 0.1;
            seasonal + member + year + 0.02 * y as f64
        });
        let names = |p: &str, n: usize| (0..n).map(|i| format!("{}{}", p, i)).collect::<Vec<_>>();
        HindcastEnsemble::new(
            vec!["Celtic Sea".to_string()],
            names("hc", 2),
            names("sd", 2),
            names("m", 2),
            (2000..2010).collect(),
            values,
        )
        .unwrap()
        .pooled()
    }

    #[test]
    fn test_field_shape_and_window_check() {
        let pooled = synthetic_pooled();
        let field = NmaxField::from_ensemble(&pooled, 5).unwrap();
        assert_eq!(field.values.dim(), (1, 8, 10));
        assert!(field.values.iter().all(|v| v.is_finite()));

        assert!(NmaxField::from_ensemble(&pooled, 0).is_err());
        assert!(NmaxField::from_ensemble(&pooled, 21).is_err());
    }

    #[test]
    fn test_nmax_shift_identity() {
        // 预先平移数据与事后减去偏移量等价
        let pooled = synthetic_pooled();
        let field = NmaxField::from_ensemble(&pooled, 5).unwrap();

        let mut shifted = pooled.clone();
        let clim_before = pooled.climatology();
        for ((_, _, y, _), v) in shifted.values.indexed_iter_mut() {
            *v -= 0.1 * y as f64;
        }
        // 偏移量只应用于去趋势部分，气候态沿用原始数据
        let direct: Vec<f64> = (0..10)
            .map(|y| {
                let series: Vec<f64> = (0..20)
                    .map(|d| shifted.values[[0, 3, y, d]] - clim_before[[0, d]])
                    .collect();
                rolling_max(&series, 5)
            })
            .collect();

        let offsets: Vec<f64> = (0..10).map(|y| 0.1 * y as f64).collect();
        let via_field = field.year_series(0, 3, &offsets);
        for (a, b) in direct.iter().zip(&via_field) {
            assert!((a - b).abs() < 1e-10);
        }
    }

    #[test]
    fn test_distribution_ordering_and_pivot() {
        let pooled = synthetic_pooled();
        let field = NmaxField::from_ensemble(&pooled, 5).unwrap();

        let raw = UnseenDistribution::build(&field, None, 2024).unwrap();
        assert_eq!(raw.samples[0].len(), 80);
        assert!(raw.pivot_year.is_none());
        // 样本 13 = realisation 1, 年份 2003
        let (label, year) = raw.sample_origin(13);
        assert_eq!(label.member, 1);
        assert_eq!(year, 2003);
        assert_eq!(raw.samples[0][13], field.values[[0, 1, 3]]);

        let x: Vec<f64> = (0..10).map(|i| 2000.0 + i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 0.05 * v).collect();
        let fits = vec![linregress(&x, &y).unwrap()];
        let detrended = UnseenDistribution::build(&field, Some(&fits), 2009).unwrap();
        assert_eq!(detrended.pivot_year, Some(2009));
        // 枢轴年份不变，2000 年上移 0.45
        assert!((detrended.samples[0][9] - raw.samples[0][9]).abs() < 1e-9);
        assert!((detrended.samples[0][0] - raw.samples[0][0] - 0.45).abs() < 1e-9);

        assert!(detrended.region_index("Celtic Sea").is_ok());
        assert!(detrended.region_index("Irish Shelf").is_err());
        let summary = detrended.summary();
        assert_eq!(summary[0].n, 80);
    }
}
