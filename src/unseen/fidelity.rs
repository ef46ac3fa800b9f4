//! # 保真度检验
//!
//! 检验模式集合能否代表观测：
//! - 矩保真度：从 UNSEEN 分布抽取与观测等长的伪时间序列，
//!   比较均值、标准差、偏度、峰度
//! - 趋势保真度：每年随机抽取一个 realisation 的季节平均构成伪时间序列，
//!   比较线性趋势斜率
//!
//! 观测统计量在模式统计量分布中的百分位排名接近两端时说明模式偏差显著。
//!
//! ## 依赖关系
//! - 被 `commands/fidelity/` 使用
//! - 使用 `stats/descriptive.rs`, `stats/regression.rs`, `stats/resample.rs`

use crate::error::{Result, UnseenError};
use crate::models::{PooledEnsemble, SeasonalObs};
use crate::stats::descriptive::{percentile_rank, MomentKind, Moments};
use crate::stats::regression::{linregress, LinearFit};
use crate::stats::resample::resample_into;
use crate::unseen::detrend::observed_trends;
use crate::unseen::distribution::UnseenDistribution;

use indicatif::ProgressBar;
use ndarray::{s, Array2};
use rand::Rng;

/// 单区域矩保真度
#[derive(Debug, Clone)]
pub struct MomentFidelity {
    pub region: String,
    /// 观测年数（伪时间序列长度）
    pub n_years: usize,
    pub observed: Moments,
    /// 每次迭代的模式统计量
    pub model: Vec<Moments>,
}

impl MomentFidelity {
    /// 某统计量的模式样本
    pub fn model_values(&self, kind: MomentKind) -> Vec<f64> {
        self.model.iter().map(|m| m.get(kind)).collect()
    }

    /// 观测统计量在模式分布中的百分位排名 (%)
    pub fn percentile_rank(&self, kind: MomentKind) -> f64 {
        percentile_rank(&self.model_values(kind), self.observed.get(kind))
    }
}

/// 矩保真度检验
///
/// `obs_nmax` 为重叠年份观测 NMAX `[region, year]`，NaN 年份被忽略。
pub fn moment_fidelity<R: Rng>(
    distr: &UnseenDistribution,
    obs_nmax: &Array2<f64>,
    iterations: usize,
    rng: &mut R,
    pb: &ProgressBar,
) -> Result<Vec<MomentFidelity>> {
    if obs_nmax.nrows() != distr.regions.len() {
        return Err(UnseenError::DimensionMismatch {
            what: "observed NMAX regions".to_string(),
            expected: distr.regions.len(),
            found: obs_nmax.nrows(),
        });
    }

    let mut results = Vec::with_capacity(distr.regions.len());
    let mut buf = Vec::new();
    for (r, region) in distr.regions.iter().enumerate() {
        let obs: Vec<f64> = obs_nmax
            .row(r)
            .iter()
            .copied()
            .filter(|x| !x.is_nan())
            .collect();
        if obs.len() < 2 {
            return Err(UnseenError::InsufficientData {
                what: format!("observed NMAX years in {}", region),
                needed: 2,
                got: obs.len(),
            });
        }

        let pool: Vec<f64> = distr
            .region_samples(r)
            .iter()
            .copied()
            .filter(|x| !x.is_nan())
            .collect();

        let mut model = Vec::with_capacity(iterations);
        for _ in 0..iterations {
            resample_into(rng, &pool, obs.len(), &mut buf);
            model.push(Moments::of(&buf));
            pb.inc(1);
        }

        results.push(MomentFidelity {
            region: region.clone(),
            n_years: obs.len(),
            observed: Moments::of(&obs),
            model,
        });
    }
    Ok(results)
}

/// 单区域趋势保真度
#[derive(Debug, Clone)]
pub struct TrendFidelity {
    pub region: String,
    pub observed_slope: f64,
    /// 每次迭代的伪时间序列斜率
    pub slopes: Vec<f64>,
}

impl TrendFidelity {
    pub fn percentile_rank(&self) -> f64 {
        percentile_rank(&self.slopes, self.observed_slope)
    }
}

/// 趋势保真度检验
///
/// `obs_fits` 为完整观测记录的季节平均趋势（与去趋势所用一致）。
pub fn trend_fidelity<R: Rng>(
    pooled: &PooledEnsemble,
    obs_fits: &[LinearFit],
    iterations: usize,
    rng: &mut R,
    pb: &ProgressBar,
) -> Result<Vec<TrendFidelity>> {
    if obs_fits.len() != pooled.regions.len() {
        return Err(UnseenError::DimensionMismatch {
            what: "observed trend fits per region".to_string(),
            expected: pooled.regions.len(),
            found: obs_fits.len(),
        });
    }

    let seasonal = pooled.seasonal_means();
    let n_real = pooled.n_realisations();
    let x: Vec<f64> = pooled.years.iter().map(|&y| y as f64).collect();
    let mut series = vec![0.0; x.len()];

    let mut results = Vec::with_capacity(pooled.regions.len());
    for (r, region) in pooled.regions.iter().enumerate() {
        let block = seasonal.slice(s![r, .., ..]);
        let mut slopes = Vec::with_capacity(iterations);
        for _ in 0..iterations {
            for (y, slot) in series.iter_mut().enumerate() {
                *slot = block[[rng.gen_range(0..n_real), y]];
            }
            slopes.push(linregress(&x, &series)?.slope);
            pb.inc(1);
        }
        results.push(TrendFidelity {
            region: region.clone(),
            observed_slope: obs_fits[r].slope,
            slopes,
        });
    }
    Ok(results)
}

/// 观测季节平均趋势摘要
#[derive(Debug, Clone)]
pub struct TrendSummary {
    pub region: String,
    pub years: Vec<i32>,
    pub means: Vec<f64>,
    pub fit: LinearFit,
    /// 最后一年的拟合值
    pub final_value: f64,
}

impl TrendSummary {
    pub fn p_class(&self) -> String {
        self.fit.p_class()
    }
}

/// 完整观测记录的季节平均趋势
pub fn observed_trend_summary(obs_full: &SeasonalObs) -> Result<Vec<TrendSummary>> {
    let fits = observed_trends(obs_full)?;
    let means = obs_full.seasonal_means();
    let last_year = obs_full.years.last().copied().unwrap_or_default();

    Ok(obs_full
        .regions
        .iter()
        .zip(fits)
        .enumerate()
        .map(|(r, (region, fit))| TrendSummary {
            region: region.clone(),
            years: obs_full.years.clone(),
            means: means.row(r).to_vec(),
            fit,
            final_value: fit.predict(last_year as f64),
        })
        .collect())
}
