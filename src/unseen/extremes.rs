//! # UNSEEN 极值分析
//!
//! 对每个区域的 UNSEEN 样本拟合 GEV，给出重现水平、
//! 关注事件与观测纪录的重现期，以及自助法置信区间。
//!
//! ## 依赖关系
//! - 被 `commands/gev.rs` 使用
//! - 使用 `stats/gev.rs`, `stats/resample.rs`, `unseen/distribution.rs`

use crate::error::{Result, UnseenError};
use crate::stats::descriptive::nanmax;
use crate::stats::gev::{self, FitMethod, GevFit, GevParams};
use crate::stats::resample::{resample_into, Band, ConfidenceInterval};
use crate::unseen::distribution::UnseenDistribution;

use indicatif::ProgressBar;
use rand::Rng;

/// 单区域 GEV 拟合
#[derive(Debug, Clone)]
pub struct RegionGev {
    pub region: String,
    /// 参与拟合的年份窗口（闭区间），None 为全部年份
    pub years: Option<(i32, i32)>,
    pub samples: Vec<f64>,
    pub fit: GevFit,
}

impl RegionGev {
    pub fn params(&self) -> &GevParams {
        &self.fit.params
    }
}

/// 区域样本，可按年份窗口筛选
pub fn window_samples(
    distr: &UnseenDistribution,
    region: usize,
    years: Option<(i32, i32)>,
) -> Vec<f64> {
    let all = distr.region_samples(region);
    match years {
        None => all.to_vec(),
        Some((from, to)) => all
            .iter()
            .enumerate()
            .filter(|(k, _)| {
                let year = distr.years[k % distr.years.len()];
                year >= from && year <= to
            })
            .map(|(_, v)| *v)
            .collect(),
    }
}

/// 逐区域拟合 GEV
pub fn fit_regions(
    distr: &UnseenDistribution,
    method: FitMethod,
    years: Option<(i32, i32)>,
) -> Result<Vec<RegionGev>> {
    if let Some((from, to)) = years {
        if from > to {
            return Err(UnseenError::InvalidRange(format!("{}-{}", from, to)));
        }
    }

    distr
        .regions
        .iter()
        .enumerate()
        .map(|(r, region)| {
            let samples = window_samples(distr, r, years);
            let fit = gev::fit(&samples, method).map_err(|e| match e {
                UnseenError::InsufficientData { needed, got, .. } => UnseenError::InsufficientData {
                    what: format!("GEV fit in {}", region),
                    needed,
                    got,
                },
                other => other,
            })?;
            Ok(RegionGev {
                region: region.clone(),
                years,
                samples,
                fit,
            })
        })
        .collect()
}

/// 多个重现期的重现水平
pub fn return_levels(params: &GevParams, periods: &[f64]) -> Vec<f64> {
    periods.iter().map(|&t| params.return_level(t)).collect()
}

/// 关注事件强度的重现期
pub fn event_return_period(params: &GevParams, focus: f64) -> f64 {
    params.return_period(focus)
}

/// 打破观测纪录（重叠年份观测 NMAX 最大值）的重现期
pub fn record_return_period(params: &GevParams, obs_nmax: &[f64]) -> f64 {
    let record = nanmax(obs_nmax);
    if record.is_nan() {
        return f64::NAN;
    }
    params.return_period(record)
}

/// 自助法置信区间
#[derive(Debug, Clone)]
pub struct GevBootstrap {
    /// 各重现期的重现水平区间
    pub levels: Band,
    /// 关注事件重现期区间
    pub event_period: (f64, f64),
    /// 成功的重拟合次数
    pub successful: usize,
}

/// 有放回重采样后重新拟合
#[allow(clippy::too_many_arguments)]
pub fn bootstrap_return_levels<R: Rng>(
    samples: &[f64],
    method: FitMethod,
    periods: &[f64],
    focus: f64,
    iterations: usize,
    ci: &ConfidenceInterval,
    rng: &mut R,
    pb: &ProgressBar,
) -> Result<GevBootstrap> {
    let data: Vec<f64> = samples.iter().copied().filter(|x| x.is_finite()).collect();
    let mut levels = vec![Vec::with_capacity(iterations); periods.len()];
    let mut event = Vec::with_capacity(iterations);
    let mut buf = Vec::new();
    let mut successful = 0;

    for _ in 0..iterations {
        resample_into(rng, &data, data.len(), &mut buf);
        // 个别重采样可能退化（如常数样本），跳过
        if let Ok(fit) = gev::fit(&buf, method) {
            for (k, level) in return_levels(&fit.params, periods).into_iter().enumerate() {
                levels[k].push(level);
            }
            event.push(fit.params.return_period(focus));
            successful += 1;
        }
        pb.inc(1);
    }

    if successful == 0 {
        return Err(UnseenError::FitFailed(
            "no bootstrap resample could be fitted".to_string(),
        ));
    }

    Ok(GevBootstrap {
        levels: Band::from_samples(&levels, ci),
        event_period: ci.interval(&event),
        successful,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::resample::make_rng;
    use crate::unseen::distribution::tests::synthetic_pooled;
    use crate::unseen::distribution::NmaxField;

    fn distribution() -> UnseenDistribution {
        let field = NmaxField::from_ensemble(&synthetic_pooled(), 5).unwrap();
        UnseenDistribution::build(&field, None, 2024).unwrap()
    }

    #[test]
    fn test_window_samples() {
        let distr = distribution();
        assert_eq!(window_samples(&distr, 0, None).len(), 80);
        // 2002-2004 三年 × 8 个 realisation
        assert_eq!(window_samples(&distr, 0, Some((2002, 2004))).len(), 24);
    }

    #[test]
    fn test_fit_regions_and_return_periods() {
        let distr = distribution();
        let fits = fit_regions(&distr, FitMethod::LMoments, None).unwrap();
        assert_eq!(fits.len(), 1);
        assert_eq!(fits[0].fit.n, 80);

        let params = fits[0].params();
        let levels = return_levels(params, &[10.0, 100.0]);
        assert!(levels[1] >= levels[0]);
        assert!((event_return_period(params, levels[0]) - 10.0).abs() < 1e-6);

        let record = record_return_period(params, &[f64::NAN, levels[1], levels[0]]);
        assert!((record - 100.0).abs() < 1e-4);
        assert!(record_return_period(params, &[f64::NAN]).is_nan());

        // 窗口过小时样本不足
        assert!(fit_regions(&distr, FitMethod::LMoments, Some((2003, 2003))).is_err());
        assert!(fit_regions(&distr, FitMethod::LMoments, Some((2005, 2003))).is_err());
    }

    #[test]
    fn test_bootstrap_interval_contains_estimate() {
        let truth = GevParams::new(0.0, 1.0, -0.1).unwrap();
        let mut rng = make_rng(Some(17));
        let samples = truth.sample(&mut rng, 400);
        let fit = gev::fit(&samples, FitMethod::LMoments).unwrap();
        let periods = [10.0, 50.0];

        let boot = bootstrap_return_levels(
            &samples,
            FitMethod::LMoments,
            &periods,
            2.0,
            300,
            &ConfidenceInterval::default(),
            &mut rng,
            &ProgressBar::hidden(),
        )
        .unwrap();

        assert_eq!(boot.successful, 300);
        for (k, &t) in periods.iter().enumerate() {
            let level = fit.params.return_level(t);
            assert!(boot.levels.low[k] <= level && level <= boot.levels.high[k]);
        }
        assert!(boot.event_period.0 <= boot.event_period.1);
    }
}
