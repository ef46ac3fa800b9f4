//! # 事件风险
//!
//! 关注事件在 UNSEEN 分布中的超越概率：
//! - 随事件强度变化（事件峰值 + 增量）
//! - 随枢轴年份变化（不同年份的气候背景）
//!
//! 置信带由自助法得到：每次迭代对分布有放回重采样一次，
//! 所有增量（或枢轴年份）共用同一重采样样本。
//!
//! ## 依赖关系
//! - 被 `commands/risk.rs` 使用
//! - 使用 `unseen/distribution.rs`, `unseen/detrend.rs`, `stats/resample.rs`

use crate::error::{Result, UnseenError};
use crate::stats::descriptive::exceedance_probability;
use crate::stats::resample::{resample_into, Band, ConfidenceInterval};
use crate::stats::LinearFit;
use crate::unseen::detrend::pivot_offsets;
use crate::unseen::distribution::{NmaxField, UnseenDistribution};

use indicatif::ProgressBar;
use rand::Rng;

/// 一个区域的风险曲线
#[derive(Debug, Clone)]
pub struct RiskCurve {
    pub region: String,
    /// 横轴：强度增量 (°C) 或枢轴年份
    pub x: Vec<f64>,
    /// 超越概率 (%)
    pub probability: Vec<f64>,
    pub band: Option<Band>,
}

/// 增量序列 `0, step, ..., max`
pub fn increments(max: f64, step: f64) -> Result<Vec<f64>> {
    if !(step > 0.0) || !(max >= 0.0) {
        return Err(UnseenError::InvalidArgument(format!(
            "increments need step > 0 and max >= 0, got step={}, max={}",
            step, max
        )));
    }
    let n = (max / step + 1e-9).floor() as usize;
    Ok((0..=n).map(|i| i as f64 * step).collect())
}

/// 已排序样本中 x 的超越概率
fn sorted_exceedance(sorted: &[f64], x: f64) -> f64 {
    let count = sorted.partition_point(|v| *v <= x);
    100.0 - count as f64 / sorted.len() as f64 * 100.0
}

fn check_focus(focus: &[f64], n_regions: usize) -> Result<()> {
    if focus.len() != n_regions {
        return Err(UnseenError::DimensionMismatch {
            what: "focus event peaks per region".to_string(),
            expected: n_regions,
            found: focus.len(),
        });
    }
    Ok(())
}

fn check_fits(fits: &[LinearFit], n_regions: usize) -> Result<()> {
    if fits.len() != n_regions {
        return Err(UnseenError::DimensionMismatch {
            what: "trend fits per region".to_string(),
            expected: n_regions,
            found: fits.len(),
        });
    }
    Ok(())
}

/// 强度增量对应的超越概率
pub fn strength_risk(
    distr: &UnseenDistribution,
    focus: &[f64],
    incs: &[f64],
) -> Result<Vec<RiskCurve>> {
    check_focus(focus, distr.regions.len())?;
    Ok(distr
        .regions
        .iter()
        .enumerate()
        .map(|(r, region)| RiskCurve {
            region: region.clone(),
            x: incs.to_vec(),
            probability: incs
                .iter()
                .map(|inc| exceedance_probability(distr.region_samples(r), focus[r] + inc))
                .collect(),
            band: None,
        })
        .collect())
}

/// 强度风险的自助置信带（每区域一个）
pub fn strength_band<R: Rng>(
    distr: &UnseenDistribution,
    focus: &[f64],
    incs: &[f64],
    iterations: usize,
    ci: &ConfidenceInterval,
    rng: &mut R,
    pb: &ProgressBar,
) -> Result<Vec<Band>> {
    check_focus(focus, distr.regions.len())?;
    let mut bands = Vec::with_capacity(distr.regions.len());
    let mut buf = Vec::new();

    for r in 0..distr.regions.len() {
        let data = distr.region_samples(r);
        let mut boot = vec![Vec::with_capacity(iterations); incs.len()];
        for _ in 0..iterations {
            resample_into(rng, data, data.len(), &mut buf);
            buf.sort_by(f64::total_cmp);
            for (k, inc) in incs.iter().enumerate() {
                boot[k].push(sorted_exceedance(&buf, focus[r] + inc));
            }
            pb.inc(1);
        }
        bands.push(Band::from_samples(&boot, ci));
    }
    Ok(bands)
}

/// 枢轴年份序列对应的超越概率
///
/// `fits` 为每区域的趋势；枢轴年份超出拟合年份时为外推。
pub fn time_risk(
    field: &NmaxField,
    fits: &[LinearFit],
    focus: &[f64],
    pivots: &[i32],
) -> Result<Vec<RiskCurve>> {
    check_focus(focus, field.regions.len())?;
    check_fits(fits, field.regions.len())?;

    Ok(field
        .regions
        .iter()
        .enumerate()
        .map(|(r, region)| {
            let probability = pivots
                .iter()
                .map(|&p| {
                    let offsets = pivot_offsets(&fits[r], &field.years, p);
                    exceedance_probability(&field.samples(r, &offsets), focus[r])
                })
                .collect();
            RiskCurve {
                region: region.clone(),
                x: pivots.iter().map(|&p| p as f64).collect(),
                probability,
                band: None,
            }
        })
        .collect())
}

/// 枢轴年份风险的自助置信带（每区域一个）
///
/// 枢轴年份 p 的样本为 `base + slope * p`，其中 `base = NMAX - slope * year`，
/// 因此每次迭代只需对 base 重采样一次。
#[allow(clippy::too_many_arguments)]
pub fn time_band<R: Rng>(
    field: &NmaxField,
    fits: &[LinearFit],
    focus: &[f64],
    pivots: &[i32],
    iterations: usize,
    ci: &ConfidenceInterval,
    rng: &mut R,
    pb: &ProgressBar,
) -> Result<Vec<Band>> {
    check_focus(focus, field.regions.len())?;
    check_fits(fits, field.regions.len())?;

    let mut bands = Vec::with_capacity(field.regions.len());
    let mut buf = Vec::new();
    for r in 0..field.regions.len() {
        let slope = fits[r].slope;
        let trend: Vec<f64> = field.years.iter().map(|&y| slope * y as f64).collect();
        let base = field.samples(r, &trend);

        let mut boot = vec![Vec::with_capacity(iterations); pivots.len()];
        for _ in 0..iterations {
            resample_into(rng, &base, base.len(), &mut buf);
            buf.sort_by(f64::total_cmp);
            for (k, &p) in pivots.iter().enumerate() {
                boot[k].push(sorted_exceedance(&buf, focus[r] - slope * p as f64));
            }
            pb.inc(1);
        }
        bands.push(Band::from_samples(&boot, ci));
    }
    Ok(bands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::linregress;
    use crate::stats::resample::make_rng;
    use crate::unseen::distribution::tests::synthetic_pooled;

    #[test]
    fn test_increments() {
        let incs = increments(2.0, 0.1).unwrap();
        assert_eq!(incs.len(), 21);
        assert_eq!(incs[0], 0.0);
        assert!((incs[20] - 2.0).abs() < 1e-12);
        assert!(increments(1.0, 0.0).is_err());
        assert_eq!(increments(0.0, 0.5).unwrap(), vec![0.0]);
    }

    #[test]
    fn test_sorted_exceedance_matches_unsorted() {
        let data = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        let mut sorted = data.to_vec();
        sorted.sort_by(f64::total_cmp);
        for x in [0.0, 1.0, 2.5, 6.0, 10.0] {
            assert_eq!(sorted_exceedance(&sorted, x), exceedance_probability(&data, x));
        }
    }

    #[test]
    fn test_strength_risk_is_monotone() {
        let field = NmaxField::from_ensemble(&synthetic_pooled(), 5).unwrap();
        let distr = UnseenDistribution::build(&field, None, 2024).unwrap();
        let focus = [crate::stats::descriptive::quantile(distr.region_samples(0), 0.5)];
        let incs = increments(1.0, 0.25).unwrap();

        let curves = strength_risk(&distr, &focus, &incs).unwrap();
        let p = &curves[0].probability;
        assert!(p.windows(2).all(|w| w[1] <= w[0]));
        assert!(p[0] <= 50.0 + 1e-9);

        let mut rng = make_rng(Some(1));
        let bands = strength_band(
            &distr,
            &focus,
            &incs,
            200,
            &ConfidenceInterval::default(),
            &mut rng,
            &ProgressBar::hidden(),
        )
        .unwrap();
        assert_eq!(bands[0].low.len(), incs.len());
        assert!(bands[0].low.iter().zip(&bands[0].high).all(|(l, h)| l <= h));

        assert!(strength_risk(&distr, &[0.0, 1.0], &incs).is_err());
    }

    #[test]
    fn test_time_risk_increases_with_warming() {
        let field = NmaxField::from_ensemble(&synthetic_pooled(), 5).unwrap();
        let x: Vec<f64> = (2000..2010).map(|y| y as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 0.1 * v).collect();
        let fits = vec![linregress(&x, &y).unwrap()];
        let pivots: Vec<i32> = (2000..=2020).collect();

        let focus = [0.5];
        let curves = time_risk(&field, &fits, &focus, &pivots).unwrap();
        let p = &curves[0].probability;
        assert_eq!(p.len(), pivots.len());
        assert!(p.windows(2).all(|w| w[1] >= w[0]));

        let mut rng = make_rng(Some(3));
        let bands = time_band(
            &field,
            &fits,
            &focus,
            &pivots,
            300,
            &ConfidenceInterval::default(),
            &mut rng,
            &ProgressBar::hidden(),
        )
        .unwrap();
        assert_eq!(bands[0].low.len(), pivots.len());
        assert!(bands[0].low.iter().zip(&bands[0].high).all(|(l, h)| l <= h));
        // 置信带随枢轴年份同向移动
        assert!(bands[0].high[pivots.len() - 1] >= bands[0].high[0]);
    }
}
