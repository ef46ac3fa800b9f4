//! # 独立性与稳定性检验
//!
//! 合并 (hindcast, startdate, member) 作为独立样本的前提：
//! - 成员独立性：同一 (hindcast, startdate) 下成员间去趋势 NMAX 年序列的
//!   Spearman 相关应与随机配对（年份打乱）的零分布无异
//! - 预报时效稳定性：各起报日期（及各 hindcast）的 NMAX 分布与其余样本一致（KS 检验）
//!
//! ## 依赖关系
//! - 被 `commands/stability.rs` 使用
//! - 使用 `stats/independence.rs`, `stats/resample.rs`

use crate::error::{Result, UnseenError};
use crate::stats::descriptive::quantile;
use crate::stats::independence::{ks_two_sample, spearman};
use crate::stats::resample::ConfidenceInterval;
use crate::unseen::distribution::NmaxField;

use indicatif::ProgressBar;
use ndarray::Array2;
use rand::seq::SliceRandom;
use rand::Rng;

/// 单区域成员独立性检验结果
#[derive(Debug, Clone)]
pub struct MemberIndependence {
    pub region: String,
    /// 同组成员对的 Spearman ρ
    pub pair_rho: Vec<f64>,
    /// 零分布 ρ
    pub null_rho: Vec<f64>,
    pub median_rho: f64,
    pub null_low: f64,
    pub null_high: f64,
    /// 高于零分布上界的成员对比例
    pub frac_above: f64,
    /// 中位数落在零分布区间内
    pub independent: bool,
}

fn check_offsets(field: &NmaxField, offsets: &Array2<f64>) -> Result<()> {
    let expected = (field.regions.len(), field.n_years());
    if offsets.dim() != expected {
        return Err(UnseenError::DimensionMismatch {
            what: "detrending offsets".to_string(),
            expected: expected.0 * expected.1,
            found: offsets.len(),
        });
    }
    Ok(())
}

/// 同一 (hindcast, startdate) 下的成员对（realisation 索引）
fn member_pairs(field: &NmaxField) -> Vec<(usize, usize)> {
    let labels = &field.labels;
    let mut pairs = Vec::new();
    for i in 0..labels.len() {
        for j in (i + 1)..labels.len() {
            let same_hindcast = labels[i].hindcast == labels[j].hindcast;
            if same_hindcast && labels[i].startdate == labels[j].startdate {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// 成员独立性检验
pub fn member_independence<R: Rng>(
    field: &NmaxField,
    offsets: &Array2<f64>,
    permutations: usize,
    ci: &ConfidenceInterval,
    rng: &mut R,
    pb: &ProgressBar,
) -> Result<Vec<MemberIndependence>> {
    check_offsets(field, offsets)?;
    let pairs = member_pairs(field);
    if pairs.is_empty() {
        return Err(UnseenError::InsufficientData {
            what: "member pairs sharing a hindcast and start date".to_string(),
            needed: 1,
            got: 0,
        });
    }
    if field.n_realisations() < 2 || permutations == 0 {
        return Err(UnseenError::InvalidArgument(
            "member independence needs at least 2 realisations and 1 permutation".to_string(),
        ));
    }

    let mut results = Vec::with_capacity(field.regions.len());
    for (r, region) in field.regions.iter().enumerate() {
        let row = offsets.row(r).to_vec();
        let series: Vec<Vec<f64>> = (0..field.n_realisations())
            .map(|i| field.year_series(r, i, &row))
            .collect();

        let pair_rho: Vec<f64> = pairs
            .iter()
            .map(|&(i, j)| spearman(&series[i], &series[j]))
            .filter(|rho| !rho.is_nan())
            .collect();

        let mut null_rho = Vec::with_capacity(permutations);
        let mut shuffled = Vec::new();
        for _ in 0..permutations {
            let a = rng.gen_range(0..series.len());
            let mut b = rng.gen_range(0..series.len() - 1);
            if b >= a {
                b += 1;
            }
            shuffled.clone_from(&series[b]);
            shuffled.shuffle(rng);
            let rho = spearman(&series[a], &shuffled);
            if !rho.is_nan() {
                null_rho.push(rho);
            }
            pb.inc(1);
        }

        let median_rho = quantile(&pair_rho, 0.5);
        let (null_low, null_high) = ci.interval(&null_rho);
        let frac_above = if pair_rho.is_empty() {
            f64::NAN
        } else {
            pair_rho.iter().filter(|&&v| v > null_high).count() as f64 / pair_rho.len() as f64
        };

        results.push(MemberIndependence {
            region: region.clone(),
            independent: median_rho >= null_low && median_rho <= null_high,
            pair_rho,
            null_rho,
            median_rho,
            null_low,
            null_high,
            frac_above,
        });
    }
    Ok(results)
}

/// 单组 KS 检验结果
#[derive(Debug, Clone)]
pub struct GroupTest {
    pub group: String,
    /// 组内样本数
    pub n: usize,
    pub statistic: f64,
    pub p_value: f64,
    pub stable: bool,
}

/// 单区域预报时效稳定性
#[derive(Debug, Clone)]
pub struct LeadTimeStability {
    pub region: String,
    pub by_startdate: Vec<GroupTest>,
    pub by_hindcast: Vec<GroupTest>,
}

/// 按分组键做 "组 vs 其余" 的 KS 检验
fn group_tests(
    field: &NmaxField,
    region: usize,
    offsets: &[f64],
    names: &[String],
    key: impl Fn(usize) -> usize,
    alpha: f64,
) -> Vec<GroupTest> {
    names
        .iter()
        .enumerate()
        .map(|(g, name)| {
            let mut inside = Vec::new();
            let mut outside = Vec::new();
            for i in 0..field.n_realisations() {
                let series = field.year_series(region, i, offsets);
                if key(i) == g {
                    inside.extend(series);
                } else {
                    outside.extend(series);
                }
            }
            let ks = ks_two_sample(&inside, &outside);
            GroupTest {
                group: name.clone(),
                n: inside.len(),
                statistic: ks.statistic,
                p_value: ks.p_value,
                stable: ks.p_value >= alpha,
            }
        })
        .collect()
}

/// 预报时效（起报日期）与 hindcast 稳定性检验
pub fn lead_time_stability(
    field: &NmaxField,
    offsets: &Array2<f64>,
    hindcasts: &[String],
    startdates: &[String],
    alpha: f64,
) -> Result<Vec<LeadTimeStability>> {
    check_offsets(field, offsets)?;
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(UnseenError::InvalidArgument(format!(
            "significance level must be in (0, 1), got {}",
            alpha
        )));
    }
    if startdates.len() < 2 && hindcasts.len() < 2 {
        return Err(UnseenError::InsufficientData {
            what: "start dates or hindcasts to compare".to_string(),
            needed: 2,
            got: startdates.len().max(hindcasts.len()),
        });
    }

    let labels = &field.labels;
    Ok(field
        .regions
        .iter()
        .enumerate()
        .map(|(r, region)| {
            let row = offsets.row(r).to_vec();
            let by_startdate = if startdates.len() >= 2 {
                group_tests(field, r, &row, startdates, |i| labels[i].startdate, alpha)
            } else {
                Vec::new()
            };
            let by_hindcast = if hindcasts.len() >= 2 {
                group_tests(field, r, &row, hindcasts, |i| labels[i].hindcast, alpha)
            } else {
                Vec::new()
            };
            LeadTimeStability {
                region: region.clone(),
                by_startdate,
                by_hindcast,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::resample::make_rng;
    use crate::unseen::distribution::tests::synthetic_pooled;

    fn names(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{}{}", prefix, i)).collect()
    }

    #[test]
    fn test_member_pairs() {
        let field = NmaxField::from_ensemble(&synthetic_pooled(), 5).unwrap();
        // 4 组 (hindcast, startdate)，每组 2 个成员
        let pairs = member_pairs(&field);
        assert_eq!(pairs, vec![(0, 1), (2, 3), (4, 5), (6, 7)]);
    }

    #[test]
    fn test_member_independence_runs() {
        let field = NmaxField::from_ensemble(&synthetic_pooled(), 5).unwrap();
        let offsets = Array2::zeros((1, 10));
        let mut rng = make_rng(Some(21));
        let res = member_independence(
            &field,
            &offsets,
            400,
            &ConfidenceInterval::default(),
            &mut rng,
            &ProgressBar::hidden(),
        )
        .unwrap();

        let r = &res[0];
        assert_eq!(r.pair_rho.len(), 4);
        assert!(!r.null_rho.is_empty());
        assert!(r.null_low < r.null_high);
        assert!((-1.0..=1.0).contains(&r.median_rho));
        assert!((0.0..=1.0).contains(&r.frac_above));
        assert_eq!(r.independent, r.median_rho >= r.null_low && r.median_rho <= r.null_high);

        let bad = Array2::zeros((1, 3));
        assert!(member_independence(
            &field,
            &bad,
            10,
            &ConfidenceInterval::default(),
            &mut rng,
            &ProgressBar::hidden()
        )
        .is_err());
    }

    #[test]
    fn test_lead_time_groups() {
        let field = NmaxField::from_ensemble(&synthetic_pooled(), 5).unwrap();
        let offsets = Array2::zeros((1, 10));
        let (hc, sd) = (names("hc", 2), names("sd", 2));
        let res = lead_time_stability(&field, &offsets, &hc, &sd, 0.05).unwrap();

        let r = &res[0];
        assert_eq!(r.by_startdate.len(), 2);
        assert_eq!(r.by_hindcast.len(), 2);
        // 每个起报日期有 2 hindcast × 2 member × 10 年
        assert_eq!(r.by_startdate[0].n, 40);
        for g in r.by_startdate.iter().chain(&r.by_hindcast) {
            assert!((0.0..=1.0).contains(&g.statistic));
            assert_eq!(g.stable, g.p_value >= 0.05);
        }

        assert!(lead_time_stability(&field, &offsets, &hc, &sd, 1.5).is_err());
    }
}
