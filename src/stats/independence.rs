//! # 相关性与分布一致性检验
//!
//! ## 功能
//! - Pearson / Spearman 相关系数（并列值取平均秩）
//! - 双样本 Kolmogorov-Smirnov 检验（渐近分布 + Stephens 修正）
//!
//! ## 依赖关系
//! - 被 `unseen/stability.rs` 使用
//! - 使用 `stats/special.rs`

use crate::stats::special::kolmogorov_survival;

/// Pearson 相关系数；长度不等、样本过少或方差为 0 时返回 NaN
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.len() < 2 {
        return f64::NAN;
    }
    let n = x.len() as f64;
    let mx = x.iter().sum::<f64>() / n;
    let my = y.iter().sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        sxy += (a - mx) * (b - my);
        sxx += (a - mx) * (a - mx);
        syy += (b - my) * (b - my);
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// 秩（1 起），并列值取平均秩
pub fn ranks(xs: &[f64]) -> Vec<f64> {
    let mut order: Vec<usize> = (0..xs.len()).collect();
    order.sort_by(|&a, &b| xs[a].total_cmp(&xs[b]));

    let mut out = vec![0.0; xs.len()];
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && xs[order[j + 1]] == xs[order[i]] {
            j += 1;
        }
        let rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            out[idx] = rank;
        }
        i = j + 1;
    }
    out
}

/// Spearman 秩相关系数（跳过任一侧为 NaN 的点对）
pub fn spearman(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() {
        return f64::NAN;
    }
    let (a, b): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .map(|(a, b)| (*a, *b))
        .unzip();
    pearson(&ranks(&a), &ranks(&b))
}

/// KS 检验结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KsResult {
    /// D = sup |F_a - F_b|
    pub statistic: f64,
    pub p_value: f64,
}

/// 双样本 KS 检验（忽略 NaN）
pub fn ks_two_sample(a: &[f64], b: &[f64]) -> KsResult {
    let sorted = |xs: &[f64]| {
        let mut v: Vec<f64> = xs.iter().copied().filter(|x| !x.is_nan()).collect();
        v.sort_by(f64::total_cmp);
        v
    };
    let a = sorted(a);
    let b = sorted(b);
    if a.is_empty() || b.is_empty() {
        return KsResult {
            statistic: f64::NAN,
            p_value: f64::NAN,
        };
    }

    let (na, nb) = (a.len() as f64, b.len() as f64);
    let (mut i, mut j) = (0, 0);
    let mut d = 0.0_f64;
    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        d = d.max((i as f64 / na - j as f64 / nb).abs());
    }

    let en = (na * nb / (na + nb)).sqrt();
    let p_value = kolmogorov_survival((en + 0.12 + 0.11 / en) * d);
    KsResult {
        statistic: d,
        p_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ranks_with_ties() {
        let r = ranks(&[10.0, 20.0, 10.0, 30.0]);
        assert_eq!(r, vec![1.5, 3.0, 1.5, 4.0]);
    }

    #[test]
    fn test_pearson_and_spearman() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [2.0, 4.0, 6.0, 8.0, 10.0];
        assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);

        // 单调但非线性：Spearman 为 1，Pearson 小于 1
        let z: Vec<f64> = x.iter().map(|v: &f64| v.powi(3)).collect();
        assert!((spearman(&x, &z) - 1.0).abs() < 1e-12);
        assert!(pearson(&x, &z) < 1.0);

        let rev: Vec<f64> = x.iter().rev().copied().collect();
        assert!((spearman(&x, &rev) + 1.0).abs() < 1e-12);
        assert!(pearson(&x, &[1.0; 5]).is_nan());
    }

    #[test]
    fn test_ks_identical_samples() {
        let a: Vec<f64> = (0..50).map(|i| i as f64 * 0.1).collect();
        let res = ks_two_sample(&a, &a);
        assert_eq!(res.statistic, 0.0);
        assert_eq!(res.p_value, 1.0);
    }

    #[test]
    fn test_ks_disjoint_samples() {
        let a: Vec<f64> = (0..60).map(|i| i as f64).collect();
        let b: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let res = ks_two_sample(&a, &b);
        assert!((res.statistic - 1.0).abs() < 1e-12);
        assert!(res.p_value < 1e-10);
    }

    #[test]
    fn test_ks_partial_overlap() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [3.0, 4.0, 5.0, 6.0];
        let res = ks_two_sample(&a, &b);
        assert!((res.statistic - 0.5).abs() < 1e-12);
        assert!(res.p_value > 0.05 && res.p_value < 1.0);
    }
}
