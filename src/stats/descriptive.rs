//! # 描述统计
//!
//! 均值、标准差、偏度、峰度、分位数与百分位排名。
//!
//! ## 约定
//! - 标准差为总体估计（ddof = 0）
//! - 偏度、峰度为有偏估计，峰度为 Fisher 超额峰度（正态分布为 0）
//! - 分位数在次序统计量之间线性插值
//! - 百分位排名采用 `#(arr <= x) / n`
//!
//! ## 依赖关系
//! - 被 `models/`, `unseen/`, `stats/` 其他子模块使用

/// 算术平均（空输入返回 NaN）
pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// 跳过 NaN 的平均
pub fn nanmean(xs: &[f64]) -> f64 {
    let (sum, n) = xs
        .iter()
        .filter(|x| !x.is_nan())
        .fold((0.0, 0usize), |(s, n), x| (s + x, n + 1));
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

/// 跳过 NaN 的最大值
pub fn nanmax(xs: &[f64]) -> f64 {
    xs.iter()
        .copied()
        .filter(|x| !x.is_nan())
        .fold(f64::NAN, |acc, x| if acc.is_nan() || x > acc { x } else { acc })
}

/// 第 k 阶中心矩
fn central_moment(xs: &[f64], m: f64, k: i32) -> f64 {
    xs.iter().map(|x| (x - m).powi(k)).sum::<f64>() / xs.len() as f64
}

/// 总体标准差
pub fn std_dev(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    central_moment(xs, mean(xs), 2).sqrt()
}

/// 有偏偏度 g1 = m3 / m2^1.5
pub fn skewness(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    let m = mean(xs);
    let m2 = central_moment(xs, m, 2);
    if m2 == 0.0 {
        return f64::NAN;
    }
    central_moment(xs, m, 3) / m2.powf(1.5)
}

/// 有偏超额峰度 g2 = m4 / m2^2 - 3
pub fn kurtosis(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return f64::NAN;
    }
    let m = mean(xs);
    let m2 = central_moment(xs, m, 2);
    if m2 == 0.0 {
        return f64::NAN;
    }
    central_moment(xs, m, 4) / (m2 * m2) - 3.0
}

/// 统计量种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MomentKind {
    Mean,
    StdDev,
    Skewness,
    Kurtosis,
}

impl MomentKind {
    pub const ALL: [MomentKind; 4] = [
        MomentKind::Mean,
        MomentKind::StdDev,
        MomentKind::Skewness,
        MomentKind::Kurtosis,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MomentKind::Mean => "Mean",
            MomentKind::StdDev => "Standard deviation",
            MomentKind::Skewness => "Skewness",
            MomentKind::Kurtosis => "Kurtosis",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            MomentKind::Mean => "mean",
            MomentKind::StdDev => "std",
            MomentKind::Skewness => "skewness",
            MomentKind::Kurtosis => "kurtosis",
        }
    }
}

/// 前四阶统计量
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Moments {
    pub mean: f64,
    pub std_dev: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

impl Moments {
    pub fn of(xs: &[f64]) -> Self {
        Self {
            mean: mean(xs),
            std_dev: std_dev(xs),
            skewness: skewness(xs),
            kurtosis: kurtosis(xs),
        }
    }

    pub fn get(&self, kind: MomentKind) -> f64 {
        match kind {
            MomentKind::Mean => self.mean,
            MomentKind::StdDev => self.std_dev,
            MomentKind::Skewness => self.skewness,
            MomentKind::Kurtosis => self.kurtosis,
        }
    }
}

/// 已排序数据的分位数（线性插值）
pub fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    // 相等时直接返回，避免 ∞ - ∞
    if frac == 0.0 || sorted[lo] == sorted[hi] {
        return sorted[lo];
    }
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// 分位数（丢弃 NaN 后线性插值）
pub fn quantile(xs: &[f64], q: f64) -> f64 {
    let mut sorted: Vec<f64> = xs.iter().copied().filter(|x| !x.is_nan()).collect();
    sorted.sort_by(f64::total_cmp);
    quantile_sorted(&sorted, q)
}

/// 百分位排名：`100 * #(arr <= x) / n`
pub fn percentile_rank(arr: &[f64], x: f64) -> f64 {
    if arr.is_empty() {
        return f64::NAN;
    }
    let count = arr.iter().filter(|&&a| a <= x).count();
    count as f64 / arr.len() as f64 * 100.0
}

/// 超越概率（%）：`100 - percentile_rank`
pub fn exceedance_probability(arr: &[f64], x: f64) -> f64 {
    100.0 - percentile_rank(arr, x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_moments() {
        let xs = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&xs) - 5.0).abs() < 1e-12);
        assert!((std_dev(&xs) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_skewness_and_kurtosis() {
        // 手算：m2 = 2, m3 = 0, m4 = 6.8 → g2 = 6.8/4 - 3 = -1.3
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert!(skewness(&xs).abs() < 1e-12);
        assert!((kurtosis(&xs) - (-1.3)).abs() < 1e-12);

        // 右偏样本
        let skewed = [0.0, 0.0, 0.0, 1.0, 10.0];
        assert!(skewness(&skewed) > 1.0);
    }

    #[test]
    fn test_quantile_linear() {
        let xs = [4.0, 1.0, 3.0, 2.0];
        assert!((quantile(&xs, 0.5) - 2.5).abs() < 1e-12);
        assert!((quantile(&xs, 0.0) - 1.0).abs() < 1e-12);
        assert!((quantile(&xs, 1.0) - 4.0).abs() < 1e-12);
        assert!((quantile(&xs, 0.25) - 1.75).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_rank_and_exceedance() {
        let arr = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile_rank(&arr, 2.0), 50.0);
        assert_eq!(exceedance_probability(&arr, 2.0), 50.0);
        assert_eq!(exceedance_probability(&arr, 4.0), 0.0);
        assert_eq!(exceedance_probability(&arr, 0.0), 100.0);
    }

    #[test]
    fn test_nan_helpers() {
        let xs = [1.0, f64::NAN, 3.0];
        assert_eq!(nanmean(&xs), 2.0);
        assert_eq!(nanmax(&xs), 3.0);
        assert!(nanmax(&[f64::NAN]).is_nan());
        assert!(nanmean(&[]).is_nan());
    }
}
