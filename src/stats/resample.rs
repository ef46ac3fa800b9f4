//! # 自助法（bootstrap）工具
//!
//! 可复现的随机数生成器、有放回重采样和置信区间分位数。
//!
//! ## 依赖关系
//! - 被 `unseen/risk.rs`, `unseen/fidelity.rs`, `unseen/stability.rs`, `unseen/extremes.rs` 使用
//! - 使用 `rand`

use crate::error::{Result, UnseenError};
use crate::stats::descriptive::quantile;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 创建随机数生成器：给定种子时可复现，否则使用系统熵
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    }
}

/// 有放回抽取 `n` 个样本写入 `buf`
pub fn resample_into<R: Rng>(rng: &mut R, data: &[f64], n: usize, buf: &mut Vec<f64>) {
    buf.clear();
    if data.is_empty() {
        return;
    }
    buf.extend((0..n).map(|_| data[rng.gen_range(0..data.len())]));
}

/// 置信区间对应的上下分位
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInterval {
    pub low_q: f64,
    pub high_q: f64,
}

impl ConfidenceInterval {
    /// 由置信水平构造，如 0.95 -> (0.025, 0.975)
    pub fn from_level(level: f64) -> Result<Self> {
        if !(level > 0.0 && level < 1.0) {
            return Err(UnseenError::InvalidArgument(format!(
                "confidence level must be in (0, 1), got {}",
                level
            )));
        }
        let tail = (1.0 - level) / 2.0;
        Ok(Self {
            low_q: tail,
            high_q: 1.0 - tail,
        })
    }

    /// 置信水平（百分比）
    pub fn level_percent(&self) -> f64 {
        (self.high_q - self.low_q) * 100.0
    }

    /// 计算样本的上下界
    pub fn interval(&self, samples: &[f64]) -> (f64, f64) {
        (quantile(samples, self.low_q), quantile(samples, self.high_q))
    }
}

impl Default for ConfidenceInterval {
    fn default() -> Self {
        Self {
            low_q: 0.025,
            high_q: 0.975,
        }
    }
}

/// 置信带：逐点上下界
#[derive(Debug, Clone, Default)]
pub struct Band {
    pub low: Vec<f64>,
    pub high: Vec<f64>,
}

impl Band {
    /// 由 `[point][iteration]` 的自助样本逐点求区间
    pub fn from_samples(samples: &[Vec<f64>], ci: &ConfidenceInterval) -> Self {
        let (low, high) = samples.iter().map(|s| ci.interval(s)).unzip();
        Self { low, high }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let data = [1.0, 2.0, 3.0, 4.0, 5.0];
        let mut a = Vec::new();
        let mut b = Vec::new();
        resample_into(&mut make_rng(Some(42)), &data, 20, &mut a);
        resample_into(&mut make_rng(Some(42)), &data, 20, &mut b);
        assert_eq!(a, b);
        assert_eq!(a.len(), 20);
        assert!(a.iter().all(|v| data.contains(v)));
    }

    #[test]
    fn test_confidence_interval() {
        let ci = ConfidenceInterval::from_level(0.9).unwrap();
        assert!((ci.low_q - 0.05).abs() < 1e-12);
        assert!((ci.high_q - 0.95).abs() < 1e-12);
        assert!((ci.level_percent() - 90.0).abs() < 1e-9);
        assert!(ConfidenceInterval::from_level(1.0).is_err());

        let samples: Vec<f64> = (0..=100).map(|i| i as f64).collect();
        let (lo, hi) = ConfidenceInterval::default().interval(&samples);
        assert!((lo - 2.5).abs() < 1e-9);
        assert!((hi - 97.5).abs() < 1e-9);
    }

    #[test]
    fn test_band_from_samples() {
        let samples = vec![vec![0.0, 1.0, 2.0], vec![10.0, 10.0, 10.0]];
        let band = Band::from_samples(&samples, &ConfidenceInterval::from_level(0.5).unwrap());
        assert_eq!(band.low.len(), 2);
        assert!((band.low[0] - 0.5).abs() < 1e-12);
        assert!((band.high[0] - 1.5).abs() < 1e-12);
        assert_eq!(band.low[1], 10.0);
    }
}
