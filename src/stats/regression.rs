//! # 线性回归
//!
//! 最小二乘一元线性回归，给出斜率、截距、相关系数、
//! 双侧 t 检验 p 值与斜率标准误。
//!
//! ## 依赖关系
//! - 被 `unseen/detrend.rs`, `unseen/fidelity.rs` 使用
//! - 使用 `stats/special.rs` 计算 p 值

use crate::error::{Result, UnseenError};
use crate::stats::special::student_t_two_sided;

const TINY: f64 = 1.0e-20;

/// 线性回归结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Pearson 相关系数
    pub r_value: f64,
    /// 斜率为 0 的双侧 p 值
    pub p_value: f64,
    /// 斜率标准误
    pub stderr: f64,
    /// 有效样本数
    pub n: usize,
}

impl LinearFit {
    /// 回归线上 x 处的值
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    /// p 值分级描述
    pub fn p_class(&self) -> String {
        if self.p_value < 0.01 {
            "p < 0.01".to_string()
        } else if self.p_value < 0.05 {
            "p < 0.05".to_string()
        } else {
            format!("p = {:.3}", self.p_value)
        }
    }
}

/// 一元线性回归（跳过含 NaN 的点对）
pub fn linregress(x: &[f64], y: &[f64]) -> Result<LinearFit> {
    if x.len() != y.len() {
        return Err(UnseenError::DimensionMismatch {
            what: "regression inputs".to_string(),
            expected: x.len(),
            found: y.len(),
        });
    }

    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .collect();
    let n = pairs.len();
    if n < 2 {
        return Err(UnseenError::InsufficientData {
            what: "linear regression".to_string(),
            needed: 2,
            got: n,
        });
    }

    let nf = n as f64;
    let x_mean = pairs.iter().map(|p| p.0).sum::<f64>() / nf;
    let y_mean = pairs.iter().map(|p| p.1).sum::<f64>() / nf;

    let mut ssxm = 0.0;
    let mut ssym = 0.0;
    let mut ssxym = 0.0;
    for (a, b) in &pairs {
        ssxm += (a - x_mean) * (a - x_mean);
        ssym += (b - y_mean) * (b - y_mean);
        ssxym += (a - x_mean) * (b - y_mean);
    }
    ssxm /= nf;
    ssym /= nf;
    ssxym /= nf;

    if ssxm == 0.0 {
        return Err(UnseenError::FitFailed(
            "all x values are identical in linear regression".to_string(),
        ));
    }

    let slope = ssxym / ssxm;
    let intercept = y_mean - slope * x_mean;

    let r = if ssym == 0.0 {
        0.0
    } else {
        (ssxym / (ssxm * ssym).sqrt()).clamp(-1.0, 1.0)
    };

    let (p_value, stderr) = if n == 2 {
        let p = if pairs[0].1 == pairs[1].1 { 1.0 } else { 0.0 };
        (p, 0.0)
    } else {
        let df = nf - 2.0;
        let t = r * (df / ((1.0 - r + TINY) * (1.0 + r + TINY))).sqrt();
        let p = student_t_two_sided(t, df);
        let stderr = ((1.0 - r * r) * ssym / ssxm / df).sqrt();
        (p, stderr)
    };

    Ok(LinearFit {
        slope,
        intercept,
        r_value: r,
        p_value,
        stderr,
        n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_line() {
        let x: Vec<f64> = (0..10).map(|i| 1993.0 + i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| 0.03 * v - 45.0).collect();
        let fit = linregress(&x, &y).unwrap();

        assert!((fit.slope - 0.03).abs() < 1e-10);
        assert!((fit.intercept + 45.0).abs() < 1e-6);
        assert!((fit.r_value - 1.0).abs() < 1e-12);
        assert!(fit.p_value < 1e-10);
        assert!((fit.predict(2024.0) - (0.03 * 2024.0 - 45.0)).abs() < 1e-6);
    }

    #[test]
    fn test_reference_p_value() {
        // x = 1..5, y = [1, 3, 2, 5, 4]: r = 0.8, t = 2.3094, df = 3
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let y = [1.0, 3.0, 2.0, 5.0, 4.0];
        let fit = linregress(&x, &y).unwrap();

        assert!((fit.slope - 0.8).abs() < 1e-12);
        assert!((fit.intercept - 0.6).abs() < 1e-12);
        assert!((fit.r_value - 0.8).abs() < 1e-12);
        assert!((fit.p_value - 0.104_088_039_582_171_4).abs() < 1e-6);
        assert_eq!(fit.p_class(), "p = 0.104");
    }

    #[test]
    fn test_two_points() {
        let fit = linregress(&[0.0, 1.0], &[1.0, 1.0]).unwrap();
        assert_eq!(fit.p_value, 1.0);
        let fit = linregress(&[0.0, 1.0], &[1.0, 2.0]).unwrap();
        assert_eq!(fit.p_value, 0.0);
    }

    #[test]
    fn test_degenerate_inputs() {
        assert!(linregress(&[1.0], &[2.0]).is_err());
        assert!(linregress(&[1.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_err());
        assert!(linregress(&[1.0, 2.0], &[1.0]).is_err());
    }

    #[test]
    fn test_skips_nan_pairs() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, f64::NAN, 6.0, 8.0];
        let fit = linregress(&x, &y).unwrap();
        assert_eq!(fit.n, 3);
        assert!((fit.slope - 2.0).abs() < 1e-12);
    }
}
