//! # 广义极值分布 (GEV)
//!
//! 采用 Coles 参数化：
//!
//! F(x) = exp(-(1 + ξ z)^(-1/ξ)),  z = (x - μ) / σ,  1 + ξ z > 0
//!
//! ξ > 0 为重尾 (Fréchet)，ξ < 0 上尾有界 (Weibull, 上界 μ - σ/ξ)，
//! |ξ| < 1e-6 时按 Gumbel 处理。
//!
//! ## 功能
//! - 分布函数、对数密度、分位数、重现水平与重现期
//! - L-矩估计 (Hosking 1985)
//! - 极大似然估计（Nelder-Mead，参数 (μ, ln σ, ξ)，以 L-矩估计为初值）
//! - 拟合优度 KS 统计量
//!
//! ## 依赖关系
//! - 被 `unseen/extremes.rs` 使用
//! - 使用 `stats/special.rs`, `stats/optimize.rs`

use crate::error::{Result, UnseenError};
use crate::stats::optimize::NelderMead;
use crate::stats::special::gamma;

use rand::Rng;
use std::fmt;

/// |ξ| 小于该值时视为 Gumbel
const GUMBEL_EPS: f64 = 1e-6;

/// 拟合所需最少有限样本数
pub const MIN_FIT_SAMPLES: usize = 10;

const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// GEV 参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GevParams {
    pub location: f64,
    pub scale: f64,
    pub shape: f64,
}

impl GevParams {
    pub fn new(location: f64, scale: f64, shape: f64) -> Result<Self> {
        if !(scale > 0.0) || !location.is_finite() || !shape.is_finite() {
            return Err(UnseenError::InvalidArgument(format!(
                "invalid GEV parameters (mu={}, sigma={}, xi={})",
                location, scale, shape
            )));
        }
        Ok(Self {
            location,
            scale,
            shape,
        })
    }

    fn is_gumbel(&self) -> bool {
        self.shape.abs() < GUMBEL_EPS
    }

    /// 标准化变量 t(x)，使 F(x) = exp(-t)；超出支撑集返回 None
    fn t_of(&self, x: f64) -> Option<f64> {
        let z = (x - self.location) / self.scale;
        if self.is_gumbel() {
            return Some((-z).exp());
        }
        let arg = 1.0 + self.shape * z;
        if arg <= 0.0 {
            None
        } else {
            Some(arg.powf(-1.0 / self.shape))
        }
    }

    /// 上端点（仅 ξ < 0 时有界）
    pub fn upper_bound(&self) -> Option<f64> {
        if self.shape < -GUMBEL_EPS {
            Some(self.location - self.scale / self.shape)
        } else {
            None
        }
    }

    /// 累积分布函数
    pub fn cdf(&self, x: f64) -> f64 {
        match self.t_of(x) {
            Some(t) => (-t).exp(),
            // 上尾有界时超过上界为 1，重尾时低于下界为 0
            None => {
                if self.shape < 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }

    /// 对数概率密度；支撑集外为 -∞
    pub fn ln_pdf(&self, x: f64) -> f64 {
        let z = (x - self.location) / self.scale;
        if self.is_gumbel() {
            return -self.scale.ln() - z - (-z).exp();
        }
        let arg = 1.0 + self.shape * z;
        if arg <= 0.0 {
            return f64::NEG_INFINITY;
        }
        -self.scale.ln() - (1.0 + 1.0 / self.shape) * arg.ln() - arg.powf(-1.0 / self.shape)
    }

    /// 分位数函数 F⁻¹(p)
    pub fn quantile(&self, p: f64) -> f64 {
        if !(0.0..=1.0).contains(&p) {
            return f64::NAN;
        }
        let y = -p.ln();
        if self.is_gumbel() {
            self.location - self.scale * y.ln()
        } else {
            self.location + self.scale / self.shape * (y.powf(-self.shape) - 1.0)
        }
    }

    /// T 年重现水平（T > 1）
    pub fn return_level(&self, period: f64) -> f64 {
        if !(period > 1.0) {
            return f64::NAN;
        }
        self.quantile(1.0 - 1.0 / period)
    }

    /// 数值 x 的重现期，超过上界为 ∞
    pub fn return_period(&self, x: f64) -> f64 {
        let exceed = 1.0 - self.cdf(x);
        if exceed <= 0.0 {
            f64::INFINITY
        } else {
            1.0 / exceed
        }
    }

    /// 负对数似然
    pub fn neg_log_likelihood(&self, data: &[f64]) -> f64 {
        -data.iter().map(|&x| self.ln_pdf(x)).sum::<f64>()
    }

    /// 逆变换抽样
    pub fn sample<R: Rng>(&self, rng: &mut R, n: usize) -> Vec<f64> {
        (0..n)
            .map(|_| self.quantile(rng.gen_range(f64::EPSILON..1.0)))
            .collect()
    }
}

impl fmt::Display for GevParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mu={:.4}, sigma={:.4}, xi={:.4}",
            self.location, self.scale, self.shape
        )
    }
}

/// 拟合方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMethod {
    #[default]
    LMoments,
    MaximumLikelihood,
}

impl fmt::Display for FitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitMethod::LMoments => write!(f, "L-moments"),
            FitMethod::MaximumLikelihood => write!(f, "maximum likelihood"),
        }
    }
}

/// 拟合结果
#[derive(Debug, Clone, Copy)]
pub struct GevFit {
    pub params: GevParams,
    pub method: FitMethod,
    pub n: usize,
    /// 拟合参数下的负对数似然
    pub nll: f64,
    /// 单样本 KS 统计量
    pub ks_statistic: f64,
}

/// 去除 NaN 后升序排列，并检查样本数
fn sorted_finite(data: &[f64]) -> Result<Vec<f64>> {
    let mut xs: Vec<f64> = data.iter().copied().filter(|x| x.is_finite()).collect();
    if xs.len() < MIN_FIT_SAMPLES {
        return Err(UnseenError::InsufficientData {
            what: "GEV fit".to_string(),
            needed: MIN_FIT_SAMPLES,
            got: xs.len(),
        });
    }
    xs.sort_by(f64::total_cmp);
    Ok(xs)
}

/// 前三阶样本 L-矩 (l1, l2, t3)，输入已排序
fn sample_lmoments(sorted: &[f64]) -> (f64, f64, f64) {
    let n = sorted.len() as f64;
    let mut b0 = 0.0;
    let mut b1 = 0.0;
    let mut b2 = 0.0;
    for (j, &x) in sorted.iter().enumerate() {
        let j = j as f64;
        b0 += x;
        b1 += x * j / (n - 1.0);
        b2 += x * j * (j - 1.0) / ((n - 1.0) * (n - 2.0));
    }
    b0 /= n;
    b1 /= n;
    b2 /= n;

    let l1 = b0;
    let l2 = 2.0 * b1 - b0;
    let l3 = 6.0 * b2 - 6.0 * b1 + b0;
    (l1, l2, l3 / l2)
}

/// Hosking L-矩估计（输入已排序）
fn fit_lmoments(xs: &[f64]) -> Result<GevParams> {
    let (l1, l2, t3) = sample_lmoments(xs);
    if !(l2 > 0.0) {
        return Err(UnseenError::FitFailed(
            "sample has zero L-scale (constant data)".to_string(),
        ));
    }

    // Hosking 近似，k = -ξ
    let c = 2.0 / (3.0 + t3) - 2.0_f64.ln() / 3.0_f64.ln();
    let k = 7.8590 * c + 2.9554 * c * c;

    if k.abs() < GUMBEL_EPS {
        let scale = l2 / 2.0_f64.ln();
        return GevParams::new(l1 - EULER_GAMMA * scale, scale, 0.0);
    }

    let g = gamma(1.0 + k);
    let scale = l2 * k / ((1.0 - 2.0_f64.powf(-k)) * g);
    let location = l1 - scale * (1.0 - g) / k;
    GevParams::new(location, scale, -k)
}

/// 极大似然估计，从 L-矩估计出发
fn fit_mle(xs: &[f64]) -> Result<GevParams> {
    let start = fit_lmoments(xs)?;

    let objective = |p: &[f64; 3]| {
        let scale = p[1].exp();
        let params = GevParams {
            location: p[0],
            scale,
            shape: p[2],
        };
        params.neg_log_likelihood(xs)
    };

    // 初值若落在支撑集外则退回 Gumbel 初值
    let mut x0 = [start.location, start.scale.ln(), start.shape];
    if !objective(&x0).is_finite() {
        x0[2] = 0.0;
    }

    let optimizer = NelderMead {
        max_iter: 5000,
        f_tol: 1e-9,
        x_tol: 1e-8,
    };
    let step = [0.1 * start.scale, 0.1, 0.05];
    let result = optimizer.minimize(objective, x0, step);

    if !result.value.is_finite() {
        return Err(UnseenError::FitFailed(
            "GEV likelihood is not finite at any simplex vertex".to_string(),
        ));
    }

    GevParams::new(result.point[0], result.point[1].exp(), result.point[2])
}

/// 单样本 KS 统计量 D = sup |F_n - F|
fn ks_statistic(sorted: &[f64], params: &GevParams) -> f64 {
    let n = sorted.len() as f64;
    sorted
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let f = params.cdf(x);
            ((i as f64 + 1.0) / n - f).max(f - i as f64 / n)
        })
        .fold(0.0, f64::max)
}

/// 按指定方法拟合
pub fn fit(data: &[f64], method: FitMethod) -> Result<GevFit> {
    let xs = sorted_finite(data)?;
    let params = match method {
        FitMethod::LMoments => fit_lmoments(&xs)?,
        FitMethod::MaximumLikelihood => fit_mle(&xs)?,
    };
    Ok(GevFit {
        params,
        method,
        n: xs.len(),
        nll: params.neg_log_likelihood(&xs),
        ks_statistic: ks_statistic(&xs, &params),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() < tol, "{} vs {} (tol {})", a, b, tol);
    }

    #[test]
    fn test_gumbel_cdf_and_quantile() {
        let p = GevParams::new(0.0, 1.0, 0.0).unwrap();
        assert_close(p.cdf(0.0), (-1.0_f64).exp(), 1e-12);
        assert_close(p.quantile((-1.0_f64).exp()), 0.0, 1e-12);
        assert!(p.upper_bound().is_none());
    }

    #[test]
    fn test_bounded_tail() {
        let p = GevParams::new(1.0, 0.5, -0.25).unwrap();
        let bound = p.upper_bound().unwrap();
        assert_close(bound, 3.0, 1e-12);
        assert_eq!(p.cdf(3.5), 1.0);
        assert!(p.return_period(3.5).is_infinite());
        assert_eq!(p.ln_pdf(3.5), f64::NEG_INFINITY);
        // 重现水平不超过上界
        assert!(p.return_level(1.0e6) < bound);
    }

    #[test]
    fn test_return_level_period_inverse() {
        for &shape in &[-0.2, 0.0, 0.15] {
            let p = GevParams::new(2.0, 0.7, shape).unwrap();
            for &period in &[2.0, 10.0, 50.0, 100.0] {
                let level = p.return_level(period);
                assert_close(p.return_period(level), period, 1e-6 * period);
            }
        }
        let p = GevParams::new(0.0, 1.0, 0.1).unwrap();
        assert!(p.return_level(1.0).is_nan());
    }

    #[test]
    fn test_pdf_integrates_to_cdf_difference() {
        let p = GevParams::new(0.3, 1.2, 0.1).unwrap();
        let (a, b) = (-1.0, 2.0);
        let steps = 20_000;
        let h = (b - a) / steps as f64;
        let integral: f64 = (0..steps)
            .map(|i| p.ln_pdf(a + (i as f64 + 0.5) * h).exp() * h)
            .sum();
        assert_close(integral, p.cdf(b) - p.cdf(a), 1e-6);
    }

    #[test]
    fn test_lmoments_recovers_parameters() {
        let truth = GevParams::new(0.5, 0.8, -0.2).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let data = truth.sample(&mut rng, 5000);

        let fitted = fit(&data, FitMethod::LMoments).unwrap().params;
        assert_close(fitted.location, 0.5, 0.1);
        assert_close(fitted.scale, 0.8, 0.1);
        assert_close(fitted.shape, -0.2, 0.1);
    }

    #[test]
    fn test_mle_recovers_parameters() {
        let truth = GevParams::new(1.0, 0.5, 0.1).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let data = truth.sample(&mut rng, 3000);

        let result = fit(&data, FitMethod::MaximumLikelihood).unwrap();
        assert_eq!(result.n, 3000);
        assert_close(result.params.location, 1.0, 0.1);
        assert_close(result.params.scale, 0.5, 0.1);
        assert_close(result.params.shape, 0.1, 0.1);

        // 极大似然不劣于 L-矩估计
        let lmom = fit(&data, FitMethod::LMoments).unwrap();
        assert!(result.nll <= lmom.nll + 1e-6);
        assert!(result.ks_statistic < 0.05);
    }

    #[test]
    fn test_fit_rejects_small_or_constant_samples() {
        let small = [1.0, 2.0, 3.0];
        assert!(matches!(
            fit(&small, FitMethod::LMoments),
            Err(UnseenError::InsufficientData { .. })
        ));
        let constant = [1.0; 20];
        assert!(fit(&constant, FitMethod::LMoments).is_err());
    }
}
