//! # 通用统计数值模块
//!
//! 与 UNSEEN 方法无关的统计工具。
//!
//! ## 子模块
//! - `descriptive`: 矩、分位数、百分位排名
//! - `regression`: 一元线性回归
//! - `special`: Gamma / Beta / Kolmogorov 特殊函数
//! - `optimize`: Nelder-Mead 优化
//! - `resample`: 自助法工具
//! - `gev`: 广义极值分布
//! - `independence`: 相关系数与 KS 检验
//!
//! ## 依赖关系
//! - 被 `models/`, `unseen/` 使用

pub mod descriptive;
pub mod gev;
pub mod independence;
pub mod optimize;
pub mod regression;
pub mod resample;
pub mod special;

pub use gev::FitMethod;
pub use regression::{linregress, LinearFit};
pub use resample::Band;
