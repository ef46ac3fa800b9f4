//! # UNSEEN 方法模块
//!
//! UNSEEN (UNprecedented Simulated Extremes using ENsembles)：
//! 将季节预测回报集合合并为大样本，评估观测中尚未出现的极端事件概率。
//!
//! ## 子模块
//! - `nmax`: N 日滑动平均最大值
//! - `detrend`: 枢轴去趋势
//! - `distribution`: UNSEEN 分布构造
//! - `observed`: 观测 NMAX 与关注事件峰值
//! - `risk`: 超越概率随强度、年份的变化
//! - `fidelity`: 矩与趋势保真度
//! - `stability`: 成员独立性与预报时效稳定性
//! - `extremes`: GEV 重现水平与重现期
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/`, `stats/`

pub mod detrend;
pub mod distribution;
pub mod extremes;
pub mod fidelity;
pub mod nmax;
pub mod observed;
pub mod risk;
pub mod stability;

pub use distribution::{NmaxField, UnseenDistribution};
pub use observed::FocusEvent;
