//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `distribution`: 构造 UNSEEN 分布并定位关注事件
//! - `fidelity`: 保真度检验（嵌套子命令）
//!   - `moments`: 矩保真度
//!   - `trend`: 趋势保真度
//! - `stability`: 独立性与稳定性检验（嵌套子命令）
//!   - `members`: 成员独立性
//!   - `lead-time`: 预报时效稳定性
//! - `risk`: 事件风险（嵌套子命令）
//!   - `strength`: 超越概率随强度变化
//!   - `time`: 超越概率随枢轴年份变化
//! - `gev`: GEV 重现水平与重现期
//! - `init-config`: 写出默认配置
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: common, distribution, fidelity, stability, risk, gev, init_config

pub mod common;
pub mod distribution;
pub mod fidelity;
pub mod gev;
pub mod init_config;
pub mod risk;
pub mod stability;

use clap::{Parser, Subcommand};

/// unseen - 海洋热浪的 UNSEEN 集合统计
#[derive(Parser)]
#[command(name = "unseen")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(
    about = "UNSEEN ensemble statistics for marine heatwave extremes",
    long_about = None
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Build the UNSEEN NMAX distribution and rank the focus event in it
    Distribution(distribution::DistributionArgs),

    /// Test whether the ensemble reproduces observed statistics
    Fidelity(fidelity::FidelityArgs),

    /// Test member independence and lead-time stability
    Stability(stability::StabilityArgs),

    /// Exceedance probability of the focus event by strength or climate year
    Risk(risk::RiskArgs),

    /// Fit a GEV distribution and report return levels and periods
    Gev(gev::GevArgs),

    /// Write the default configuration to a TOML file
    InitConfig(init_config::InitConfigArgs),
}
