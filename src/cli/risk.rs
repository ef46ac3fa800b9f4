//! # risk 子命令 CLI 定义
//!
//! 关注事件超越概率：
//! - `strength`: 事件峰值加上增量后的超越概率
//! - `time`: 以不同枢轴年份去趋势时的超越概率
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/risk.rs`

use crate::cli::common::DataArgs;

use clap::{Args, Subcommand};
use std::path::PathBuf;

/// risk 主命令参数
#[derive(Args, Debug)]
pub struct RiskArgs {
    #[command(subcommand)]
    pub command: RiskCommands,
}

/// risk 子命令
#[derive(Subcommand, Debug)]
pub enum RiskCommands {
    /// Exceedance probability against event strength (°C above the focus event)
    Strength(StrengthArgs),

    /// Exceedance probability against pivot year
    Time(TimeArgs),
}

/// strength 子命令参数
#[derive(Args, Debug)]
pub struct StrengthArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Largest strength increment in °C
    #[arg(long, default_value_t = 2.0)]
    pub max_increment: f64,

    /// Increment step in °C
    #[arg(long, default_value_t = 0.1)]
    pub step: f64,

    /// Figure file name inside the output directory (.png or .svg)
    #[arg(long, default_value = "risk_strength.png")]
    pub plot: PathBuf,

    /// Skip figure generation
    #[arg(long)]
    pub no_plot: bool,
}

/// time 子命令参数
#[derive(Args, Debug)]
pub struct TimeArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Pivot years to evaluate, e.g. '1993-2024' (default: hindcast years through the pivot year)
    #[arg(long)]
    pub pivot_years: Option<String>,

    /// Extend the curve to this year using model trends
    #[arg(long)]
    pub extrapolate_to: Option<i32>,

    /// Figure file name inside the output directory (.png or .svg)
    #[arg(long, default_value = "risk_time.png")]
    pub plot: PathBuf,

    /// Skip figure generation
    #[arg(long)]
    pub no_plot: bool,
}
