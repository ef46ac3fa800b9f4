//! # fidelity 子命令 CLI 定义
//!
//! 保真度检验，包含两个子命令：
//! - `moments`: 均值、标准差、偏度、峰度
//! - `trend`: 季节平均线性趋势
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/fidelity/` 相应模块

use crate::cli::common::DataArgs;

use clap::{Args, Subcommand};
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────
// Fidelity 主命令
// ─────────────────────────────────────────────────────────────

/// fidelity 主命令参数
#[derive(Args, Debug)]
pub struct FidelityArgs {
    #[command(subcommand)]
    pub command: FidelityCommands,
}

/// fidelity 子命令
#[derive(Subcommand, Debug)]
pub enum FidelityCommands {
    /// Compare observed NMAX moments with pseudo-timeseries drawn from the ensemble
    Moments(MomentsArgs),

    /// Compare the observed seasonal-mean trend with random-realisation trends
    Trend(TrendArgs),
}

// ─────────────────────────────────────────────────────────────
// 矩保真度
// ─────────────────────────────────────────────────────────────

/// moments 子命令参数
#[derive(Args, Debug)]
pub struct MomentsArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Histogram file name inside the output directory (.png or .svg)
    #[arg(long, default_value = "fidelity_moments.png")]
    pub plot: PathBuf,

    /// Skip figure generation
    #[arg(long)]
    pub no_plot: bool,
}

// ─────────────────────────────────────────────────────────────
// 趋势保真度
// ─────────────────────────────────────────────────────────────

/// trend 子命令参数
#[derive(Args, Debug)]
pub struct TrendArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Slope histogram file name inside the output directory
    #[arg(long, default_value = "fidelity_trend.png")]
    pub plot: PathBuf,

    /// Observed seasonal-mean trend figure file name
    #[arg(long, default_value = "observed_trend.png")]
    pub obs_plot: PathBuf,

    /// Skip figure generation
    #[arg(long)]
    pub no_plot: bool,
}
