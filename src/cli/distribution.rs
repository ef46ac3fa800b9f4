//! # distribution 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/distribution.rs`

use crate::cli::common::DataArgs;

use clap::Args;
use std::path::PathBuf;

/// distribution 子命令参数
#[derive(Args, Debug)]
pub struct DistributionArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Histogram file name inside the output directory (.png or .svg)
    #[arg(long, default_value = "unseen_distribution.png")]
    pub plot: PathBuf,

    /// CSV file name for the pooled samples
    #[arg(long, default_value = "unseen_distribution.csv")]
    pub csv: PathBuf,

    /// Skip figure generation
    #[arg(long)]
    pub no_plot: bool,
}
