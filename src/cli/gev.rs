//! # gev 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/gev.rs`

use crate::cli::common::DataArgs;
use crate::stats::FitMethod;

use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// GEV 拟合方法
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum GevMethod {
    /// Hosking L-moments (probability weighted moments)
    Lmoments,
    /// Maximum likelihood started from the L-moment estimate
    Mle,
}

impl std::fmt::Display for GevMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GevMethod::Lmoments => write!(f, "lmoments"),
            GevMethod::Mle => write!(f, "mle"),
        }
    }
}

impl From<GevMethod> for FitMethod {
    fn from(m: GevMethod) -> Self {
        match m {
            GevMethod::Lmoments => FitMethod::LMoments,
            GevMethod::Mle => FitMethod::MaximumLikelihood,
        }
    }
}

/// gev 子命令参数
#[derive(Args, Debug)]
pub struct GevArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Parameter estimation method
    #[arg(long, value_enum, default_value_t = GevMethod::Lmoments)]
    pub method: GevMethod,

    /// Return periods in years, comma separated
    #[arg(long, default_value = "10,20,50,100")]
    pub periods: String,

    /// Restrict samples to hindcast years, e.g. '2000-2016'
    #[arg(long)]
    pub years: Option<String>,

    /// Skip the bootstrap confidence intervals
    #[arg(long)]
    pub no_bootstrap: bool,

    /// Return level figure file name inside the output directory
    #[arg(long, default_value = "gev_return_levels.png")]
    pub plot: PathBuf,

    /// Skip figure generation
    #[arg(long)]
    pub no_plot: bool,
}
