//! # 公共数据参数
//!
//! 所有分析子命令共享：配置文件路径与覆盖配置的选项。
//!
//! ## 依赖关系
//! - 被 `cli/` 各子命令 flatten
//! - 在 `commands/context.rs` 中应用到配置

use crate::config::TrendSource;

use clap::Args;
use std::path::PathBuf;

/// 数据与配置覆盖参数
#[derive(Args, Debug, Clone, Default)]
pub struct DataArgs {
    /// Configuration file (default: ./unseen.toml if present)
    #[arg(short, long, env = "UNSEEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Observed regional-mean SST file (.csv or .nc)
    #[arg(long)]
    pub obs: Option<PathBuf>,

    /// Hindcast ensemble regional-mean SST file (.csv or .nc)
    #[arg(long)]
    pub model: Option<PathBuf>,

    /// Regions to analyse, comma separated
    #[arg(long, value_delimiter = ',')]
    pub regions: Option<Vec<String>>,

    /// Rolling-mean window N in days for the seasonal NMAX
    #[arg(long)]
    pub window: Option<usize>,

    /// Pivot year whose climate the distribution represents
    #[arg(long)]
    pub pivot_year: Option<i32>,

    /// Trend used for pivot detrending
    #[arg(long, value_enum)]
    pub trend_source: Option<TrendSource>,

    /// Disable pivot detrending
    #[arg(long)]
    pub no_detrend: bool,

    /// Bootstrap iterations
    #[arg(long)]
    pub iterations: Option<usize>,

    /// Random seed for reproducible resampling
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory for CSV tables and figures
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}
