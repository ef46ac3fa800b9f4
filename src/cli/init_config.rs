//! # init-config 子命令 CLI 定义
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/init_config.rs`

use crate::config::DEFAULT_CONFIG_FILE;

use clap::Args;
use std::path::PathBuf;

/// init-config 子命令参数
#[derive(Args, Debug)]
pub struct InitConfigArgs {
    /// Output path
    #[arg(default_value = DEFAULT_CONFIG_FILE)]
    pub path: PathBuf,

    /// Overwrite an existing file
    #[arg(short, long)]
    pub force: bool,
}
