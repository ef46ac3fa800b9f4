//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `parsers/`, `unseen/`, `plot/`, `export`, `utils/`
//! - 子模块: context, distribution, fidelity, stability, risk, gev, init_config

pub mod context;
pub mod distribution;
pub mod fidelity;
pub mod gev;
pub mod init_config;
pub mod risk;
pub mod stability;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Distribution(args) => distribution::execute(args),
        Commands::Fidelity(args) => fidelity::execute(args),
        Commands::Stability(args) => stability::execute(args),
        Commands::Risk(args) => risk::execute(args),
        Commands::Gev(args) => gev::execute(args),
        Commands::InitConfig(args) => init_config::execute(args),
    }
}
