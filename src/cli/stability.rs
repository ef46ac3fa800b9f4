//! # stability 子命令 CLI 定义
//!
//! 合并集合成员的前提检验：
//! - `members`: 成员独立性（Spearman 相关 vs 置换零分布）
//! - `lead-time`: 各起报日期 / hindcast 的分布一致性（KS 检验）
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/stability.rs`

use crate::cli::common::DataArgs;

use clap::{Args, Subcommand};

/// stability 主命令参数
#[derive(Args, Debug)]
pub struct StabilityArgs {
    #[command(subcommand)]
    pub command: StabilityCommands,
}

/// stability 子命令
#[derive(Subcommand, Debug)]
pub enum StabilityCommands {
    /// Spearman correlation between members against a shuffled null distribution
    Members(MembersArgs),

    /// Two-sample KS test of each start date and hindcast against the rest
    LeadTime(LeadTimeArgs),
}

/// members 子命令参数
#[derive(Args, Debug)]
pub struct MembersArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Random pairings in the null distribution (default: bootstrap iterations)
    #[arg(long)]
    pub permutations: Option<usize>,
}

/// lead-time 子命令参数
#[derive(Args, Debug)]
pub struct LeadTimeArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Significance level of the KS test
    #[arg(long, default_value_t = 0.05)]
    pub alpha: f64,
}
