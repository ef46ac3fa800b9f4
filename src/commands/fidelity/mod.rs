//! # fidelity 命令实现
//!
//! ## 子命令
//! - `moments`: 矩保真度
//! - `trend`: 趋势保真度与观测趋势摘要
//!
//! ## 依赖关系
//! - 使用 `cli/fidelity.rs` 定义的参数
//! - 子模块: moments, trend

pub mod moments;
pub mod trend;

use crate::cli::fidelity::{FidelityArgs, FidelityCommands};
use crate::error::Result;
use crate::stats::resample::ConfidenceInterval;

/// 执行 fidelity 命令
pub fn execute(args: FidelityArgs) -> Result<()> {
    match args.command {
        FidelityCommands::Moments(a) => moments::execute(a),
        FidelityCommands::Trend(a) => trend::execute(a),
    }
}

/// 百分位排名是否落在置信区间内
pub(crate) fn within_interval(rank: f64, ci: &ConfidenceInterval) -> bool {
    rank >= ci.low_q * 100.0 && rank <= ci.high_q * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_within_interval() {
        let ci = ConfidenceInterval::default();
        assert!(within_interval(50.0, &ci));
        assert!(within_interval(2.5, &ci));
        assert!(!within_interval(99.0, &ci));
        assert!(!within_interval(f64::NAN, &ci));
    }
}
