//! # 进度条工具
//!
//! 封装 `indicatif`：自助法 / 置换循环使用计数进度条，数据读取使用 spinner。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `indicatif` crate

use indicatif::{ProgressBar, ProgressStyle};

/// 创建标准进度条
pub fn create_progress_bar(len: u64, message: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        )
        .unwrap()
        .progress_chars("#>-"),
    );
    pb.set_message(message.to_string());
    pb
}

/// 重采样循环进度条：每个区域 `iterations` 步
pub fn create_resampling_bar(iterations: usize, regions: usize, what: &str) -> ProgressBar {
    let total = (iterations * regions.max(1)) as u64;
    create_progress_bar(total, &format!("{} ({} iterations)", what, iterations))
}

/// 创建 spinner（用于不确定进度的任务）
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {elapsed_precise} {msg}")
            .unwrap()
            .tick_strings(&["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resampling_bar_length() {
        let pb = create_resampling_bar(250, 3, "moments");
        assert_eq!(pb.length(), Some(750));
        let pb = create_resampling_bar(10, 0, "trend");
        assert_eq!(pb.length(), Some(10));
    }
}
