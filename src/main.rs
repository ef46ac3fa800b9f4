//! # unseen - 海洋热浪 UNSEEN 统计分析工具
//!
//! 将季节回报集合 (hindcast × startdate × member) 合并为大样本
//! (UNpreceded Simulated Extremes using ENsembles)，评估观测海洋热浪的极端程度。
//!
//! ## 子命令
//! - `distribution` - 构建 UNSEEN 分布并定位关注事件
//! - `fidelity`     - 模式保真度检验
//!   - `moments` - 均值 / 标准差 / 偏度 / 峰度
//!   - `trend`   - 季节平均线性趋势
//! - `stability`    - 集合稳定性检验
//!   - `members`   - 成员独立性
//!   - `lead-time` - 预报时效稳定性
//! - `risk`         - 超越概率
//!   - `strength` - 随事件强度
//!   - `time`     - 随枢轴年份
//! - `gev`          - 广义极值分布与重现水平
//! - `init-config`  - 生成默认配置文件
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── parsers/   (CSV / NetCDF 读取)
//!   │     ├── unseen/    (UNSEEN 方法)
//!   │     ├── stats/     (统计数值)
//!   │     ├── plot/      (图表)
//!   │     └── export.rs  (CSV 导出)
//!   ├── config.rs   (分析配置)
//!   ├── models/     (数据模型)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod cli;
mod commands;
mod config;
mod error;
mod export;
mod models;
mod parsers;
mod plot;
mod stats;
mod unseen;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
