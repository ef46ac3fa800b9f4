//! # init-config 命令实现
//!
//! 将默认配置写为 TOML 文件，作为编辑起点。
//!
//! ## 依赖关系
//! - 使用 `cli/init_config.rs` 定义的参数
//! - 使用 `config.rs`

use crate::cli::init_config::InitConfigArgs;
use crate::config::AnalysisConfig;
use crate::error::{Result, UnseenError};
use crate::utils::output;

use std::fs;
use std::path::Path;

const HEADER: &str = "\
# UNSEEN marine heatwave analysis configuration
#
# trend_source: \"obs\" (observed seasonal means) or \"model\" (ensemble mean)
# match_years:  observed years that overlap the hindcasts (inclusive)
";

/// 执行 init-config 命令
pub fn execute(args: InitConfigArgs) -> Result<()> {
    write_default_config(&args.path, args.force)?;
    output::print_success(&format!("Default configuration written to '{}'", args.path.display()));
    Ok(())
}

/// 写出默认配置；文件已存在且未指定 force 时报错
pub fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(UnseenError::InvalidArgument(format!(
            "'{}' already exists, use --force to overwrite",
            path.display()
        )));
    }

    let body = AnalysisConfig::default().to_toml_string()?;
    fs::write(path, format!("{}\n{}", HEADER, body)).map_err(|e| UnseenError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("unseen.toml");
        write_default_config(&path, false).unwrap();

        let loaded = AnalysisConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded.analysis, AnalysisConfig::default().analysis);

        assert!(write_default_config(&path, false).is_err());
        write_default_config(&path, true).unwrap();
    }
}
