//! # 解析器模块
//!
//! 读取区域平均 SST 数据集（模式回报集合与观测）。
//!
//! ## 支持格式
//! - `.csv`: 长表格式（默认）
//! - `.nc` / `.nc4`: NetCDF（需 `--features netcdf`）
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 构造 `models/` 数据模型
//! - 子模块: csv_table, cf_time, netcdf_file

pub mod cf_time;
pub mod csv_table;
#[cfg(feature = "netcdf")]
pub mod netcdf_file;

use crate::error::{Result, UnseenError};
use crate::models::{HindcastEnsemble, ObsRecord};
use std::path::Path;

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default()
}

fn check_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(UnseenError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(())
}

#[cfg(not(feature = "netcdf"))]
fn netcdf_disabled(path: &Path) -> UnseenError {
    UnseenError::UnsupportedFormat(format!(
        "{} is NetCDF; rebuild with `--features netcdf` or convert it to CSV",
        path.display()
    ))
}

/// 从文件路径推断格式并读取模式集合
pub fn parse_model_file(path: &Path) -> Result<HindcastEnsemble> {
    check_exists(path)?;
    match extension(path).as_str() {
        "csv" => csv_table::parse_model_csv(path),
        #[cfg(feature = "netcdf")]
        "nc" | "nc4" => netcdf_file::parse_model_netcdf(path),
        #[cfg(not(feature = "netcdf"))]
        "nc" | "nc4" => Err(netcdf_disabled(path)),
        _ => Err(UnseenError::UnsupportedFormat(format!(
            "Cannot determine format for: {}",
            path.display()
        ))),
    }
}

/// 从文件路径推断格式并读取观测
pub fn parse_obs_file(path: &Path) -> Result<ObsRecord> {
    check_exists(path)?;
    match extension(path).as_str() {
        "csv" => csv_table::parse_obs_csv(path),
        #[cfg(feature = "netcdf")]
        "nc" | "nc4" => netcdf_file::parse_obs_netcdf(path),
        #[cfg(not(feature = "netcdf"))]
        "nc" | "nc4" => Err(netcdf_disabled(path)),
        _ => Err(UnseenError::UnsupportedFormat(format!(
            "Cannot determine format for: {}",
            path.display()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_dispatch_by_extension() {
        let mut file = Builder::new().suffix(".CSV").tempfile().unwrap();
        writeln!(file, "region,date,sst\nA,2000-06-01,1.0").unwrap();
        let obs = parse_obs_file(file.path()).unwrap();
        assert_eq!(obs.regions, vec!["A"]);

        let other = Builder::new().suffix(".txt").tempfile().unwrap();
        assert!(matches!(
            parse_model_file(other.path()),
            Err(UnseenError::UnsupportedFormat(_))
        ));

        assert!(matches!(
            parse_model_file(Path::new("/nonexistent/model.csv")),
            Err(UnseenError::FileNotFound { .. })
        ));
    }
}
