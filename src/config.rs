//! # 分析配置
//!
//! 从 TOML 文件读取分析参数与数据路径，缺省字段使用默认值。
//!
//! ## 查找顺序
//! 1. `--config` 指定的文件
//! 2. 当前目录下的 `unseen.toml`
//! 3. 内置默认值
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `models/season.rs` 构造季节

use crate::error::{Result, UnseenError};
use crate::models::Season;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "unseen.toml";

/// 去趋势所用趋势来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TrendSource {
    /// Linear trend of observed seasonal means (full record)
    #[default]
    Obs,
    /// Linear trend of the ensemble-mean seasonal means
    Model,
}

impl fmt::Display for TrendSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendSource::Obs => write!(f, "obs"),
            TrendSource::Model => write!(f, "model"),
        }
    }
}

/// `[analysis]` 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSection {
    /// JJA-NMAX 滑动窗口天数 N
    pub extr_avg_period: usize,
    pub regions: Vec<String>,
    pub season_months: Vec<u32>,
    pub season_name: String,
    pub pivot_year: i32,
    /// 与回报期重叠的观测年份（闭区间）
    pub match_years: [i32; 2],
    pub trend_source: TrendSource,
    pub detrend: bool,
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            extr_avg_period: 14,
            regions: vec![
                "Celtic Sea".to_string(),
                "Central North Sea".to_string(),
                "Irish Shelf".to_string(),
            ],
            season_months: vec![6, 7, 8],
            season_name: "JJA".to_string(),
            pivot_year: 2024,
            match_years: [1993, 2016],
            trend_source: TrendSource::Obs,
            detrend: true,
        }
    }
}

/// `[paths]` 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    pub obs_sst_regmeans: PathBuf,
    pub model_sst_regmeans: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            obs_sst_regmeans: PathBuf::from("data/obs_sst_regmeans.csv"),
            model_sst_regmeans: PathBuf::from("data/model_sst_regmeans.csv"),
            output_dir: PathBuf::from("output"),
        }
    }
}

/// `[event]` 表：关注事件时段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSection {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub label: String,
}

impl Default for EventSection {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2023, 6, 30).unwrap_or_default(),
            label: "June 2023".to_string(),
        }
    }
}

/// `[bootstrap]` 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapSection {
    pub iterations: usize,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for BootstrapSection {
    fn default() -> Self {
        Self {
            iterations: 1000,
            confidence: 0.95,
            seed: None,
        }
    }
}

/// 完整配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub analysis: AnalysisSection,
    pub paths: PathsSection,
    pub event: EventSection,
    pub bootstrap: BootstrapSection,
    /// 实际读取的配置文件
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl AnalysisConfig {
    /// 读取配置（见模块文档中的查找顺序）
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let resolved = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(UnseenError::FileNotFound {
                        path: p.display().to_string(),
                    });
                }
                Some(p.to_path_buf())
            }
            None => {
                let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                local.exists().then_some(local)
            }
        };

        match resolved {
            Some(p) => Self::from_file(&p),
            None => Ok(Self::default()),
        }
    }

    /// 从指定文件读取
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| UnseenError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|e| UnseenError::ConfigError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// 序列化为 TOML 文本
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn origin(&self) -> String {
        self.source
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<defaults>".to_string())
    }

    fn invalid(&self, reason: impl Into<String>) -> UnseenError {
        UnseenError::ConfigError {
            path: self.origin(),
            reason: reason.into(),
        }
    }

    /// 校验参数取值
    pub fn validate(&self) -> Result<()> {
        let a = &self.analysis;
        if a.extr_avg_period == 0 {
            return Err(self.invalid("extr_avg_period must be at least 1"));
        }
        if a.regions.is_empty() {
            return Err(self.invalid("at least one region is required"));
        }
        self.season()
            .map_err(|e| self.invalid(format!("season_months: {}", e)))?;
        if a.match_years[0] > a.match_years[1] {
            return Err(self.invalid(format!(
                "match_years must be ordered, got [{}, {}]",
                a.match_years[0], a.match_years[1]
            )));
        }

        let b = &self.bootstrap;
        if !(b.confidence > 0.0 && b.confidence < 1.0) {
            return Err(self.invalid(format!(
                "bootstrap confidence must be in (0, 1), got {}",
                b.confidence
            )));
        }
        if b.iterations == 0 {
            return Err(self.invalid("bootstrap iterations must be at least 1"));
        }

        if self.event.start > self.event.end {
            return Err(self.invalid(format!(
                "event start {} is after end {}",
                self.event.start, self.event.end
            )));
        }
        Ok(())
    }

    /// 配置中的目标季节
    pub fn season(&self) -> Result<Season> {
        Season::new(
            self.analysis.season_months.clone(),
            self.analysis.season_name.clone(),
        )
    }

    /// 观测与回报重叠的年份列表
    pub fn match_year_list(&self) -> Vec<i32> {
        (self.analysis.match_years[0]..=self.analysis.match_years[1]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalysisConfig::default();
        config.validate().unwrap();
        assert_eq!(config.analysis.extr_avg_period, 14);
        assert_eq!(config.match_year_list().len(), 24);
        assert_eq!(config.season().unwrap().max_length(), 92);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[analysis]\nextr_avg_period = 7\ntrend_source = \"model\"\n\n[bootstrap]\nseed = 42\n\n[event]\nstart = \"2023-06-10\""
        )
        .unwrap();

        let config = AnalysisConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.analysis.extr_avg_period, 7);
        assert_eq!(config.analysis.trend_source, TrendSource::Model);
        assert_eq!(config.analysis.pivot_year, 2024);
        assert_eq!(config.bootstrap.seed, Some(42));
        assert_eq!(config.bootstrap.iterations, 1000);
        assert_eq!(config.event.start, NaiveDate::from_ymd_opt(2023, 6, 10).unwrap());
        assert_eq!(config.event.label, "June 2023");
        assert!(config.source.is_some());
    }

    #[test]
    fn test_round_trip_default_file() {
        let config = AnalysisConfig::default();
        let text = config.to_toml_string().unwrap();
        let parsed: AnalysisConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = AnalysisConfig::default();
        config.analysis.match_years = [2016, 1993];
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.bootstrap.confidence = 1.5;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.analysis.season_months = vec![6, 8];
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.event.end = NaiveDate::from_ymd_opt(2023, 5, 1).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_and_bad_toml() {
        assert!(AnalysisConfig::load(Some(Path::new("/nonexistent/unseen.toml"))).is_err());

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[analysis]\nextr_avg_period = \"many\"").unwrap();
        let err = AnalysisConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, UnseenError::ConfigError { .. }));
    }
}
