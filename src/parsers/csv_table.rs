//! # 长表格式 CSV 解析器
//!
//! ## 模式集合
//! ```text
//! region,hindcast,startdate,member,year,day,sst
//! Celtic Sea,h1,may,1,1993,1,14.21
//! ```
//! - `day` 为季节内序号（从 1 开始，不超过 366）
//! - 字符串坐标按首次出现顺序排列，年份升序
//! - 六维数组每个格点必须恰好出现一次，`sst` 为空记为 NaN
//!
//! ## 观测
//! ```text
//! region,date,sst
//! Celtic Sea,1993-06-01,13.87
//! ```
//! - 区域按首次出现顺序，日期升序去重，缺失的 (region, date) 为 NaN
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `csv` + `serde` 逐行反序列化

use crate::error::{Result, UnseenError};
use crate::models::{HindcastEnsemble, ObsRecord};

use chrono::NaiveDate;
use ndarray::{Array2, Array6};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

/// 任何季节的最大天数
const MAX_SEASON_DAYS: usize = 366;

#[derive(Debug, Deserialize)]
struct ModelRow {
    region: String,
    hindcast: String,
    startdate: String,
    member: String,
    year: i32,
    day: usize,
    sst: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ObsRow {
    region: String,
    date: NaiveDate,
    sst: Option<f64>,
}

/// 按首次出现顺序编号的坐标
#[derive(Debug, Default)]
struct Labels {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Labels {
    fn insert(&mut self, name: &str) -> usize {
        if let Some(&i) = self.index.get(name) {
            return i;
        }
        let i = self.names.len();
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), i);
        i
    }
}

fn parse_error(format: &str, path: &str, reason: impl Into<String>) -> UnseenError {
    UnseenError::ParseError {
        format: format.to_string(),
        path: path.to_string(),
        reason: reason.into(),
    }
}

fn incomplete_error(format: &str, path: &str, present: usize, total: usize) -> UnseenError {
    parse_error(
        format,
        path,
        format!(
            "incomplete ensemble: {} of {} (region, hindcast, startdate, member, year, day) cells present",
            present, total
        ),
    )
}

fn read_content(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| UnseenError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 读取模式集合 CSV 文件
pub fn parse_model_csv(path: &Path) -> Result<HindcastEnsemble> {
    let content = read_content(path)?;
    parse_model_csv_content(&content, &path.display().to_string())
}

/// 从字符串解析模式集合
pub fn parse_model_csv_content(content: &str, source: &str) -> Result<HindcastEnsemble> {
    const FORMAT: &str = "model CSV";

    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let mut rows = Vec::new();
    for record in reader.deserialize::<ModelRow>() {
        rows.push(record.map_err(|e| parse_error(FORMAT, source, e.to_string()))?);
    }
    if rows.is_empty() {
        return Err(parse_error(FORMAT, source, "no data rows"));
    }

    let mut regions = Labels::default();
    let mut hindcasts = Labels::default();
    let mut startdates = Labels::default();
    let mut members = Labels::default();
    let mut years = BTreeSet::new();
    let mut n_days = 0;
    for row in &rows {
        regions.insert(&row.region);
        hindcasts.insert(&row.hindcast);
        startdates.insert(&row.startdate);
        members.insert(&row.member);
        years.insert(row.year);
        if row.day == 0 {
            return Err(parse_error(FORMAT, source, "day index must start at 1"));
        }
        if row.day > MAX_SEASON_DAYS {
            return Err(parse_error(
                FORMAT,
                source,
                format!(
                    "day {} exceeds the longest possible season ({} days)",
                    row.day, MAX_SEASON_DAYS
                ),
            ));
        }
        n_days = n_days.max(row.day);
    }
    let years: Vec<i32> = years.into_iter().collect();

    let shape = (
        regions.names.len(),
        hindcasts.names.len(),
        startdates.names.len(),
        members.names.len(),
        years.len(),
        n_days,
    );
    // 无重复时，完整的六维数组恰好每格一行
    let total = [shape.1, shape.2, shape.3, shape.4, shape.5]
        .iter()
        .fold(shape.0, |acc, &n| acc.saturating_mul(n));
    if rows.len() < total {
        return Err(incomplete_error(FORMAT, source, rows.len(), total));
    }
    let mut values = Array6::from_elem(shape, f64::NAN);
    let mut filled = Array6::from_elem(shape, false);

    for row in &rows {
        let idx = [
            regions.index[&row.region],
            hindcasts.index[&row.hindcast],
            startdates.index[&row.startdate],
            members.index[&row.member],
            years.binary_search(&row.year).unwrap_or_default(),
            row.day - 1,
        ];
        if filled[idx] {
            return Err(parse_error(
                FORMAT,
                source,
                format!(
                    "duplicate entry for region '{}', hindcast '{}', startdate '{}', member '{}', year {}, day {}",
                    row.region, row.hindcast, row.startdate, row.member, row.year, row.day
                ),
            ));
        }
        filled[idx] = true;
        values[idx] = row.sst.unwrap_or(f64::NAN);
    }

    let present = filled.iter().filter(|&&f| f).count();
    if present != total {
        return Err(incomplete_error(FORMAT, source, present, total));
    }

    HindcastEnsemble::new(
        regions.names,
        hindcasts.names,
        startdates.names,
        members.names,
        years,
        values,
    )
}

/// 读取观测 CSV 文件
pub fn parse_obs_csv(path: &Path) -> Result<ObsRecord> {
    let content = read_content(path)?;
    parse_obs_csv_content(&content, &path.display().to_string())
}

/// 从字符串解析观测
pub fn parse_obs_csv_content(content: &str, source: &str) -> Result<ObsRecord> {
    const FORMAT: &str = "observation CSV";

    let mut reader = csv::Reader::from_reader(content.as_bytes());
    let mut rows = Vec::new();
    for record in reader.deserialize::<ObsRow>() {
        rows.push(record.map_err(|e| parse_error(FORMAT, source, e.to_string()))?);
    }
    if rows.is_empty() {
        return Err(parse_error(FORMAT, source, "no data rows"));
    }

    let mut regions = Labels::default();
    let mut dates = BTreeSet::new();
    for row in &rows {
        regions.insert(&row.region);
        dates.insert(row.date);
    }
    let dates: Vec<NaiveDate> = dates.into_iter().collect();

    let mut values = Array2::from_elem((regions.names.len(), dates.len()), f64::NAN);
    for row in &rows {
        let r = regions.index[&row.region];
        let t = dates.binary_search(&row.date).unwrap_or_default();
        values[[r, t]] = row.sst.unwrap_or(f64::NAN);
    }

    ObsRecord::new(regions.names, dates, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn model_csv(skip_last: bool) -> String {
        let mut s = String::from("region,hindcast,startdate,member,year,day,sst\n");
        let mut lines = Vec::new();
        for region in ["Celtic Sea", "Irish Shelf"] {
            for hc in ["h2", "h1"] {
                for member in ["1", "2"] {
                    for year in [1994, 1993] {
                        for day in 1..=3 {
                            let v = if day == 2 && member == "2" {
                                String::new()
                            } else {
                                format!("{}", year as f64 * 0.01 + day as f64)
                            };
                            lines.push(format!("{},{},may,{},{},{},{}", region, hc, member, year, day, v));
                        }
                    }
                }
            }
        }
        if skip_last {
            lines.pop();
        }
        s.push_str(&lines.join("\n"));
        s
    }

    #[test]
    fn test_parse_model_csv() {
        let ens = parse_model_csv_content(&model_csv(false), "test").unwrap();
        assert_eq!(ens.regions, vec!["Celtic Sea", "Irish Shelf"]);
        // 首次出现顺序
        assert_eq!(ens.hindcasts, vec!["h2", "h1"]);
        assert_eq!(ens.startdates, vec!["may"]);
        // 年份升序
        assert_eq!(ens.years, vec![1993, 1994]);
        assert_eq!(ens.values.dim(), (2, 2, 1, 2, 2, 3));
        assert!((ens.values[[0, 0, 0, 0, 0, 0]] - 20.93).abs() < 1e-9);
        assert!(ens.values[[0, 0, 0, 1, 0, 1]].is_nan());
    }

    #[test]
    fn test_incomplete_model_csv() {
        let err = parse_model_csv_content(&model_csv(true), "test").unwrap_err();
        assert!(matches!(err, UnseenError::ParseError { .. }));
    }

    #[test]
    fn test_model_day_out_of_range() {
        let content = "region,hindcast,startdate,member,year,day,sst\n\
                       Celtic Sea,h1,may,1,1993,1,14.0\n\
                       Celtic Sea,h1,may,1,1993,100000000,14.0\n";
        match parse_model_csv_content(content, "test") {
            Err(UnseenError::ParseError { reason, .. }) => assert!(reason.contains("100000000")),
            other => panic!("expected ParseError, got {:?}", other.map(|e| e.values.dim())),
        }

        // 合法天数但格点远多于行数时，在分配数组前即判定不完整
        let sparse = "region,hindcast,startdate,member,year,day,sst\n\
                      Celtic Sea,h1,may,1,1993,1,14.0\n\
                      Celtic Sea,h1,may,1,1993,366,14.0\n";
        match parse_model_csv_content(sparse, "test") {
            Err(UnseenError::ParseError { reason, .. }) => {
                assert!(reason.contains("2 of 366"), "{}", reason)
            }
            other => panic!("expected ParseError, got {:?}", other.map(|e| e.values.dim())),
        }
    }

    #[test]
    fn test_parse_obs_csv_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "region,date,sst\nB,1993-06-02,2.0\nA,1993-06-01,1.0\nA,1993-06-02,1.5\nB,1993-06-01,"
        )
        .unwrap();

        let obs = parse_obs_csv(file.path()).unwrap();
        assert_eq!(obs.regions, vec!["B", "A"]);
        assert_eq!(obs.dates.len(), 2);
        assert_eq!(obs.values[[1, 0]], 1.0);
        assert_eq!(obs.values[[0, 1]], 2.0);
        assert!(obs.values[[0, 0]].is_nan());
    }

    #[test]
    fn test_bad_obs_date() {
        let content = "region,date,sst\nA,1993-13-01,1.0\n";
        assert!(parse_obs_csv_content(content, "test").is_err());
    }
}
