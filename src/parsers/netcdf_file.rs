//! # NetCDF 解析器
//!
//! 读取变量 `sst`，按维度名识别坐标轴（顺序不限）：
//! - 模式：`region, hindcast, startdate, member, year, day`
//! - 观测：`region, time`（CF 时间单位）
//!
//! 坐标标签取自同名坐标变量（字符串或数值），缺失时用序号。
//! `_FillValue` 映射为 NaN。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用（需启用 `netcdf` feature）
//! - 使用 `parsers/cf_time.rs`

use crate::error::{Result, UnseenError};
use crate::models::{HindcastEnsemble, ObsRecord};
use crate::parsers::cf_time::TimeAxis;

use ndarray::{ArrayD, Ix2, Ix6, IxDyn};
use netcdf::{AttributeValue, Variable};
use std::path::Path;

const VARIABLE: &str = "sst";
const MODEL_DIMS: [&str; 6] = ["region", "hindcast", "startdate", "member", "year", "day"];
const OBS_DIMS: [&str; 2] = ["region", "time"];

fn parse_error(path: &Path, reason: impl Into<String>) -> UnseenError {
    UnseenError::ParseError {
        format: "NetCDF".to_string(),
        path: path.display().to_string(),
        reason: reason.into(),
    }
}

fn attribute_f64(value: AttributeValue) -> Option<f64> {
    match value {
        AttributeValue::Double(v) => Some(v),
        AttributeValue::Float(v) => Some(v as f64),
        AttributeValue::Int(v) => Some(v as f64),
        AttributeValue::Short(v) => Some(v as f64),
        AttributeValue::Doubles(v) => v.first().copied(),
        AttributeValue::Floats(v) => v.first().map(|&x| x as f64),
        _ => None,
    }
}

/// 读取 `sst` 并按 `wanted` 顺序重排维度
fn read_cube(file: &netcdf::File, path: &Path, wanted: &[&str]) -> Result<ArrayD<f64>> {
    let var = file
        .variable(VARIABLE)
        .ok_or_else(|| parse_error(path, format!("variable '{}' not found", VARIABLE)))?;

    let names: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
    let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();
    if names.len() != wanted.len() {
        return Err(parse_error(
            path,
            format!("'{}' has dimensions {:?}, expected {:?}", VARIABLE, names, wanted),
        ));
    }
    let axes = wanted
        .iter()
        .map(|w| {
            names
                .iter()
                .position(|n| n == w)
                .ok_or_else(|| parse_error(path, format!("dimension '{}' not found", w)))
        })
        .collect::<Result<Vec<usize>>>()?;

    let fill = var
        .attribute("_FillValue")
        .and_then(|a| a.value().ok())
        .and_then(attribute_f64);

    let mut flat: Vec<f64> = var.get_values::<f64, _>(..)?;
    if let Some(fill) = fill {
        for v in flat.iter_mut().filter(|v| **v == fill) {
            *v = f64::NAN;
        }
    }

    let cube = ArrayD::from_shape_vec(IxDyn(&shape), flat)
        .map_err(|e| parse_error(path, e.to_string()))?;
    Ok(cube.permuted_axes(IxDyn(&axes)).as_standard_layout().to_owned())
}

/// 坐标标签：字符串、数值或序号
fn labels(file: &netcdf::File, name: &str, len: usize) -> Vec<String> {
    let Some(var) = file.variable(name) else {
        return (0..len).map(|i| i.to_string()).collect();
    };
    if let Ok(values) = var.get_values::<f64, _>(..) {
        if values.len() == len {
            return values.iter().map(|v| format_number(*v)).collect();
        }
    }
    let strings: Option<Vec<String>> = (0..len).map(|i| var.get_string([i]).ok()).collect();
    strings.unwrap_or_else(|| (0..len).map(|i| i.to_string()).collect())
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}

fn numeric_coordinate(var: &Variable, path: &Path, name: &str) -> Result<Vec<f64>> {
    var.get_values::<f64, _>(..)
        .map_err(|e| parse_error(path, format!("coordinate '{}': {}", name, e)))
}

/// 读取模式集合 NetCDF 文件
pub fn parse_model_netcdf(path: &Path) -> Result<HindcastEnsemble> {
    let file = netcdf::open(path)?;
    let cube = read_cube(&file, path, &MODEL_DIMS)?;
    let values = cube
        .into_dimensionality::<Ix6>()
        .map_err(|e| parse_error(path, e.to_string()))?;
    let (r, h, sd, m, _, _) = values.dim();

    let years: Vec<i32> = match file.variable("year") {
        Some(var) => numeric_coordinate(&var, path, "year")?
            .into_iter()
            .map(|v| v as i32)
            .collect(),
        None => return Err(parse_error(path, "coordinate variable 'year' not found")),
    };

    HindcastEnsemble::new(
        labels(&file, "region", r),
        labels(&file, "hindcast", h),
        labels(&file, "startdate", sd),
        labels(&file, "member", m),
        years,
        values,
    )
}

/// 读取观测 NetCDF 文件
pub fn parse_obs_netcdf(path: &Path) -> Result<ObsRecord> {
    let file = netcdf::open(path)?;
    let cube = read_cube(&file, path, &OBS_DIMS)?;
    let values = cube
        .into_dimensionality::<Ix2>()
        .map_err(|e| parse_error(path, e.to_string()))?;

    let time = file
        .variable("time")
        .ok_or_else(|| parse_error(path, "coordinate variable 'time' not found"))?;
    let units = match time.attribute("units").and_then(|a| a.value().ok()) {
        Some(AttributeValue::Str(s)) => s,
        _ => return Err(parse_error(path, "'time' has no string 'units' attribute")),
    };
    let axis = TimeAxis::parse(&units)?;
    let dates = axis.decode(&numeric_coordinate(&time, path, "time")?)?;

    ObsRecord::new(labels(&file, "region", values.nrows()), dates, values)
}
