//! # 参数解析辅助
//!
//! 命令行字符串参数的解析：
//! - 年份区间 `1993-2024`（单个年份视为 `Y-Y`）
//! - 逗号分隔的数值列表 `10,20,50,100`
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `regex` crate

use crate::error::{Result, UnseenError};

use regex::Regex;

/// 解析年份区间（闭区间）
pub fn parse_year_range(range: &str) -> Result<(i32, i32)> {
    let re = Regex::new(r"^\s*(\d{4})\s*(?:-\s*(\d{4}))?\s*$")
        .map_err(|e| UnseenError::Other(e.to_string()))?;
    let caps = re
        .captures(range)
        .ok_or_else(|| UnseenError::InvalidRange(range.to_string()))?;

    let start: i32 = caps[1]
        .parse()
        .map_err(|_| UnseenError::InvalidRange(range.to_string()))?;
    let end: i32 = match caps.get(2) {
        Some(m) => m
            .as_str()
            .parse()
            .map_err(|_| UnseenError::InvalidRange(range.to_string()))?,
        None => start,
    };

    if end < start {
        return Err(UnseenError::InvalidRange(range.to_string()));
    }
    Ok((start, end))
}

/// 解析逗号分隔的正数列表
pub fn parse_positive_list(list: &str) -> Result<Vec<f64>> {
    let values = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v > 0.0)
                .ok_or_else(|| {
                    UnseenError::InvalidArgument(format!("'{}' is not a positive number", s))
                })
        })
        .collect::<Result<Vec<f64>>>()?;
    if values.is_empty() {
        return Err(UnseenError::InvalidArgument("empty list".to_string()));
    }
    Ok(values)
}
