//! # 图表模块
//!
//! 使用 `plotters` 生成多面板图：
//! - `histogram`: UNSEEN 分布直方图（可带事件标记线）
//! - `lines`: 折线 + 置信带 + 散点（风险曲线、趋势）
//!
//! 输出格式由扩展名决定：`.svg` 使用 SVGBackend，其余使用 BitMapBackend (PNG)。
//!
//! ## 依赖关系
//! - 被 `commands/` 调用

pub mod histogram;
pub mod lines;

pub use histogram::{histograms, HistogramPanel, Marker};
pub use lines::{line_panels, LinePanel, LineSpec, ScatterSpec};

use crate::error::UnseenError;

use plotters::style::RGBColor;
use std::path::Path;

/// 区域配色
pub const PALETTE: [RGBColor; 6] = [
    RGBColor(0, 102, 204),
    RGBColor(214, 39, 40),
    RGBColor(44, 160, 44),
    RGBColor(255, 127, 14),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
];

/// 第 i 个颜色（循环使用）
pub fn color(i: usize) -> RGBColor {
    PALETTE[i % PALETTE.len()]
}

/// 是否输出 SVG
pub fn use_svg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("svg"))
        .unwrap_or(false)
}

/// 面板布局：面板数 n 时的 (行, 列)
pub fn grid_for(n: usize) -> (usize, usize) {
    match n {
        0 | 1 => (1, 1),
        2 => (1, 2),
        3 => (1, 3),
        4 => (2, 2),
        _ => ((n + 2) / 3, 3),
    }
}

pub(crate) fn plot_err<E: std::fmt::Debug>(e: E) -> UnseenError {
    UnseenError::PlotError(format!("{:?}", e))
}

/// 有限值的范围，两侧各留 5% 余量
pub(crate) fn padded_range<'a>(values: impl IntoIterator<Item = &'a f64>) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if lo > hi {
        return None;
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { 0.5 };
    Some((lo - pad, hi + pad))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_use_svg() {
        assert!(use_svg(Path::new("out/risk.SVG")));
        assert!(!use_svg(Path::new("out/risk.png")));
        assert!(!use_svg(Path::new("out/risk")));
    }

    #[test]
    fn test_grid_for() {
        assert_eq!(grid_for(3), (1, 3));
        assert_eq!(grid_for(4), (2, 2));
        assert_eq!(grid_for(7), (3, 3));
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range(&[f64::NAN]), None);
        let (lo, hi) = padded_range(&[0.0, 10.0, f64::INFINITY]).unwrap();
        assert!((lo + 0.5).abs() < 1e-12 && (hi - 10.5).abs() < 1e-12);
        assert_eq!(padded_range(&[2.0]), Some((1.5, 2.5)));
    }
}
