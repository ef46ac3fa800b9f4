//! # 直方图
//!
//! 每个面板一个区域：样本直方图、可选竖直标记线（如关注事件强度）与注释文字。

use crate::error::Result;
use crate::plot::{padded_range, plot_err, use_svg};

use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

const N_BINS: usize = 30;

/// 竖直标记线
#[derive(Debug, Clone)]
pub struct Marker {
    pub value: f64,
    pub label: String,
}

/// 单个直方图面板
#[derive(Debug, Clone)]
pub struct HistogramPanel {
    pub title: String,
    pub x_label: String,
    pub samples: Vec<f64>,
    pub marker: Option<Marker>,
    /// 左上角注释（如百分位排名）
    pub annotation: Option<String>,
    pub color: RGBColor,
}

/// 等宽分箱：(左边界, 右边界, 占比 %)
pub fn histogram_bins(samples: &[f64], lo: f64, hi: f64, n_bins: usize) -> Vec<(f64, f64, f64)> {
    let finite: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
    if n_bins == 0 || finite.is_empty() || hi <= lo {
        return Vec::new();
    }
    let width = (hi - lo) / n_bins as f64;
    let mut counts = vec![0usize; n_bins];
    for v in &finite {
        let k = (((v - lo) / width).floor().max(0.0) as usize).min(n_bins - 1);
        counts[k] += 1;
    }
    let total = finite.len() as f64;
    counts
        .iter()
        .enumerate()
        .map(|(k, &c)| {
            let left = lo + k as f64 * width;
            (left, left + width, 100.0 * c as f64 / total)
        })
        .collect()
}

/// 生成多面板直方图
pub fn histograms(
    panels: &[HistogramPanel],
    grid: (usize, usize),
    output_path: &Path,
    size: (u32, u32),
) -> Result<()> {
    if use_svg(output_path) {
        let root = SVGBackend::new(output_path, size).into_drawing_area();
        draw_panels(&root, panels, grid)?;
        root.present().map_err(plot_err)?;
    } else {
        let root = BitMapBackend::new(output_path, size).into_drawing_area();
        draw_panels(&root, panels, grid)?;
        root.present().map_err(plot_err)?;
    }
    Ok(())
}

fn draw_panels<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    panels: &[HistogramPanel],
    grid: (usize, usize),
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(plot_err)?;
    for (area, panel) in root.split_evenly(grid).iter().zip(panels) {
        draw_histogram(area, panel)?;
    }
    Ok(())
}

fn draw_histogram<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &HistogramPanel,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let marker_value = panel.marker.as_ref().map(|m| m.value);
    let Some((x_min, x_max)) = padded_range(panel.samples.iter().chain(marker_value.iter())) else {
        return Ok(());
    };

    let bins = histogram_bins(&panel.samples, x_min, x_max, N_BINS);
    let y_max = bins.iter().map(|b| b.2).fold(0.0, f64::max).max(1.0) * 1.15;

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, ("sans-serif", 20).into_font())
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(x_min..x_max, 0.0..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(panel.x_label.as_str())
        .y_desc("Frequency (%)")
        .x_label_style(("sans-serif", 13))
        .y_label_style(("sans-serif", 13))
        .axis_desc_style(("sans-serif", 14))
        .draw()
        .map_err(plot_err)?;

    let fill = panel.color.mix(0.6).filled();
    chart
        .draw_series(
            bins.iter()
                .map(|&(l, r, h)| Rectangle::new([(l, 0.0), (r, h)], fill)),
        )
        .map_err(plot_err)?;

    if let Some(marker) = &panel.marker {
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(marker.value, 0.0), (marker.value, y_max * 0.92)],
                BLACK.stroke_width(2),
            )))
            .map_err(plot_err)?;
        chart
            .draw_series(std::iter::once(Text::new(
                marker.label.clone(),
                (marker.value, y_max * 0.95),
                ("sans-serif", 12).into_font().color(&BLACK),
            )))
            .map_err(plot_err)?;
    }

    if let Some(note) = &panel.annotation {
        chart
            .draw_series(std::iter::once(Text::new(
                note.clone(),
                (x_min + (x_max - x_min) * 0.03, y_max * 0.97),
                ("sans-serif", 13).into_font().color(&BLACK),
            )))
            .map_err(plot_err)?;
    }

    Ok(())
}
