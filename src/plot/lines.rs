//! # 折线图
//!
//! 每个面板可包含多条折线（可带置信带）、散点序列和一条竖直参考线。
//! 用于超越概率曲线（强度 / 枢轴年份）与季节平均趋势图。

use crate::error::Result;
use crate::plot::{padded_range, plot_err, use_svg};

use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

/// 折线（可带置信带）
#[derive(Debug, Clone)]
pub struct LineSpec {
    pub label: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// (下界, 上界)，与 x 等长
    pub band: Option<(Vec<f64>, Vec<f64>)>,
    pub color: RGBColor,
    pub dashed: bool,
}

/// 散点
#[derive(Debug, Clone)]
pub struct ScatterSpec {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub color: RGBColor,
}

/// 单个折线面板
#[derive(Debug, Clone, Default)]
pub struct LinePanel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub lines: Vec<LineSpec>,
    pub scatter: Vec<ScatterSpec>,
    pub vline: Option<f64>,
}

impl LinePanel {
    fn ranges(&self) -> Option<((f64, f64), (f64, f64))> {
        let xs = self
            .lines
            .iter()
            .flat_map(|l| l.x.iter())
            .chain(self.scatter.iter().flat_map(|s| s.points.iter().map(|p| &p.0)))
            .chain(self.vline.iter());
        let ys = self
            .lines
            .iter()
            .flat_map(|l| {
                let band = l.band.iter().flat_map(|(lo, hi)| lo.iter().chain(hi.iter()));
                l.y.iter().chain(band)
            })
            .chain(self.scatter.iter().flat_map(|s| s.points.iter().map(|p| &p.1)));
        Some((padded_range(xs)?, padded_range(ys)?))
    }
}

/// 生成多面板折线图
pub fn line_panels(
    panels: &[LinePanel],
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
    panels: &[LinePanel],
    grid: (usize, usize),
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).map_err(plot_err)?;
    for (area, panel) in root.split_evenly(grid).iter().zip(panels) {
        draw_panel(area, panel)?;
    }
    Ok(())
}

/// 跳过非有限点
fn finite_points(x: &[f64], y: &[f64]) -> Vec<(f64, f64)> {
    x.iter()
        .zip(y)
        .filter(|(a, b)| a.is_finite() && b.is_finite())
        .map(|(a, b)| (*a, *b))
        .collect()
}

fn draw_panel<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, panel: &LinePanel) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let Some(((x_min, x_max), (y_min, y_max))) = panel.ranges() else {
        return Ok(());
    };

    let mut chart = ChartBuilder::on(area)
        .caption(&panel.title, ("sans-serif", 20).into_font())
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(55)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .x_desc(panel.x_label.as_str())
        .y_desc(panel.y_label.as_str())
        .x_label_style(("sans-serif", 13))
        .y_label_style(("sans-serif", 13))
        .axis_desc_style(("sans-serif", 14))
        .draw()
        .map_err(plot_err)?;

    // 先画置信带，避免遮挡折线
    for line in &panel.lines {
        if let Some((low, high)) = &line.band {
            let mut polygon = finite_points(&line.x, low);
            let mut upper = finite_points(&line.x, high);
            upper.reverse();
            polygon.extend(upper);
            chart
                .draw_series(std::iter::once(Polygon::new(
                    polygon,
                    line.color.mix(0.2).filled(),
                )))
                .map_err(plot_err)?;
        }
    }

    let mut has_legend = false;
    for line in &panel.lines {
        let points = finite_points(&line.x, &line.y);
        let color = line.color;
        let style = color.stroke_width(2);
        let series = if line.dashed {
            chart
                .draw_series(DashedLineSeries::new(points, 6, 4, style))
                .map_err(plot_err)?
        } else {
            chart
                .draw_series(LineSeries::new(points, style))
                .map_err(plot_err)?
        };
        if !line.label.is_empty() {
            series
                .label(line.label.clone())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
            has_legend = true;
        }
    }

    for scatter in &panel.scatter {
        let color = scatter.color;
        let series = chart
            .draw_series(
                scatter
                    .points
                    .iter()
                    .filter(|(x, y)| x.is_finite() && y.is_finite())
                    .map(|&p| Circle::new(p, 3, color.filled())),
            )
            .map_err(plot_err)?;
        if !scatter.label.is_empty() {
            series
                .label(scatter.label.clone())
                .legend(move |(x, y)| Circle::new((x + 10, y), 3, color.filled()));
            has_legend = true;
        }
    }

    if let Some(x) = panel.vline {
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(x, y_min), (x, y_max)],
                BLACK.mix(0.6).stroke_width(1),
            )))
            .map_err(plot_err)?;
    }

    if has_legend {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font(("sans-serif", 12))
            .draw()
            .map_err(plot_err)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finite_points() {
        let pts = finite_points(&[1.0, 2.0, 3.0], &[f64::NAN, 5.0, f64::INFINITY]);
        assert_eq!(pts, vec![(2.0, 5.0)]);
    }

    #[test]
    fn test_panel_ranges_include_band_and_vline() {
        let panel = LinePanel {
            lines: vec![LineSpec {
                label: "Celtic Sea".to_string(),
                x: vec![0.0, 1.0],
                y: vec![5.0, 6.0],
                band: Some((vec![4.0, 5.0], vec![6.0, 9.0])),
                color: RGBColor(0, 0, 0),
                dashed: false,
            }],
            vline: Some(3.0),
            ..Default::default()
        };
        let ((x0, x1), (y0, y1)) = panel.ranges().unwrap();
        assert!(x0 < 0.0 && x1 > 3.0);
        assert!(y0 < 4.0 && y1 > 9.0);

        assert!(LinePanel::default().ranges().is_none());
    }
}
