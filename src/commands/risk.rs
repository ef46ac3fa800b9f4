//! # risk 命令实现
//!
//! 关注事件在 UNSEEN 分布中的超越概率及其自助置信区间：
//! - `strength`: 事件峰值加增量 (°C) 后的超越概率
//! - `time`: 分布按不同枢轴年份去趋势后的超越概率；
//!   可用模式趋势外推到更晚的年份
//!
//! ## 依赖关系
//! - 使用 `cli/risk.rs` 定义的参数
//! - 使用 `unseen/risk.rs`, `unseen/detrend.rs`

use crate::cli::risk::{RiskArgs, RiskCommands, StrengthArgs, TimeArgs};
use crate::commands::context::AnalysisContext;
use crate::error::{Result, UnseenError};
use crate::export;
use crate::plot::{self, LinePanel, LineSpec};
use crate::unseen::detrend::model_trends;
use crate::unseen::risk::{increments, strength_band, strength_risk, time_band, time_risk, RiskCurve};
use crate::utils::output::{self, fmt_value};
use crate::utils::progress;
use crate::utils::range::parse_year_range;

use chrono::Datelike;
use std::path::Path;
use tabled::Tabled;

/// 执行 risk 命令
pub fn execute(args: RiskArgs) -> Result<()> {
    match args.command {
        RiskCommands::Strength(a) => execute_strength(a),
        RiskCommands::Time(a) => execute_time(a),
    }
}

#[derive(Tabled)]
struct RiskRow {
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "At")]
    at: String,
    #[tabled(rename = "Exceedance (%)")]
    probability: String,
    #[tabled(rename = "Interval (%)")]
    interval: String,
}

/// 每条曲线取至多 `max_rows` 个均匀分布的点
fn curve_rows(curve: &RiskCurve, max_rows: usize, at: impl Fn(f64) -> String) -> Vec<RiskRow> {
    let n = curve.x.len();
    let stride = n.div_ceil(max_rows.max(1)).max(1);
    (0..n)
        .filter(|&i| i % stride == 0 || i + 1 == n)
        .map(|i| RiskRow {
            region: curve.region.clone(),
            at: at(curve.x[i]),
            probability: fmt_value(curve.probability[i], 2),
            interval: match &curve.band {
                Some(b) => format!("{} to {}", fmt_value(b.low[i], 2), fmt_value(b.high[i], 2)),
                None => "-".to_string(),
            },
        })
        .collect()
}

fn attach_bands(curves: &mut [RiskCurve], bands: Vec<crate::stats::Band>) {
    for (curve, band) in curves.iter_mut().zip(bands) {
        curve.band = Some(band);
    }
}

fn plot_size(grid: (usize, usize)) -> (u32, u32) {
    (520 * grid.1 as u32, 420 * grid.0 as u32)
}

// ─────────────────────────────────────────────────────────────
// 强度
// ─────────────────────────────────────────────────────────────

fn execute_strength(args: StrengthArgs) -> Result<()> {
    output::print_header("Risk vs Event Strength");
    let ctx = AnalysisContext::load(&args.data)?;
    let ci = ctx.confidence()?;
    let mut rng = ctx.rng();
    let incs = increments(args.max_increment, args.step)?;
    let peaks = &ctx.focus.peaks;

    let mut curves = strength_risk(&ctx.distribution, peaks, &incs)?;
    let pb = progress::create_resampling_bar(ctx.iterations(), ctx.regions().len(), "Strength band");
    let bands = strength_band(
        &ctx.distribution,
        peaks,
        &incs,
        ctx.iterations(),
        &ci,
        &mut rng,
        &pb,
    );
    pb.finish_and_clear();
    attach_bands(&mut curves, bands?);

    output::print_info(&format!(
        "{} + 0 to {:.1} °C, {:.0}% bootstrap interval ({} iterations)",
        ctx.focus.label,
        args.max_increment,
        ci.level_percent(),
        ctx.iterations()
    ));
    let rows: Vec<RiskRow> = curves
        .iter()
        .flat_map(|c| curve_rows(c, 5, |x| format!("+{:.2} °C", x)))
        .collect();
    output::print_table(&rows);

    let csv_path = ctx.output_path(Path::new("risk_strength.csv"))?;
    export::strength_risk_to_csv(&curves, &csv_path)?;
    output::print_success(&format!("Curves saved to '{}'", csv_path.display()));

    if args.no_plot {
        output::print_skip("Figure generation disabled");
    } else {
        let panels: Vec<LinePanel> = curves
            .iter()
            .enumerate()
            .map(|(r, c)| LinePanel {
                title: c.region.clone(),
                x_label: format!("Increment above {} (°C)", ctx.focus.label),
                y_label: "Exceedance probability (%)".to_string(),
                lines: vec![line_spec(c, "", r, false)],
                ..Default::default()
            })
            .collect();
        let grid = plot::grid_for(panels.len());
        let plot_path = ctx.output_path(&args.plot)?;
        plot::line_panels(&panels, grid, &plot_path, plot_size(grid))?;
        output::print_success(&format!("Figure saved to '{}'", plot_path.display()));
    }

    output::print_done("Strength risk complete");
    Ok(())
}

fn line_spec(curve: &RiskCurve, label: &str, index: usize, dashed: bool) -> LineSpec {
    LineSpec {
        label: label.to_string(),
        x: curve.x.clone(),
        y: curve.probability.clone(),
        band: curve.band.as_ref().map(|b| (b.low.clone(), b.high.clone())),
        color: plot::color(index),
        dashed,
    }
}

// ─────────────────────────────────────────────────────────────
// 时间
// ─────────────────────────────────────────────────────────────

/// 核心枢轴年份：指定区间，或从首个回报年份到配置的枢轴年份
fn core_pivots(range: Option<&str>, first_year: i32, pivot_year: i32) -> Result<Vec<i32>> {
    let (from, to) = match range {
        Some(r) => parse_year_range(r)?,
        None => (first_year.min(pivot_year), pivot_year.max(first_year)),
    };
    Ok((from..=to).collect())
}

/// 外推年份：核心区间之后到 `to`
fn extrapolated_pivots(core: &[i32], to: Option<i32>) -> Result<Vec<i32>> {
    let (Some(to), Some(&last)) = (to, core.last()) else {
        return Ok(Vec::new());
    };
    if to <= last {
        return Err(UnseenError::InvalidArgument(format!(
            "--extrapolate-to {} must be after the last pivot year {}",
            to, last
        )));
    }
    Ok((last + 1..=to).collect())
}

fn execute_time(args: TimeArgs) -> Result<()> {
    output::print_header("Risk vs Climate Year");
    let ctx = AnalysisContext::load(&args.data)?;
    let ci = ctx.confidence()?;
    let mut rng = ctx.rng();
    let peaks = &ctx.focus.peaks;

    let first_year = ctx.pooled.years.first().copied().unwrap_or_default();
    let core = core_pivots(
        args.pivot_years.as_deref(),
        first_year,
        ctx.config.analysis.pivot_year,
    )?;
    let extra = extrapolated_pivots(&core, args.extrapolate_to)?;

    let fits = ctx.trends()?;
    let mut curves = time_risk(&ctx.field, &fits, peaks, &core)?;
    let n_steps = if extra.is_empty() { 1 } else { 2 };
    let pb = progress::create_resampling_bar(
        ctx.iterations() * n_steps,
        ctx.regions().len(),
        "Pivot-year band",
    );
    let bands = time_band(
        &ctx.field,
        &fits,
        peaks,
        &core,
        ctx.iterations(),
        &ci,
        &mut rng,
        &pb,
    );

    // 外推段总是使用模式趋势
    let extrapolated = if extra.is_empty() {
        Ok(Vec::new())
    } else {
        model_trends(&ctx.pooled).and_then(|model_fits| {
            let mut ext = time_risk(&ctx.field, &model_fits, peaks, &extra)?;
            let ext_bands = time_band(
                &ctx.field,
                &model_fits,
                peaks,
                &extra,
                ctx.iterations(),
                &ci,
                &mut rng,
                &pb,
            )?;
            attach_bands(&mut ext, ext_bands);
            Ok(ext)
        })
    };
    pb.finish_and_clear();
    attach_bands(&mut curves, bands?);
    let extrapolated = extrapolated?;

    output::print_info(&format!(
        "{} against pivot years {}-{} ({} trend){}",
        ctx.focus.label,
        core.first().copied().unwrap_or_default(),
        core.last().copied().unwrap_or_default(),
        ctx.config.analysis.trend_source,
        match extra.last() {
            Some(y) => format!(", extrapolated to {} with model trend", y),
            None => String::new(),
        }
    ));
    let rows: Vec<RiskRow> = curves
        .iter()
        .chain(&extrapolated)
        .flat_map(|c| curve_rows(c, 4, |x| format!("{}", x as i32)))
        .collect();
    output::print_table(&rows);

    let csv_path = ctx.output_path(Path::new("risk_time.csv"))?;
    export::time_risk_to_csv(
        &[("core", &curves[..]), ("extrapolated", &extrapolated[..])],
        &csv_path,
    )?;
    output::print_success(&format!("Curves saved to '{}'", csv_path.display()));

    if args.no_plot {
        output::print_skip("Figure generation disabled");
    } else {
        let event_year = ctx.config.event.start.year() as f64;
        let panels: Vec<LinePanel> = curves
            .iter()
            .enumerate()
            .map(|(r, c)| {
                let mut lines = vec![line_spec(c, "", r, false)];
                if let Some(ext) = extrapolated.get(r) {
                    lines.push(line_spec(ext, "model trend", r, true));
                }
                LinePanel {
                    title: c.region.clone(),
                    x_label: "Pivot year".to_string(),
                    y_label: "Exceedance probability (%)".to_string(),
                    lines,
                    scatter: Vec::new(),
                    vline: Some(event_year),
                }
            })
            .collect();
        let grid = plot::grid_for(panels.len());
        let plot_path = ctx.output_path(&args.plot)?;
        plot::line_panels(&panels, grid, &plot_path, plot_size(grid))?;
        output::print_success(&format!("Figure saved to '{}'", plot_path.display()));
    }

    output::print_done("Time risk complete");
    Ok(())
}
