//! # 趋势保真度命令
//!
//! 观测季节平均的线性趋势斜率在随机 realisation 伪时间序列斜率中的排名，
//! 并给出完整观测记录的趋势摘要（斜率、r、p 值分级、末年拟合值）。
//!
//! ## 依赖关系
//! - 使用 `unseen/fidelity.rs`, `unseen/detrend.rs`

use crate::cli::fidelity::TrendArgs;
use crate::commands::context::AnalysisContext;
use crate::commands::fidelity::within_interval;
use crate::error::Result;
use crate::export;
use crate::plot::{self, HistogramPanel, LinePanel, LineSpec, Marker, ScatterSpec};
use crate::unseen::detrend::observed_trends;
use crate::unseen::fidelity::{observed_trend_summary, trend_fidelity, TrendSummary};
use crate::utils::output::{self, fmt_value};
use crate::utils::progress;

use std::path::Path;
use tabled::Tabled;

#[derive(Tabled)]
struct FidelityRow {
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Observed (°C/decade)")]
    observed: String,
    #[tabled(rename = "Model interval (°C/decade)")]
    interval: String,
    #[tabled(rename = "Rank (%)")]
    rank: String,
    #[tabled(rename = "Consistent")]
    consistent: String,
}

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Years")]
    years: String,
    #[tabled(rename = "Slope (°C/decade)")]
    slope: String,
    #[tabled(rename = "r")]
    r: String,
    #[tabled(rename = "p")]
    p: String,
    #[tabled(rename = "Final fit (°C)")]
    final_value: String,
}

/// 执行趋势保真度检验
pub fn execute(args: TrendArgs) -> Result<()> {
    output::print_header("Trend Fidelity");
    let ctx = AnalysisContext::load(&args.data)?;
    let ci = ctx.confidence()?;
    let mut rng = ctx.rng();

    let obs_fits = observed_trends(&ctx.obs_full)?;
    let pb = progress::create_resampling_bar(ctx.iterations(), ctx.regions().len(), "Trends");
    let results = trend_fidelity(&ctx.pooled, &obs_fits, ctx.iterations(), &mut rng, &pb);
    pb.finish_and_clear();
    let results = results?;

    let rows: Vec<FidelityRow> = results
        .iter()
        .map(|res| {
            let (low, high) = ci.interval(&res.slopes);
            let rank = res.percentile_rank();
            FidelityRow {
                region: res.region.clone(),
                observed: fmt_value(res.observed_slope * 10.0, 3),
                interval: format!("{} to {}", fmt_value(low * 10.0, 3), fmt_value(high * 10.0, 3)),
                rank: fmt_value(rank, 1),
                consistent: if within_interval(rank, &ci) { "yes" } else { "no" }.to_string(),
            }
        })
        .collect();
    output::print_info(&format!(
        "{} random-realisation series over {} hindcast years",
        ctx.iterations(),
        ctx.pooled.years.len()
    ));
    output::print_table(&rows);

    let summary = observed_trend_summary(&ctx.obs_full)?;
    output::print_header(&format!("Observed {} mean SST trend", ctx.season));
    let summary_rows: Vec<SummaryRow> = summary
        .iter()
        .map(|s| SummaryRow {
            region: s.region.clone(),
            years: format!(
                "{}-{}",
                s.years.first().copied().unwrap_or_default(),
                s.years.last().copied().unwrap_or_default()
            ),
            slope: fmt_value(s.fit.slope * 10.0, 3),
            r: fmt_value(s.fit.r_value, 3),
            p: s.p_class(),
            final_value: fmt_value(s.final_value, 2),
        })
        .collect();
    output::print_table(&summary_rows);

    let fidelity_path = ctx.output_path(Path::new("fidelity_trend.csv"))?;
    export::trend_fidelity_to_csv(&results, &fidelity_path)?;
    let slopes_path = ctx.output_path(Path::new("fidelity_trend_slopes.csv"))?;
    export::trend_slopes_to_csv(&results, &slopes_path)?;
    let obs_path = ctx.output_path(Path::new("observed_trend.csv"))?;
    export::observed_trends_to_csv(&summary, &obs_path)?;
    output::print_success(&format!(
        "Tables saved to '{}'",
        ctx.config.paths.output_dir.display()
    ));

    if args.no_plot {
        output::print_skip("Figure generation disabled");
    } else {
        let panels: Vec<HistogramPanel> = results
            .iter()
            .enumerate()
            .map(|(r, res)| HistogramPanel {
                title: res.region.clone(),
                x_label: "Trend (°C/decade)".to_string(),
                samples: res.slopes.iter().map(|s| s * 10.0).collect(),
                marker: Some(Marker {
                    value: res.observed_slope * 10.0,
                    label: "observed".to_string(),
                }),
                annotation: Some(format!("rank {:.1}%", res.percentile_rank())),
                color: plot::color(r),
            })
            .collect();
        let grid = plot::grid_for(panels.len());
        let size = (520 * grid.1 as u32, 420 * grid.0 as u32);
        let plot_path = ctx.output_path(&args.plot)?;
        plot::histograms(&panels, grid, &plot_path, size)?;

        let obs_plot_path = ctx.output_path(&args.obs_plot)?;
        let trend_panels: Vec<LinePanel> = summary
            .iter()
            .enumerate()
            .map(|(r, s)| trend_panel(s, r))
            .collect();
        plot::line_panels(&trend_panels, grid, &obs_plot_path, size)?;
        output::print_success(&format!(
            "Figures saved to '{}' and '{}'",
            plot_path.display(),
            obs_plot_path.display()
        ));
    }

    output::print_done("Trend fidelity test complete");
    Ok(())
}

/// 观测季节平均散点与回归线
fn trend_panel(s: &TrendSummary, index: usize) -> LinePanel {
    let x: Vec<f64> = s.years.iter().map(|&y| y as f64).collect();
    let fitted: Vec<f64> = x.iter().map(|&v| s.fit.predict(v)).collect();
    LinePanel {
        title: format!("{} ({})", s.region, s.p_class()),
        x_label: "Year".to_string(),
        y_label: "Seasonal mean SST (°C)".to_string(),
        lines: vec![LineSpec {
            label: format!("{:+.3} °C/decade", s.fit.slope * 10.0),
            x: x.clone(),
            y: fitted,
            band: None,
            color: plot::color(index),
            dashed: false,
        }],
        scatter: vec![ScatterSpec {
            label: "observed".to_string(),
            points: x.into_iter().zip(s.means.iter().copied()).collect(),
            color: plot::color(index),
        }],
        vline: None,
    }
}
