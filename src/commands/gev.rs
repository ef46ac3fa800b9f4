//! # gev 命令实现
//!
//! 对每个区域的 UNSEEN 样本拟合广义极值分布：
//! 1. 参数估计（L-moments 或最大似然）与 KS 拟合优度
//! 2. 重现水平及自助法置信区间
//! 3. 关注事件与观测纪录的重现期
//!
//! ## 依赖关系
//! - 使用 `cli/gev.rs` 定义的参数
//! - 使用 `unseen/extremes.rs`

use crate::cli::gev::GevArgs;
use crate::commands::context::AnalysisContext;
use crate::error::Result;
use crate::export;
use crate::plot::{self, LinePanel, LineSpec, ScatterSpec};
use crate::stats::descriptive::nanmax;
use crate::stats::FitMethod;
use crate::unseen::extremes::{
    bootstrap_return_levels, event_return_period, fit_regions, record_return_period,
    return_levels, GevBootstrap, RegionGev,
};
use crate::utils::output::{self, fmt_value};
use crate::utils::progress;
use crate::utils::range::{parse_positive_list, parse_year_range};

use std::path::Path;
use tabled::Tabled;

#[derive(Tabled)]
struct ParamRow {
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Years")]
    years: String,
    #[tabled(rename = "N")]
    n: usize,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Scale")]
    scale: String,
    #[tabled(rename = "Shape")]
    shape: String,
    #[tabled(rename = "KS D")]
    ks: String,
}

#[derive(Tabled)]
struct LevelRow {
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Period (yr)")]
    period: String,
    #[tabled(rename = "Return level (°C)")]
    level: String,
    #[tabled(rename = "Interval (°C)")]
    interval: String,
}

#[derive(Tabled)]
struct PeriodRow {
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Event (°C)")]
    event: String,
    #[tabled(rename = "Event period (yr)")]
    event_period: String,
    #[tabled(rename = "Interval (yr)")]
    interval: String,
    #[tabled(rename = "Obs record (°C)")]
    record: String,
    #[tabled(rename = "Record period (yr)")]
    record_period: String,
}

/// 执行 gev 命令
pub fn execute(args: GevArgs) -> Result<()> {
    output::print_header("GEV Return Levels");
    let periods = parse_positive_list(&args.periods)?;
    let years = args.years.as_deref().map(parse_year_range).transpose()?;
    let method: FitMethod = args.method.into();

    let ctx = AnalysisContext::load(&args.data)?;
    let fits = fit_regions(&ctx.distribution, method, years)?;
    output::print_info(&format!("Fitted {} region(s) with {}", fits.len(), method));

    let boots = if args.no_bootstrap {
        output::print_skip("Bootstrap intervals disabled");
        vec![None; fits.len()]
    } else {
        bootstrap_all(&ctx, &fits, method, &periods)?
    };

    print_parameters(&fits);
    output::print_separator();
    print_levels(&fits, &boots, &periods);
    output::print_separator();
    print_periods(&ctx, &fits, &boots);

    let csv_path = ctx.output_path(Path::new("gev_return_levels.csv"))?;
    let rows: Vec<(RegionGev, Option<GevBootstrap>)> =
        fits.iter().cloned().zip(boots.iter().cloned()).collect();
    export::gev_to_csv(&rows, &periods, &csv_path)?;
    output::print_success(&format!("Return levels saved to '{}'", csv_path.display()));

    if args.no_plot {
        output::print_skip("Figure generation disabled");
    } else {
        let panels: Vec<LinePanel> = fits
            .iter()
            .zip(&boots)
            .enumerate()
            .map(|(r, (fit, boot))| return_level_panel(&ctx, r, fit, boot.as_ref(), &periods))
            .collect();
        let grid = plot::grid_for(panels.len());
        let plot_path = ctx.output_path(&args.plot)?;
        plot::line_panels(
            &panels,
            grid,
            &plot_path,
            (520 * grid.1 as u32, 420 * grid.0 as u32),
        )?;
        output::print_success(&format!("Figure saved to '{}'", plot_path.display()));
    }

    output::print_done("GEV analysis complete");
    Ok(())
}

fn bootstrap_all(
    ctx: &AnalysisContext,
    fits: &[RegionGev],
    method: FitMethod,
    periods: &[f64],
) -> Result<Vec<Option<GevBootstrap>>> {
    let ci = ctx.confidence()?;
    let mut rng = ctx.rng();
    let pb = progress::create_resampling_bar(ctx.iterations(), fits.len(), "GEV bootstrap");
    let mut boots = Vec::with_capacity(fits.len());
    for (r, fit) in fits.iter().enumerate() {
        let boot = bootstrap_return_levels(
            &fit.samples,
            method,
            periods,
            ctx.focus.peaks[r],
            ctx.iterations(),
            &ci,
            &mut rng,
            &pb,
        );
        match boot {
            Ok(b) => {
                if b.successful < ctx.iterations() {
                    pb.suspend(|| {
                        output::print_warning(&format!(
                            "{}: {} of {} bootstrap refits failed and were skipped",
                            fit.region,
                            ctx.iterations() - b.successful,
                            ctx.iterations()
                        ))
                    });
                }
                boots.push(Some(b));
            }
            Err(e) => {
                pb.suspend(|| output::print_warning(&format!("{}: {}", fit.region, e)));
                boots.push(None);
            }
        }
    }
    pb.finish_and_clear();
    Ok(boots)
}

fn years_label(fit: &RegionGev) -> String {
    match fit.years {
        Some((from, to)) => format!("{}-{}", from, to),
        None => "all".to_string(),
    }
}

fn print_parameters(fits: &[RegionGev]) {
    let rows: Vec<ParamRow> = fits
        .iter()
        .map(|fit| {
            let p = fit.params();
            ParamRow {
                region: fit.region.clone(),
                years: years_label(fit),
                n: fit.fit.n,
                location: fmt_value(p.location, 3),
                scale: fmt_value(p.scale, 3),
                shape: fmt_value(p.shape, 3),
                ks: fmt_value(fit.fit.ks_statistic, 3),
            }
        })
        .collect();
    output::print_table(&rows);
}

fn print_levels(fits: &[RegionGev], boots: &[Option<GevBootstrap>], periods: &[f64]) {
    let rows: Vec<LevelRow> = fits
        .iter()
        .zip(boots)
        .flat_map(|(fit, boot)| {
            return_levels(fit.params(), periods)
                .into_iter()
                .enumerate()
                .map(move |(k, level)| LevelRow {
                    region: fit.region.clone(),
                    period: format!("{}", periods[k]),
                    level: fmt_value(level, 2),
                    interval: match boot {
                        Some(b) => format!(
                            "{} to {}",
                            fmt_value(b.levels.low[k], 2),
                            fmt_value(b.levels.high[k], 2)
                        ),
                        None => "-".to_string(),
                    },
                })
        })
        .collect();
    output::print_table(&rows);
}

fn print_periods(ctx: &AnalysisContext, fits: &[RegionGev], boots: &[Option<GevBootstrap>]) {
    let rows: Vec<PeriodRow> = fits
        .iter()
        .zip(boots)
        .enumerate()
        .map(|(r, (fit, boot))| {
            let obs = ctx.obs_nmax.row(r).to_vec();
            let record = nanmax(&obs);
            PeriodRow {
                region: fit.region.clone(),
                event: fmt_value(ctx.focus.peaks[r], 2),
                event_period: fmt_value(event_return_period(fit.params(), ctx.focus.peaks[r]), 1),
                interval: match boot {
                    Some(b) => format!(
                        "{} to {}",
                        fmt_value(b.event_period.0, 1),
                        fmt_value(b.event_period.1, 1)
                    ),
                    None => "-".to_string(),
                },
                record: fmt_value(record, 2),
                record_period: fmt_value(record_return_period(fit.params(), &obs), 1),
            }
        })
        .collect();
    output::print_info(&format!("Return periods of {}", ctx.focus.label));
    output::print_table(&rows);
}

/// Weibull 经验重现期：降序第 i 个样本对应 `(n + 1) / i`
fn empirical_points(samples: &[f64]) -> Vec<(f64, f64)> {
    let mut sorted: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| b.total_cmp(a));
    let n = sorted.len() as f64;
    sorted
        .into_iter()
        .enumerate()
        .map(|(i, v)| (((n + 1.0) / (i as f64 + 1.0)).log10(), v))
        .collect()
}

/// 1.1 年到 `max_period` 的对数等距重现期
fn period_grid(max_period: f64) -> Vec<f64> {
    let (lo, hi) = (1.1f64.log10(), max_period.max(10.0).log10());
    (0..=60).map(|i| 10f64.powf(lo + (hi - lo) * i as f64 / 60.0)).collect()
}

fn return_level_panel(
    ctx: &AnalysisContext,
    r: usize,
    fit: &RegionGev,
    boot: Option<&GevBootstrap>,
    periods: &[f64],
) -> LinePanel {
    let params = fit.params();
    let max_period = periods.iter().copied().fold(f64::NAN, f64::max);
    let grid = period_grid(max_period);
    let color = plot::color(r);

    let mut lines = vec![LineSpec {
        label: format!("GEV ({})", fit.fit.method),
        x: grid.iter().map(|t| t.log10()).collect(),
        y: return_levels(params, &grid),
        band: None,
        color,
        dashed: false,
    }];
    if let Some(b) = boot {
        lines.push(LineSpec {
            label: format!("{:.0}% interval", ctx.config.bootstrap.confidence * 100.0),
            x: periods.iter().map(|t| t.log10()).collect(),
            y: return_levels(params, periods),
            band: Some((b.levels.low.clone(), b.levels.high.clone())),
            color,
            dashed: true,
        });
    }

    let peak = ctx.focus.peaks[r];
    let event_period = event_return_period(params, peak);
    let mut scatter = vec![ScatterSpec {
        label: "UNSEEN samples".to_string(),
        points: empirical_points(&fit.samples),
        color: plot::color(r + 1),
    }];
    if event_period.is_finite() {
        scatter.push(ScatterSpec {
            label: ctx.focus.label.clone(),
            points: vec![(event_period.log10(), peak)],
            color: plotters::style::RGBColor(0, 0, 0),
        });
    }

    LinePanel {
        title: fit.region.clone(),
        x_label: "log10 return period (yr)".to_string(),
        y_label: format!("{}-day max anomaly (°C)", ctx.window()),
        lines,
        scatter,
        vline: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::gev::GevMethod;
    use crate::commands::context::tests::write_fixture;
    use tempfile::tempdir;

    #[test]
    fn test_empirical_points() {
        let pts = empirical_points(&[1.0, f64::NAN, 3.0, 2.0]);
        assert_eq!(pts.len(), 3);
        assert_eq!(pts[0].1, 3.0);
        assert!((pts[0].0 - 4f64.log10()).abs() < 1e-12);
        assert!((pts[2].0 - (4.0f64 / 3.0).log10()).abs() < 1e-12);
    }

    #[test]
    fn test_period_grid() {
        let grid = period_grid(100.0);
        assert!((grid[0] - 1.1).abs() < 1e-9);
        assert!((grid[grid.len() - 1] - 100.0).abs() < 1e-6);
        assert!(grid.windows(2).all(|w| w[1] > w[0]));
        assert!((period_grid(f64::NAN).last().copied().unwrap() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_gev_command_writes_return_levels() {
        let dir = tempdir().unwrap();
        let data = write_fixture(&dir);
        let out = data.output_dir.clone().unwrap();
        execute(GevArgs {
            data,
            method: GevMethod::Lmoments,
            periods: "10,100".to_string(),
            years: None,
            no_bootstrap: false,
            plot: "gev.svg".into(),
            no_plot: true,
        })
        .unwrap();

        let mut rdr = csv::Reader::from_path(out.join("gev_return_levels.csv")).unwrap();
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 4);
        let level = |i: usize| rows[i][5].parse::<f64>().unwrap();
        assert!(level(1) >= level(0));
    }
}
