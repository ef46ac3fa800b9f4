//! # 矩保真度命令
//!
//! 观测 NMAX 的均值、标准差、偏度、峰度在模式伪时间序列统计量中的排名。
//! 排名落在置信区间外时，模式在该统计量上与观测不一致。
//!
//! ## 依赖关系
//! - 使用 `unseen/fidelity.rs`

use crate::cli::fidelity::MomentsArgs;
use crate::commands::context::AnalysisContext;
use crate::commands::fidelity::within_interval;
use crate::error::Result;
use crate::export;
use crate::plot::{self, HistogramPanel, Marker};
use crate::stats::descriptive::{quantile, MomentKind};
use crate::unseen::fidelity::moment_fidelity;
use crate::utils::output::{self, fmt_value};
use crate::utils::progress;

use std::path::Path;
use tabled::Tabled;

#[derive(Tabled)]
struct MomentRow {
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Statistic")]
    statistic: String,
    #[tabled(rename = "Observed")]
    observed: String,
    #[tabled(rename = "Model median")]
    median: String,
    #[tabled(rename = "Model interval")]
    interval: String,
    #[tabled(rename = "Rank (%)")]
    rank: String,
    #[tabled(rename = "Consistent")]
    consistent: String,
}

/// 执行矩保真度检验
pub fn execute(args: MomentsArgs) -> Result<()> {
    output::print_header("Moment Fidelity");
    let ctx = AnalysisContext::load(&args.data)?;
    let ci = ctx.confidence()?;
    let mut rng = ctx.rng();

    let pb = progress::create_resampling_bar(ctx.iterations(), ctx.regions().len(), "Moments");
    let results = moment_fidelity(
        &ctx.distribution,
        &ctx.obs_nmax,
        ctx.iterations(),
        &mut rng,
        &pb,
    );
    pb.finish_and_clear();
    let results = results?;

    let mut rows = Vec::new();
    let mut inconsistent = 0;
    for res in &results {
        for kind in MomentKind::ALL {
            let values = res.model_values(kind);
            let (low, high) = ci.interval(&values);
            let rank = res.percentile_rank(kind);
            let ok = within_interval(rank, &ci);
            if !ok {
                inconsistent += 1;
            }
            rows.push(MomentRow {
                region: res.region.clone(),
                statistic: kind.label().to_string(),
                observed: fmt_value(res.observed.get(kind), 3),
                median: fmt_value(quantile(&values, 0.5), 3),
                interval: format!("{} to {}", fmt_value(low, 3), fmt_value(high, 3)),
                rank: fmt_value(rank, 1),
                consistent: if ok { "yes" } else { "no" }.to_string(),
            });
        }
    }

    output::print_info(&format!(
        "{} pseudo-timeseries of {} years per region, {:.0}% interval",
        ctx.iterations(),
        results.first().map(|r| r.n_years).unwrap_or_default(),
        ci.level_percent()
    ));
    output::print_table(&rows);
    if inconsistent > 0 {
        output::print_warning(&format!(
            "{} statistic(s) fall outside the model interval",
            inconsistent
        ));
    }

    let summary_path = ctx.output_path(Path::new("fidelity_moments.csv"))?;
    export::moment_fidelity_to_csv(&results, &summary_path)?;
    let samples_path = ctx.output_path(Path::new("fidelity_moments_samples.csv"))?;
    export::model_moments_to_csv(&results, &samples_path)?;
    output::print_success(&format!(
        "Tables saved to '{}' and '{}'",
        summary_path.display(),
        samples_path.display()
    ));

    if args.no_plot {
        output::print_skip("Figure generation disabled");
    } else {
        let mut panels = Vec::new();
        for (r, res) in results.iter().enumerate() {
            for kind in MomentKind::ALL {
                panels.push(HistogramPanel {
                    title: format!("{}: {}", res.region, kind.label()),
                    x_label: kind.label().to_string(),
                    samples: res.model_values(kind),
                    marker: Some(Marker {
                        value: res.observed.get(kind),
                        label: "observed".to_string(),
                    }),
                    annotation: Some(format!("rank {:.1}%", res.percentile_rank(kind))),
                    color: plot::color(r),
                });
            }
        }
        let grid = (results.len().max(1), MomentKind::ALL.len());
        let size = (360 * grid.1 as u32, 300 * grid.0 as u32);
        let plot_path = ctx.output_path(&args.plot)?;
        plot::histograms(&panels, grid, &plot_path, size)?;
        output::print_success(&format!("Histograms saved to '{}'", plot_path.display()));
    }

    output::print_done("Moment fidelity test complete");
    Ok(())
}
