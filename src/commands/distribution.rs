//! # distribution 命令实现
//!
//! 构造 UNSEEN NMAX 分布，给出关注事件在分布中的百分位排名与超越概率。
//!
//! ## 输出
//! - 终端摘要表
//! - 分布样本 CSV
//! - 各区域直方图（事件峰值标记）
//!
//! ## 依赖关系
//! - 使用 `cli/distribution.rs` 定义的参数
//! - 使用 `commands/context.rs`, `export`, `plot/`

use crate::cli::distribution::DistributionArgs;
use crate::commands::context::AnalysisContext;
use crate::error::Result;
use crate::export;
use crate::plot::{self, HistogramPanel, Marker};
use crate::utils::output::{self, fmt_value};

use tabled::Tabled;

/// 摘要表格行
#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Samples")]
    n: usize,
    #[tabled(rename = "Mean (°C)")]
    mean: String,
    #[tabled(rename = "Std (°C)")]
    std_dev: String,
    #[tabled(rename = "Max (°C)")]
    max: String,
    #[tabled(rename = "Event (°C)")]
    event: String,
    #[tabled(rename = "Rank (%)")]
    rank: String,
    #[tabled(rename = "Exceedance (%)")]
    exceedance: String,
}

/// 执行 distribution 命令
pub fn execute(args: DistributionArgs) -> Result<()> {
    output::print_header("UNSEEN Distribution");
    let ctx = AnalysisContext::load(&args.data)?;
    let distr = &ctx.distribution;
    let focus = &ctx.focus;

    output::print_info(&format!(
        "{} realisations x {} years pooled per region ({}-day NMAX)",
        distr.labels.len(),
        distr.years.len(),
        ctx.window()
    ));

    let rows: Vec<SummaryRow> = distr
        .summary()
        .into_iter()
        .enumerate()
        .map(|(r, s)| SummaryRow {
            region: s.region,
            n: s.n,
            mean: fmt_value(s.mean, 3),
            std_dev: fmt_value(s.std_dev, 3),
            max: fmt_value(s.max, 3),
            event: fmt_value(focus.peaks[r], 3),
            rank: fmt_value(distr.percentile_rank(r, focus.peaks[r]), 2),
            exceedance: fmt_value(distr.exceedance(r, focus.peaks[r]), 2),
        })
        .collect();

    output::print_header(&format!(
        "{} {} NMAX vs {}",
        ctx.season,
        match distr.pivot_year {
            Some(p) => format!("(pivot {})", p),
            None => "(not detrended)".to_string(),
        },
        focus.label
    ));
    output::print_table(&rows);

    for (r, region) in distr.regions.iter().enumerate() {
        if distr.exceedance(r, focus.peaks[r]) == 0.0 {
            output::print_warning(&format!(
                "{}: {} exceeds every pooled sample",
                region, focus.label
            ));
        }
    }

    let csv_path = ctx.output_path(&args.csv)?;
    export::distribution_to_csv(distr, &ctx.label_names(), &csv_path)?;
    output::print_success(&format!("Samples saved to '{}'", csv_path.display()));

    if args.no_plot {
        output::print_skip("Figure generation disabled");
    } else {
        let panels: Vec<HistogramPanel> = distr
            .regions
            .iter()
            .enumerate()
            .map(|(r, region)| HistogramPanel {
                title: region.clone(),
                x_label: format!("{}-day max SST anomaly (°C)", ctx.window()),
                samples: distr.region_samples(r).to_vec(),
                marker: Some(Marker {
                    value: focus.peaks[r],
                    label: focus.label.clone(),
                }),
                annotation: Some(format!(
                    "rank {:.1}%",
                    distr.percentile_rank(r, focus.peaks[r])
                )),
                color: plot::color(r),
            })
            .collect();
        let plot_path = ctx.output_path(&args.plot)?;
        let grid = plot::grid_for(panels.len());
        let size = (520 * grid.1 as u32, 420 * grid.0 as u32);
        plot::histograms(&panels, grid, &plot_path, size)?;
        output::print_success(&format!("Histogram saved to '{}'", plot_path.display()));
    }

    output::print_done("Distribution analysis complete");
    Ok(())
}
