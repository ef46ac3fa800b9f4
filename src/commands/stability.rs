//! # stability 命令实现
//!
//! 合并 (hindcast, startdate, member) 为独立样本的前提检验：
//! - `members`: 成员间去趋势 NMAX 的 Spearman 相关是否高于随机配对
//! - `lead-time`: 每个起报日期 / hindcast 的 NMAX 分布是否与其余样本一致
//!
//! ## 依赖关系
//! - 使用 `cli/stability.rs` 定义的参数
//! - 使用 `unseen/stability.rs`

use crate::cli::stability::{LeadTimeArgs, MembersArgs, StabilityArgs, StabilityCommands};
use crate::commands::context::AnalysisContext;
use crate::error::Result;
use crate::export;
use crate::unseen::stability::{lead_time_stability, member_independence, GroupTest};
use crate::utils::output::{self, fmt_value};
use crate::utils::progress;

use std::path::Path;
use tabled::Tabled;

/// 执行 stability 命令
pub fn execute(args: StabilityArgs) -> Result<()> {
    match args.command {
        StabilityCommands::Members(a) => execute_members(a),
        StabilityCommands::LeadTime(a) => execute_lead_time(a),
    }
}

// ─────────────────────────────────────────────────────────────
// 成员独立性
// ─────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct MemberRow {
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Pairs")]
    pairs: usize,
    #[tabled(rename = "Median ρ")]
    median: String,
    #[tabled(rename = "Null interval")]
    null: String,
    #[tabled(rename = "Above null (%)")]
    above: String,
    #[tabled(rename = "Independent")]
    independent: String,
}

fn execute_members(args: MembersArgs) -> Result<()> {
    output::print_header("Member Independence");
    let ctx = AnalysisContext::load(&args.data)?;
    let ci = ctx.confidence()?;
    let mut rng = ctx.rng();
    let permutations = args.permutations.unwrap_or_else(|| ctx.iterations());

    let pb = progress::create_resampling_bar(permutations, ctx.regions().len(), "Null pairs");
    let results = member_independence(
        &ctx.field,
        &ctx.distribution.offsets,
        permutations,
        &ci,
        &mut rng,
        &pb,
    );
    pb.finish_and_clear();
    let results = results?;

    let rows: Vec<MemberRow> = results
        .iter()
        .map(|res| MemberRow {
            region: res.region.clone(),
            pairs: res.pair_rho.len(),
            median: fmt_value(res.median_rho, 3),
            null: format!(
                "{} to {}",
                fmt_value(res.null_low, 3),
                fmt_value(res.null_high, 3)
            ),
            above: fmt_value(res.frac_above * 100.0, 1),
            independent: if res.independent { "yes" } else { "no" }.to_string(),
        })
        .collect();
    output::print_info(&format!(
        "Spearman ρ of member pairs sharing a hindcast and start date, {} random pairings",
        permutations
    ));
    output::print_table(&rows);

    for res in results.iter().filter(|r| !r.independent) {
        output::print_warning(&format!(
            "{}: members are more correlated than random pairs",
            res.region
        ));
    }

    let path = ctx.output_path(Path::new("stability_members.csv"))?;
    export::member_independence_to_csv(&results, &path)?;
    output::print_success(&format!("Results saved to '{}'", path.display()));
    output::print_done("Member independence test complete");
    Ok(())
}

// ─────────────────────────────────────────────────────────────
// 预报时效稳定性
// ─────────────────────────────────────────────────────────────

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "Region")]
    region: String,
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Samples")]
    n: usize,
    #[tabled(rename = "KS D")]
    statistic: String,
    #[tabled(rename = "p")]
    p_value: String,
    #[tabled(rename = "Stable")]
    stable: String,
}

fn group_rows(region: &str, groups: &[GroupTest]) -> Vec<GroupRow> {
    groups
        .iter()
        .map(|g| GroupRow {
            region: region.to_string(),
            group: g.group.clone(),
            n: g.n,
            statistic: fmt_value(g.statistic, 3),
            p_value: format!("{:.3e}", g.p_value),
            stable: if g.stable { "yes" } else { "no" }.to_string(),
        })
        .collect()
}

fn execute_lead_time(args: LeadTimeArgs) -> Result<()> {
    output::print_header("Lead-Time Stability");
    let ctx = AnalysisContext::load(&args.data)?;

    let results = lead_time_stability(
        &ctx.field,
        &ctx.distribution.offsets,
        &ctx.model.hindcasts,
        &ctx.model.startdates,
        args.alpha,
    )?;

    let by_startdate: Vec<GroupRow> = results
        .iter()
        .flat_map(|res| group_rows(&res.region, &res.by_startdate))
        .collect();
    let by_hindcast: Vec<GroupRow> = results
        .iter()
        .flat_map(|res| group_rows(&res.region, &res.by_hindcast))
        .collect();

    if by_startdate.is_empty() {
        output::print_skip("Only one start date, lead-time test skipped");
    } else {
        output::print_header("By start date (each vs all others)");
        output::print_table(&by_startdate);
    }
    if by_hindcast.is_empty() {
        output::print_skip("Only one hindcast, hindcast test skipped");
    } else {
        output::print_header("By hindcast (each vs all others)");
        output::print_table(&by_hindcast);
    }

    let unstable = by_startdate
        .iter()
        .chain(&by_hindcast)
        .filter(|r| r.stable == "no")
        .count();
    if unstable > 0 {
        output::print_warning(&format!(
            "{} group(s) differ from the rest at α = {}",
            unstable, args.alpha
        ));
    }

    let path = ctx.output_path(Path::new("stability_lead_time.csv"))?;
    export::lead_time_to_csv(&results, &path)?;
    output::print_success(&format!("Results saved to '{}'", path.display()));
    output::print_done("Lead-time stability test complete");
    Ok(())
}
