//! # 结果导出
//!
//! 将各项分析结果写为 CSV 表格（每个结果一个文件）。
//!
//! ## 表头
//! - 分布: `region,realisation,hindcast,startdate,member,year,nmax`
//! - 强度风险: `region,increment,probability,low,high`
//! - 时间风险: `region,year,segment,probability,low,high`
//! - 矩保真度: `region,statistic,observed,percentile_rank`
//! - 趋势保真度: `region,observed_slope,percentile_rank`（另有逐次迭代斜率）
//! - GEV: `region,location,scale,shape,period,return_level,low,high`
//!
//! ## 依赖关系
//! - 被 `commands/` 调用
//! - 使用 `csv` 库写入 CSV 文件

use crate::error::{Result, UnseenError};
use crate::stats::descriptive::MomentKind;
use crate::unseen::extremes::{GevBootstrap, RegionGev};
use crate::unseen::fidelity::{MomentFidelity, TrendFidelity, TrendSummary};
use crate::unseen::risk::RiskCurve;
use crate::unseen::stability::{LeadTimeStability, MemberIndependence};
use crate::unseen::UnseenDistribution;

use csv::Writer;
use std::fs::File;
use std::path::Path;

fn create(path: &Path) -> Result<Writer<File>> {
    Ok(Writer::from_path(path)?)
}

fn finish(mut wtr: Writer<File>, path: &Path) -> Result<()> {
    wtr.flush().map_err(|e| UnseenError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })
}

fn num(v: f64) -> String {
    format!("{:.6}", v)
}

/// 置信带在位置 i 的 (low, high)，无置信带时为空字符串
fn band_cells(curve: &RiskCurve, i: usize) -> (String, String) {
    match &curve.band {
        Some(band) => (num(band.low[i]), num(band.high[i])),
        None => (String::new(), String::new()),
    }
}

/// realisation 坐标名
pub struct LabelNames<'a> {
    pub hindcasts: &'a [String],
    pub startdates: &'a [String],
    pub members: &'a [String],
}

/// 导出 UNSEEN 分布样本
pub fn distribution_to_csv(
    distr: &UnseenDistribution,
    names: &LabelNames,
    output_path: &Path,
) -> Result<()> {
    let mut wtr = create(output_path)?;
    wtr.write_record([
        "region",
        "realisation",
        "hindcast",
        "startdate",
        "member",
        "year",
        "nmax",
    ])?;

    let n_year = distr.years.len();
    for (r, region) in distr.regions.iter().enumerate() {
        for (k, value) in distr.region_samples(r).iter().enumerate() {
            let (label, year) = distr.sample_origin(k);
            wtr.write_record([
                region.clone(),
                (k / n_year).to_string(),
                names.hindcasts[label.hindcast].clone(),
                names.startdates[label.startdate].clone(),
                names.members[label.member].clone(),
                year.to_string(),
                num(*value),
            ])?;
        }
    }
    finish(wtr, output_path)
}

/// 导出超越概率随强度变化
pub fn strength_risk_to_csv(curves: &[RiskCurve], output_path: &Path) -> Result<()> {
    let mut wtr = create(output_path)?;
    wtr.write_record(["region", "increment", "probability", "low", "high"])?;
    for curve in curves {
        for (i, (inc, p)) in curve.x.iter().zip(&curve.probability).enumerate() {
            let (low, high) = band_cells(curve, i);
            wtr.write_record([curve.region.clone(), format!("{:.3}", inc), num(*p), low, high])?;
        }
    }
    finish(wtr, output_path)
}

/// 导出超越概率随枢轴年份变化；`segments` 为 (段名, 曲线)
pub fn time_risk_to_csv(segments: &[(&str, &[RiskCurve])], output_path: &Path) -> Result<()> {
    let mut wtr = create(output_path)?;
    wtr.write_record(["region", "year", "segment", "probability", "low", "high"])?;
    for (segment, curves) in segments {
        for curve in curves.iter() {
            for (i, (year, p)) in curve.x.iter().zip(&curve.probability).enumerate() {
                let (low, high) = band_cells(curve, i);
                wtr.write_record([
                    curve.region.clone(),
                    format!("{}", *year as i32),
                    segment.to_string(),
                    num(*p),
                    low,
                    high,
                ])?;
            }
        }
    }
    finish(wtr, output_path)
}

/// 导出矩保真度摘要
pub fn moment_fidelity_to_csv(results: &[MomentFidelity], output_path: &Path) -> Result<()> {
    let mut wtr = create(output_path)?;
    wtr.write_record(["region", "statistic", "observed", "percentile_rank"])?;
    for res in results {
        for kind in MomentKind::ALL {
            wtr.write_record([
                res.region.clone(),
                kind.key().to_string(),
                num(res.observed.get(kind)),
                format!("{:.2}", res.percentile_rank(kind)),
            ])?;
        }
    }
    finish(wtr, output_path)
}

/// 导出矩保真度每次迭代的模式统计量
pub fn model_moments_to_csv(results: &[MomentFidelity], output_path: &Path) -> Result<()> {
    let mut wtr = create(output_path)?;
    wtr.write_record(["region", "iteration", "mean", "std", "skewness", "kurtosis"])?;
    for res in results {
        for (i, m) in res.model.iter().enumerate() {
            wtr.write_record([
                res.region.clone(),
                i.to_string(),
                num(m.mean),
                num(m.std_dev),
                num(m.skewness),
                num(m.kurtosis),
            ])?;
        }
    }
    finish(wtr, output_path)
}

/// 导出趋势保真度摘要
pub fn trend_fidelity_to_csv(results: &[TrendFidelity], output_path: &Path) -> Result<()> {
    let mut wtr = create(output_path)?;
    wtr.write_record(["region", "observed_slope", "percentile_rank"])?;
    for res in results {
        wtr.write_record([
            res.region.clone(),
            num(res.observed_slope),
            format!("{:.2}", res.percentile_rank()),
        ])?;
    }
    finish(wtr, output_path)
}

/// 导出趋势保真度每次迭代的斜率
pub fn trend_slopes_to_csv(results: &[TrendFidelity], output_path: &Path) -> Result<()> {
    let mut wtr = create(output_path)?;
    wtr.write_record(["region", "iteration", "slope"])?;
    for res in results {
        for (i, slope) in res.slopes.iter().enumerate() {
            wtr.write_record([res.region.clone(), i.to_string(), num(*slope)])?;
        }
    }
    finish(wtr, output_path)
}

/// 导出观测季节平均趋势
pub fn observed_trends_to_csv(summary: &[TrendSummary], output_path: &Path) -> Result<()> {
    let mut wtr = create(output_path)?;
    wtr.write_record([
        "region",
        "slope",
        "intercept",
        "r_value",
        "p_value",
        "final_value",
    ])?;
    for s in summary {
        wtr.write_record([
            s.region.clone(),
            num(s.fit.slope),
            num(s.fit.intercept),
            num(s.fit.r_value),
            format!("{:.6e}", s.fit.p_value),
            num(s.final_value),
        ])?;
    }
    finish(wtr, output_path)
}

/// 导出 GEV 参数与重现水平；无自助法结果时 low/high 为空
pub fn gev_to_csv(
    fits: &[(RegionGev, Option<GevBootstrap>)],
    periods: &[f64],
    output_path: &Path,
) -> Result<()> {
    let mut wtr = create(output_path)?;
    wtr.write_record([
        "region",
        "location",
        "scale",
        "shape",
        "period",
        "return_level",
        "low",
        "high",
    ])?;
    for (fit, boot) in fits {
        let p = fit.params();
        for (k, &period) in periods.iter().enumerate() {
            let (low, high) = match boot {
                Some(b) => (num(b.levels.low[k]), num(b.levels.high[k])),
                None => (String::new(), String::new()),
            };
            wtr.write_record([
                fit.region.clone(),
                num(p.location),
                num(p.scale),
                num(p.shape),
                format!("{}", period),
                num(p.return_level(period)),
                low,
                high,
            ])?;
        }
    }
    finish(wtr, output_path)
}

/// 导出成员独立性检验
pub fn member_independence_to_csv(
    results: &[MemberIndependence],
    output_path: &Path,
) -> Result<()> {
    let mut wtr = create(output_path)?;
    wtr.write_record([
        "region",
        "n_pairs",
        "median_rho",
        "null_low",
        "null_high",
        "frac_above",
        "independent",
    ])?;
    for res in results {
        wtr.write_record([
            res.region.clone(),
            res.pair_rho.len().to_string(),
            num(res.median_rho),
            num(res.null_low),
            num(res.null_high),
            num(res.frac_above),
            res.independent.to_string(),
        ])?;
    }
    finish(wtr, output_path)
}

/// 导出预报时效稳定性检验
pub fn lead_time_to_csv(results: &[LeadTimeStability], output_path: &Path) -> Result<()> {
    let mut wtr = create(output_path)?;
    wtr.write_record([
        "region",
        "grouping",
        "group",
        "n",
        "statistic",
        "p_value",
        "stable",
    ])?;
    for res in results {
        let groups = res
            .by_startdate
            .iter()
            .map(|g| ("startdate", g))
            .chain(res.by_hindcast.iter().map(|g| ("hindcast", g)));
        for (grouping, g) in groups {
            wtr.write_record([
                res.region.clone(),
                grouping.to_string(),
                g.group.clone(),
                g.n.to_string(),
                num(g.statistic),
                format!("{:.6e}", g.p_value),
                g.stable.to_string(),
            ])?;
        }
    }
    finish(wtr, output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::resample::Band;
    use crate::unseen::distribution::tests::synthetic_pooled;
    use crate::unseen::NmaxField;
    use tempfile::tempdir;

    fn read_rows(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
        let mut rdr = csv::Reader::from_path(path).unwrap();
        let header = rdr.headers().unwrap().iter().map(String::from).collect();
        let rows = rdr
            .records()
            .map(|r| r.unwrap().iter().map(String::from).collect())
            .collect();
        (header, rows)
    }

    #[test]
    fn test_distribution_csv() {
        let pooled = synthetic_pooled();
        let field = NmaxField::from_ensemble(&pooled, 5).unwrap();
        let distr = UnseenDistribution::build(&field, None, 2024).unwrap();
        let hc = vec!["h0".to_string(), "h1".to_string()];
        let sd = vec!["may".to_string(), "apr".to_string()];
        let mb = vec!["1".to_string(), "2".to_string()];
        let names = LabelNames {
            hindcasts: &hc,
            startdates: &sd,
            members: &mb,
        };

        let dir = tempdir().unwrap();
        let path = dir.path().join("distribution.csv");
        distribution_to_csv(&distr, &names, &path).unwrap();

        let (header, rows) = read_rows(&path);
        assert_eq!(header[6], "nmax");
        assert_eq!(rows.len(), 80);
        // 第二个 realisation 的第一年
        assert_eq!(rows[10][1], "1");
        assert_eq!(rows[10][4], "2");
        assert_eq!(rows[10][5], "2000");
    }

    #[test]
    fn test_risk_csv_with_and_without_band() {
        let with_band = RiskCurve {
            region: "Celtic Sea".to_string(),
            x: vec![1993.0, 1994.0],
            probability: vec![1.0, 2.0],
            band: Some(Band {
                low: vec![0.5, 1.5],
                high: vec![1.5, 2.5],
            }),
        };
        let without = RiskCurve {
            band: None,
            x: vec![2030.0],
            probability: vec![9.0],
            ..with_band.clone()
        };

        let dir = tempdir().unwrap();
        let path = dir.path().join("time_risk.csv");
        let core = [with_band];
        let extra = [without];
        time_risk_to_csv(&[("core", &core[..]), ("extrapolated", &extra[..])], &path).unwrap();

        let (header, rows) = read_rows(&path);
        assert_eq!(header, ["region", "year", "segment", "probability", "low", "high"]);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1][1], "1994");
        assert_eq!(rows[1][4], "1.500000");
        assert_eq!(rows[2][2], "extrapolated");
        assert_eq!(rows[2][4], "");
    }
}
