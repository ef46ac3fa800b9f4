//! # 模式集合数据模型
//!
//! 季节预测回报（hindcast）集合的区域平均逐日 SST。
//!
//! ## 维度
//! - 原始: `[region, hindcast, startdate, member, year, day]`
//! - 合并后: `[region, realisation, year, day]`，
//!   realisation = (hindcast, startdate, member)，hindcast 最外层、member 最内层
//!
//! ## 依赖关系
//! - 被 `parsers/` 构造
//! - 被 `unseen/` 和 `commands/` 使用

use crate::error::{Result, UnseenError};
use crate::models::observation::region_indices;
use crate::stats::descriptive::nanmean;

use ndarray::{s, Array, Array2, Array3, Array4, Array6, Axis};

/// 完整回报集合
#[derive(Debug, Clone)]
pub struct HindcastEnsemble {
    pub regions: Vec<String>,
    pub hindcasts: Vec<String>,
    pub startdates: Vec<String>,
    pub members: Vec<String>,
    pub years: Vec<i32>,
    /// `[region, hindcast, startdate, member, year, day]`
    pub values: Array6<f64>,
}

/// 合并后某个 realisation 的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealisationLabel {
    pub hindcast: usize,
    pub startdate: usize,
    pub member: usize,
}

impl HindcastEnsemble {
    /// 创建集合并校验维度
    pub fn new(
        regions: Vec<String>,
        hindcasts: Vec<String>,
        startdates: Vec<String>,
        members: Vec<String>,
        years: Vec<i32>,
        values: Array6<f64>,
    ) -> Result<Self> {
        let (r, h, sd, m, y, _) = values.dim();
        let checks = [
            ("region", regions.len(), r),
            ("hindcast", hindcasts.len(), h),
            ("startdate", startdates.len(), sd),
            ("member", members.len(), m),
            ("year", years.len(), y),
        ];
        for (what, expected, found) in checks {
            if expected != found {
                return Err(UnseenError::DimensionMismatch {
                    what: format!("model {} coordinate", what),
                    expected,
                    found,
                });
            }
        }

        Ok(Self {
            regions,
            hindcasts,
            startdates,
            members,
            years,
            values,
        })
    }

    /// 季节内天数
    pub fn n_days(&self) -> usize {
        self.values.dim().5
    }

    /// realisation 总数
    pub fn n_realisations(&self) -> usize {
        self.hindcasts.len() * self.startdates.len() * self.members.len()
    }

    /// 按给定顺序选择区域
    pub fn select_regions(&self, names: &[String]) -> Result<Self> {
        let indices = region_indices(&self.regions, names)?;
        Ok(Self {
            regions: names.to_vec(),
            hindcasts: self.hindcasts.clone(),
            startdates: self.startdates.clone(),
            members: self.members.clone(),
            years: self.years.clone(),
            values: self.values.select(Axis(0), &indices),
        })
    }

    /// 合并 (hindcast, startdate, member) 为单一 realisation 维度
    pub fn pooled(&self) -> PooledEnsemble {
        let (n_reg, n_hc, n_sd, n_mem, n_year, n_day) = self.values.dim();
        let n_real = n_hc * n_sd * n_mem;

        // iter() 按逻辑行优先顺序遍历，与 stack 顺序一致
        let flat: Vec<f64> = self.values.iter().copied().collect();
        let values = Array::from_shape_vec((n_reg, n_real, n_year, n_day), flat)
            .unwrap_or_else(|_| Array4::from_elem((n_reg, n_real, n_year, n_day), f64::NAN));

        let mut labels = Vec::with_capacity(n_real);
        for hindcast in 0..n_hc {
            for startdate in 0..n_sd {
                for member in 0..n_mem {
                    labels.push(RealisationLabel {
                        hindcast,
                        startdate,
                        member,
                    });
                }
            }
        }

        PooledEnsemble {
            regions: self.regions.clone(),
            years: self.years.clone(),
            labels,
            values,
        }
    }
}

/// 合并后的集合 `[region, realisation, year, day]`
#[derive(Debug, Clone)]
pub struct PooledEnsemble {
    pub regions: Vec<String>,
    pub years: Vec<i32>,
    pub labels: Vec<RealisationLabel>,
    pub values: Array4<f64>,
}

impl PooledEnsemble {
    pub fn n_realisations(&self) -> usize {
        self.values.dim().1
    }

    pub fn n_days(&self) -> usize {
        self.values.dim().3
    }

    /// 逐日气候态 `[region, day]`：先对 realisation 平均，再对年份平均
    pub fn climatology(&self) -> Array2<f64> {
        let (n_reg, n_real, n_year, n_day) = self.values.dim();
        Array2::from_shape_fn((n_reg, n_day), |(r, d)| {
            let year_means: Vec<f64> = (0..n_year)
                .map(|y| {
                    let column: Vec<f64> = (0..n_real).map(|i| self.values[[r, i, y, d]]).collect();
                    nanmean(&column)
                })
                .collect();
            nanmean(&year_means)
        })
    }

    /// 季节平均 `[region, realisation, year]`
    pub fn seasonal_means(&self) -> Array3<f64> {
        let (n_reg, n_real, n_year, _) = self.values.dim();
        Array3::from_shape_fn((n_reg, n_real, n_year), |(r, i, y)| {
            let days: Vec<f64> = self.values.slice(s![r, i, y, ..]).to_vec();
            nanmean(&days)
        })
    }

    /// 集合平均的季节平均 `[region, year]`
    pub fn ensemble_mean_seasonal(&self) -> Array2<f64> {
        let seasonal = self.seasonal_means();
        let (n_reg, _, n_year) = seasonal.dim();
        Array2::from_shape_fn((n_reg, n_year), |(r, y)| {
            let column: Vec<f64> = seasonal.slice(s![r, .., y]).to_vec();
            nanmean(&column)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{}{}", prefix, i)).collect()
    }

    /// 值编码各维索引，便于检查合并顺序
    fn coded_ensemble() -> HindcastEnsemble {
        let values = Array6::from_shape_fn((1, 2, 2, 3, 2, 4), |(_, h, sd, m, y, d)| {
            (h * 1000 + sd * 100 + m * 10 + y) as f64 + d as f64 * 0.01
        });
        HindcastEnsemble::new(
            vec!["Celtic Sea".to_string()],
            labels("hc", 2),
            labels("sd", 2),
            labels("m", 3),
            vec![1993, 1994],
            values,
        )
        .unwrap()
    }

    #[test]
    fn test_pooled_order() {
        let ens = coded_ensemble();
        let pooled = ens.pooled();
        assert_eq!(pooled.values.dim(), (1, 12, 2, 4));
        assert_eq!(pooled.labels.len(), 12);

        // realisation 7 = hindcast 1, startdate 0, member 1
        assert_eq!(
            pooled.labels[7],
            RealisationLabel {
                hindcast: 1,
                startdate: 0,
                member: 1
            }
        );
        assert!((pooled.values[[0, 7, 1, 0]] - 1011.0).abs() < 1e-9);
    }

    #[test]
    fn test_dimension_check() {
        let values = Array6::zeros((1, 1, 1, 1, 2, 3));
        let err = HindcastEnsemble::new(
            vec!["A".to_string()],
            labels("hc", 1),
            labels("sd", 1),
            labels("m", 1),
            vec![1993],
            values,
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_climatology_and_means() {
        let values = Array6::from_shape_fn((1, 1, 1, 2, 2, 2), |(_, _, _, m, y, d)| {
            (m + y + d) as f64
        });
        let ens = HindcastEnsemble::new(
            vec!["A".to_string()],
            labels("hc", 1),
            labels("sd", 1),
            labels("m", 2),
            vec![2000, 2001],
            values,
        )
        .unwrap();
        let pooled = ens.pooled();

        let clim = pooled.climatology();
        assert!((clim[[0, 0]] - 1.0).abs() < 1e-12);
        assert!((clim[[0, 1]] - 2.0).abs() < 1e-12);

        let seasonal = pooled.ensemble_mean_seasonal();
        assert!((seasonal[[0, 0]] - 1.0).abs() < 1e-12);
        assert!((seasonal[[0, 1]] - 2.0).abs() < 1e-12);
    }
}
