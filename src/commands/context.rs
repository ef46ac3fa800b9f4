//! # 分析上下文
//!
//! 所有分析子命令共享的准备流程：
//! 1. 读取配置并应用命令行覆盖
//! 2. 读取观测与模式数据，选择区域
//! 3. 合并集合、抽取观测季节（完整记录 / 与回报重叠的年份）
//! 4. 趋势拟合、NMAX 场、UNSEEN 分布、观测 NMAX、关注事件峰值
//!
//! ## 依赖关系
//! - 被 `commands/` 各子命令使用
//! - 使用 `config.rs`, `parsers/`, `models/`, `unseen/`

use crate::cli::common::DataArgs;
use crate::config::AnalysisConfig;
use crate::error::{Result, UnseenError};
use crate::export::LabelNames;
use crate::models::{HindcastEnsemble, ObsRecord, PooledEnsemble, Season, SeasonalObs};
use crate::parsers;
use crate::stats::resample::{make_rng, ConfidenceInterval};
use crate::stats::LinearFit;
use crate::unseen::detrend::trend_fits;
use crate::unseen::observed::{focus_event_peak, observed_nmax};
use crate::unseen::{FocusEvent, NmaxField, UnseenDistribution};
use crate::utils::{output, progress};

use ndarray::Array2;
use rand::rngs::StdRng;
use std::fs;
use std::path::{Path, PathBuf};

/// 命令行覆盖配置
pub fn apply_overrides(config: &mut AnalysisConfig, args: &DataArgs) {
    if let Some(obs) = &args.obs {
        config.paths.obs_sst_regmeans = obs.clone();
    }
    if let Some(model) = &args.model {
        config.paths.model_sst_regmeans = model.clone();
    }
    if let Some(regions) = &args.regions {
        config.analysis.regions = regions.iter().map(|r| r.trim().to_string()).collect();
    }
    if let Some(window) = args.window {
        config.analysis.extr_avg_period = window;
    }
    if let Some(pivot) = args.pivot_year {
        config.analysis.pivot_year = pivot;
    }
    if let Some(source) = args.trend_source {
        config.analysis.trend_source = source;
    }
    if args.no_detrend {
        config.analysis.detrend = false;
    }
    if let Some(iterations) = args.iterations {
        config.bootstrap.iterations = iterations;
    }
    if args.seed.is_some() {
        config.bootstrap.seed = args.seed;
    }
    if let Some(dir) = &args.output_dir {
        config.paths.output_dir = dir.clone();
    }
}

/// 准备完毕的分析数据
pub struct AnalysisContext {
    pub config: AnalysisConfig,
    pub season: Season,
    pub model: HindcastEnsemble,
    pub pooled: PooledEnsemble,
    pub obs: ObsRecord,
    /// 完整观测记录中所有完整季节
    pub obs_full: SeasonalObs,
    /// 与回报年份重叠的观测季节
    pub obs_match: SeasonalObs,
    /// 去趋势所用趋势，None 表示不去趋势
    pub fits: Option<Vec<LinearFit>>,
    pub field: NmaxField,
    pub distribution: UnseenDistribution,
    /// 重叠年份观测 NMAX `[region, year]`
    pub obs_nmax: Array2<f64>,
    pub focus: FocusEvent,
}

impl AnalysisContext {
    /// 读取配置与数据并完成公共计算
    pub fn load(args: &DataArgs) -> Result<Self> {
        let mut config = AnalysisConfig::load(args.config.as_deref())?;
        apply_overrides(&mut config, args);
        config.validate()?;

        match &config.source {
            Some(path) => output::print_info(&format!("Config: {}", path.display())),
            None => output::print_info("Config: built-in defaults"),
        }

        let season = config.season()?;
        let a = &config.analysis;

        // 读取数据
        let spinner = progress::create_spinner("Reading observations...");
        let obs = parsers::parse_obs_file(&config.paths.obs_sst_regmeans);
        spinner.finish_and_clear();
        let obs = obs?.select_regions(&a.regions)?;

        let spinner = progress::create_spinner("Reading hindcast ensemble...");
        let model = parsers::parse_model_file(&config.paths.model_sst_regmeans);
        spinner.finish_and_clear();
        let model = model?.select_regions(&a.regions)?;

        if model.regions != obs.regions {
            return Err(UnseenError::RegionMismatch {
                model: model.regions.clone(),
                obs: obs.regions.clone(),
            });
        }

        output::print_info(&format!(
            "Observations: {} days ({} to {})",
            obs.dates.len(),
            obs.dates.first().map(|d| d.to_string()).unwrap_or_default(),
            obs.dates.last().map(|d| d.to_string()).unwrap_or_default(),
        ));
        output::print_info(&format!(
            "Hindcasts: {} hindcasts x {} start dates x {} members, {} years ({}-{})",
            model.hindcasts.len(),
            model.startdates.len(),
            model.members.len(),
            model.years.len(),
            model.years.first().copied().unwrap_or_default(),
            model.years.last().copied().unwrap_or_default(),
        ));
        if model.n_days() != season.max_length() {
            output::print_warning(&format!(
                "Hindcast season has {} days, {} has up to {}",
                model.n_days(),
                season,
                season.max_length()
            ));
        }

        let pooled = model.pooled();

        // 观测季节
        let full_years = obs.complete_season_years(&season);
        if full_years.is_empty() {
            return Err(UnseenError::InsufficientData {
                what: format!("complete {} seasons in observations", season),
                needed: 1,
                got: 0,
            });
        }
        let obs_full = obs.extract_season(&season, &full_years)?;

        let match_years = config.match_year_list();
        if match_years != pooled.years {
            return Err(UnseenError::InvalidArgument(format!(
                "match_years {}-{} must cover exactly the hindcast years {}-{}",
                a.match_years[0],
                a.match_years[1],
                pooled.years.first().copied().unwrap_or_default(),
                pooled.years.last().copied().unwrap_or_default(),
            )));
        }
        let obs_match = obs_full.select_years(&match_years)?;

        // UNSEEN 分布
        let fits = if a.detrend {
            Some(trend_fits(a.trend_source, &obs_full, &pooled)?)
        } else {
            None
        };
        let field = NmaxField::from_ensemble(&pooled, a.extr_avg_period)?;
        let distribution = UnseenDistribution::build(&field, fits.as_deref(), a.pivot_year)?;
        let obs_nmax = observed_nmax(&obs_match, &distribution.offsets, a.extr_avg_period)?;

        let focus = focus_event_peak(
            &obs,
            &obs_match.day_climatology(),
            &season,
            config.event.start,
            config.event.end,
            a.extr_avg_period,
            &config.event.label,
        )?;

        match &fits {
            Some(_) => output::print_info(&format!(
                "Detrending: {} trend, pivot year {}",
                a.trend_source, a.pivot_year
            )),
            None => output::print_info("Detrending: disabled"),
        }

        Ok(Self {
            config,
            season,
            model,
            pooled,
            obs,
            obs_full,
            obs_match,
            fits,
            field,
            distribution,
            obs_nmax,
            focus,
        })
    }

    /// 区域名
    pub fn regions(&self) -> &[String] {
        &self.distribution.regions
    }

    /// N 日窗口
    pub fn window(&self) -> usize {
        self.config.analysis.extr_avg_period
    }

    /// 自助法迭代次数
    pub fn iterations(&self) -> usize {
        self.config.bootstrap.iterations
    }

    pub fn rng(&self) -> StdRng {
        make_rng(self.config.bootstrap.seed)
    }

    pub fn confidence(&self) -> Result<ConfidenceInterval> {
        ConfidenceInterval::from_level(self.config.bootstrap.confidence)
    }

    /// 去趋势趋势；未启用去趋势时按配置来源重新拟合
    pub fn trends(&self) -> Result<Vec<LinearFit>> {
        match &self.fits {
            Some(fits) => Ok(fits.clone()),
            None => trend_fits(
                self.config.analysis.trend_source,
                &self.obs_full,
                &self.pooled,
            ),
        }
    }

    pub fn label_names(&self) -> LabelNames<'_> {
        LabelNames {
            hindcasts: &self.model.hindcasts,
            startdates: &self.model.startdates,
            members: &self.model.members,
        }
    }

    /// 输出目录下的文件路径（目录不存在时创建）
    pub fn output_path(&self, name: &Path) -> Result<PathBuf> {
        let dir = &self.config.paths.output_dir;
        fs::create_dir_all(dir).map_err(|e| UnseenError::FileWriteError {
            path: dir.display().to_string(),
            source: e,
        })?;
        Ok(dir.join(name))
    }
}
