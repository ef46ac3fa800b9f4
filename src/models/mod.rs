//! # 数据模型模块
//!
//! 定义观测记录、回报集合和季节窗口的数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`, `unseen/` 和 `commands/` 使用
//! - 子模块: season, observation, ensemble

pub mod ensemble;
pub mod observation;
pub mod season;

pub use ensemble::{HindcastEnsemble, PooledEnsemble, RealisationLabel};
pub use observation::{ObsRecord, SeasonalObs};
pub use season::Season;
