//! # danci-scheduler - 复习调度服务
//!
//! 在 [`danci_srs`] 的纯算法之上提供调度服务:
//!
//! - [`service`] - 复习处理、到期批次、重置与迁移
//! - [`store`] - 学习项仓储、配置、时钟接口
//! - [`memory_store`] - 内存实现，用于测试与模拟
//! - [`batch`] - 批次大小、答题结果类型
//! - [`config`] / [`logging`] - 环境配置与日志初始化

pub mod batch;
pub mod config;
pub mod error;
pub mod logging;
pub mod memory_store;
pub mod service;
pub mod store;

pub use batch::{
    candidate_pool_size, recommended_batch_size, BatchFailure, BatchOutcome, DifficultyMark,
    QuizResult,
};
pub use config::SchedulerConfig;
pub use error::{ConfigError, SchedulerError, SchedulerResult, StoreError};
pub use memory_store::{EnvConfigStore, MemoryItemStore, StaticConfigStore, ALGORITHM_ENV};
pub use service::{DueStats, ReviewPreview, SchedulerService};
pub use store::{Clock, ConfigStore, FixedClock, ItemStore, SystemClock};
