//! # danci-srs - 词汇复习调度核心算法库
//!
//! 本 crate 提供纯 Rust 实现的间隔重复调度算法:
//!
//! - **Classic** - SM-2 风格调度 (难度系数、间隔增长、迟到补偿)
//! - **FSRS** - 难度/稳定性记忆模型 (可提取性衰减、目标保持率、间隔抖动)
//!
//! ## 设计理念
//!
//! - **纯计算** - 引擎只读取参数，不做 I/O，不读取系统时钟
//! - **可注入随机源** - 间隔抖动的随机数发生器由调用方传入，测试可固定种子
//! - **线程安全** - 引擎无共享可变状态，可在多线程中并发调用
//!
//! ## 模块结构
//!
//! - [`rating`] - 四级回忆评分及答题数据映射
//! - [`classic`] - SM-2 风格调度器
//! - [`fsrs`] - 难度/稳定性调度器
//! - [`engine`] - 调度器接口、算法选择
//! - [`sanitize`] - 数值稳定性、不变量诊断
//! - [`types`] - 公共类型和常量
//!
//! ## 使用示例
//!
//! ```rust
//! use chrono::Utc;
//! use danci_srs::{Algorithm, Engine, EngineTuning, LearnableItem, Rating, ReviewEvent, SchedulerEngine};
//!
//! let now = Utc::now();
//! let engine = Engine::for_algorithm(Algorithm::Fsrs, &EngineTuning::default());
//! let item = LearnableItem::new("apple", now).with_update(&engine.initialize(now));
//!
//! let mut rng = danci_srs::fuzz_rng(Some(42));
//! let update = engine.update(&item, ReviewEvent::new(Rating::Good), now, &mut rng);
//! assert!(update.interval_days >= 1);
//! ```

// ============================================================================
// 模块声明
// ============================================================================

pub mod sanitize;
pub mod types;
pub mod rating;
pub mod classic;
pub mod fsrs;
pub mod engine;

// ============================================================================
// 重新导出
// ============================================================================

/// 重新导出所有公共类型
pub use types::*;

/// 重新导出评分
pub use rating::{InvalidRating, QuizDifficulty, Rating};

/// 重新导出调度器
pub use classic::{ClassicEngine, ClassicParams, ClassicTrace};
pub use fsrs::{fuzz_interval, fuzz_rng, retrievability, FsrsEngine, FsrsParams, FsrsTrace, FuzzRng};

/// 重新导出调度接口
pub use engine::{rank_items, Algorithm, Engine, EngineTuning, SchedulerEngine, UpdateTrace};
