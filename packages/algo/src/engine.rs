//! Scheduler Engine Abstraction
//!
//! Both algorithms satisfy [`SchedulerEngine`]. The set of implementations is
//! closed: [`Engine`] is the tagged variant the service resolves from the
//! configured [`Algorithm`] on every call.

use chrono::{DateTime, Utc};
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::classic::{ClassicEngine, ClassicParams, ClassicTrace};
use crate::fsrs::{FsrsEngine, FsrsParams, FsrsTrace};
use crate::types::{LearnableItem, PriorityKey, ReviewEvent, SchedulerUpdate};

/// Capability shared by every scheduling algorithm.
///
/// Implementations are pure: they read only their arguments and never
/// mutate the input item. Randomness is supplied by the caller.
pub trait SchedulerEngine: Sync {
    /// Scheduling state for an item that just became reviewable
    fn initialize(&self, now: DateTime<Utc>) -> SchedulerUpdate;

    /// Scheduling state after one review
    fn update<R: Rng + ?Sized>(
        &self,
        item: &LearnableItem,
        review: ReviewEvent,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> SchedulerUpdate;

    fn is_due(&self, item: &LearnableItem, now: DateTime<Utc>) -> bool {
        item.is_due_at(now)
    }

    fn priority(&self, item: &LearnableItem, now: DateTime<Utc>) -> PriorityKey;

    /// Highest priority first; items with equal keys keep their input order
    fn sort_by_priority(&self, items: Vec<LearnableItem>, now: DateTime<Utc>) -> Vec<LearnableItem> {
        rank_items(items, |item| self.priority(item, now))
    }
}

/// Stable descending sort by a priority key computed in parallel
pub fn rank_items<F>(items: Vec<LearnableItem>, key: F) -> Vec<LearnableItem>
where
    F: Fn(&LearnableItem) -> PriorityKey + Sync,
{
    let keys: Vec<PriorityKey> = items.par_iter().map(|item| key(item)).collect();
    let mut ranked: Vec<(PriorityKey, LearnableItem)> = keys.into_iter().zip(items).collect();
    ranked.sort_by(|a, b| a.0.cmp_desc(&b.0));
    ranked.into_iter().map(|(_, item)| item).collect()
}

// ==================== Algorithm Selection ====================

/// Configured scheduling algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    #[default]
    Classic,
    Fsrs,
}

impl Algorithm {
    /// Recognised values only; see [`Algorithm::from_preference`] for the lenient form
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "classic" => Some(Self::Classic),
            "fsrs" => Some(Self::Fsrs),
            _ => None,
        }
    }

    /// Absent or unrecognised preferences resolve to `Classic`
    pub fn from_preference(value: Option<&str>) -> Self {
        value.and_then(Self::parse).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::Fsrs => "fsrs",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overridable constants for both engines
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineTuning {
    pub classic: ClassicParams,
    pub fsrs: FsrsParams,
}

// ==================== Engine ====================

/// Intermediate values of one update, by algorithm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "lowercase")]
pub enum UpdateTrace {
    Classic(ClassicTrace),
    Fsrs(FsrsTrace),
}

#[derive(Debug, Clone)]
pub enum Engine {
    Classic(ClassicEngine),
    Fsrs(FsrsEngine),
}

impl Engine {
    pub fn for_algorithm(algorithm: Algorithm, tuning: &EngineTuning) -> Self {
        match algorithm {
            Algorithm::Classic => Self::Classic(ClassicEngine::with_params(tuning.classic.clone())),
            Algorithm::Fsrs => Self::Fsrs(FsrsEngine::with_params(tuning.fsrs.clone())),
        }
    }

    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::Classic(_) => Algorithm::Classic,
            Self::Fsrs(_) => Algorithm::Fsrs,
        }
    }

    pub fn update_traced<R: Rng + ?Sized>(
        &self,
        item: &LearnableItem,
        review: ReviewEvent,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> (SchedulerUpdate, UpdateTrace) {
        match self {
            Self::Classic(engine) => {
                let (update, trace) = engine.update_traced(item, review, now);
                (update, UpdateTrace::Classic(trace))
            }
            Self::Fsrs(engine) => {
                let (update, trace) = engine.update_traced(item, review, now, rng);
                (update, UpdateTrace::Fsrs(trace))
            }
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::Classic(ClassicEngine::default())
    }
}

impl SchedulerEngine for Engine {
    fn initialize(&self, now: DateTime<Utc>) -> SchedulerUpdate {
        match self {
            Self::Classic(engine) => engine.initialize(now),
            Self::Fsrs(engine) => engine.initialize(now),
        }
    }

    fn update<R: Rng + ?Sized>(
        &self,
        item: &LearnableItem,
        review: ReviewEvent,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> SchedulerUpdate {
        match self {
            Self::Classic(engine) => engine.update(item, review, now, rng),
            Self::Fsrs(engine) => engine.update(item, review, now, rng),
        }
    }

    fn priority(&self, item: &LearnableItem, now: DateTime<Utc>) -> PriorityKey {
        match self {
            Self::Classic(engine) => engine.priority(item, now),
            Self::Fsrs(engine) => engine.priority(item, now),
        }
    }
}
