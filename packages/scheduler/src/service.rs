//! Review scheduling service.
//!
//! Loads items through an [`ItemStore`], resolves the active engine from the
//! [`ConfigStore`] on every call and writes engine output back. The fuzz RNG
//! is owned here and lent to the engine for each update.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use danci_srs::{
    fuzz_rng, Algorithm, Engine, EngineTuning, FuzzRng, LearnableItem, Rating, ReviewEvent,
    SchedulerEngine, SchedulerUpdate,
};

use crate::batch::{
    candidate_pool_size, recommended_batch_size, BatchFailure, BatchOutcome, DifficultyMark,
    QuizResult,
};
use crate::config::SchedulerConfig;
use crate::error::{SchedulerError, SchedulerResult};
use crate::store::{Clock, ConfigStore, ItemStore};

/// Outcome a rating would have, computed without persisting
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPreview {
    pub rating: Rating,
    pub update: SchedulerUpdate,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DueStats {
    pub total: usize,
    pub due: usize,
    /// At least one full day past due
    pub overdue: usize,
    /// No structured review yet
    pub fresh: usize,
    pub recommended_batch: usize,
}

pub struct SchedulerService<S, C, K> {
    store: S,
    config: C,
    clock: K,
    tuning: EngineTuning,
    rng: Mutex<FuzzRng>,
}

impl<S, C, K> SchedulerService<S, C, K>
where
    S: ItemStore,
    C: ConfigStore,
    K: Clock,
{
    pub fn new(store: S, config: C, clock: K) -> Self {
        Self::with_tuning(store, config, clock, EngineTuning::default(), None)
    }

    pub fn with_tuning(
        store: S,
        config: C,
        clock: K,
        tuning: EngineTuning,
        seed: Option<u64>,
    ) -> Self {
        Self {
            store,
            config,
            clock,
            tuning,
            rng: Mutex::new(fuzz_rng(seed)),
        }
    }

    /// Default tuning with a pinned fuzz sequence
    pub fn with_seed(store: S, config: C, clock: K, seed: u64) -> Self {
        Self::with_tuning(store, config, clock, EngineTuning::default(), Some(seed))
    }

    pub fn from_config(store: S, config: C, clock: K, settings: &SchedulerConfig) -> Self {
        Self::with_tuning(store, config, clock, settings.tuning.clone(), settings.rng_seed)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config_store(&self) -> &C {
        &self.config
    }

    pub fn clock(&self) -> &K {
        &self.clock
    }

    pub fn tuning(&self) -> &EngineTuning {
        &self.tuning
    }

    /// Reads the preference anew on every call; a failed read means classic
    pub async fn active_algorithm(&self) -> Algorithm {
        match self.config.algorithm_preference().await {
            Ok(preference) => Algorithm::from_preference(preference.as_deref()),
            Err(err) => {
                warn!(error = %err, "algorithm preference unreadable, using classic");
                Algorithm::Classic
            }
        }
    }

    async fn active_engine(&self) -> Engine {
        Engine::for_algorithm(self.active_algorithm().await, &self.tuning)
    }

    async fn load(&self, item_id: &str) -> SchedulerResult<LearnableItem> {
        self.store
            .get(item_id)
            .await?
            .ok_or_else(|| SchedulerError::NotFound(item_id.to_string()))
    }

    pub async fn process_review(
        &self,
        item_id: &str,
        review: ReviewEvent,
    ) -> SchedulerResult<SchedulerUpdate> {
        let item = self.load(item_id).await?;
        let engine = self.active_engine().await;
        let now = self.clock.now();

        let (update, trace) = {
            let mut rng = self.rng.lock();
            engine.update_traced(&item, review, now, &mut *rng)
        };
        debug!(
            item_id = %item_id,
            algorithm = %engine.algorithm(),
            rating = %review.rating,
            interval_days = update.interval_days,
            trace = ?trace,
            "review scheduled"
        );

        self.store.update(item_id, &update).await?;
        Ok(update)
    }

    /// Sequential; a failing item is logged and skipped
    pub async fn process_batch(&self, results: &[QuizResult]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for result in results {
            let review = ReviewEvent::new(result.rating());
            match self.process_review(&result.item_id, review).await {
                Ok(_) => outcome.processed += 1,
                Err(err) => {
                    warn!(item_id = %result.item_id, error = %err, "batch review failed");
                    outcome.failures.push(BatchFailure {
                        item_id: result.item_id.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }
        outcome
    }

    /// Highest-priority due items, at most the recommended batch size
    pub async fn get_due_batch(
        &self,
        max_items: Option<usize>,
        scope: Option<&str>,
    ) -> SchedulerResult<Vec<LearnableItem>> {
        let now = self.clock.now();
        let due_count = self.store.count_due(scope, now).await?;
        let recommended = recommended_batch_size(due_count);
        let limit = max_items.map_or(recommended, |max| max.min(recommended));
        if limit == 0 {
            return Ok(Vec::new());
        }

        let engine = self.active_engine().await;
        let pool = candidate_pool_size(engine.algorithm(), limit);
        let candidates = self.store.query_due(scope, now, pool).await?;
        let mut ranked = engine.sort_by_priority(candidates, now);
        ranked.truncate(limit);
        Ok(ranked)
    }

    pub async fn mark_difficulty(
        &self,
        item_id: &str,
        mark: DifficultyMark,
    ) -> SchedulerResult<SchedulerUpdate> {
        self.process_review(item_id, ReviewEvent::new(mark.rating())).await
    }

    pub async fn reset_progress(&self, item_id: &str) -> SchedulerResult<SchedulerUpdate> {
        self.load(item_id).await?;
        let engine = self.active_engine().await;
        let update = engine.initialize(self.clock.now());
        self.store.reset(item_id, &update).await?;
        debug!(item_id = %item_id, algorithm = %engine.algorithm(), "progress reset");
        Ok(update)
    }

    /// Re-initializes items that still hold pristine defaults, or that have no
    /// FSRS state while FSRS is active. Returns how many were updated.
    pub async fn bulk_initialize_stale(&self, scope: Option<&str>) -> SchedulerResult<usize> {
        let engine = self.active_engine().await;
        let now = self.clock.now();
        let items = self.store.query_all(scope).await?;

        let mut updated = 0;
        for item in items.iter().filter(|item| is_stale(item, engine.algorithm())) {
            self.store.update(&item.id, &engine.initialize(now)).await?;
            updated += 1;
        }

        info!(
            algorithm = %engine.algorithm(),
            scanned = items.len(),
            updated,
            "stale items initialized"
        );
        Ok(updated)
    }

    /// Due items in priority order; nothing with a future due date
    pub async fn get_overdue(&self, scope: Option<&str>) -> SchedulerResult<Vec<LearnableItem>> {
        let engine = self.active_engine().await;
        let now = self.clock.now();
        let overdue: Vec<LearnableItem> = self
            .store
            .query_all(scope)
            .await?
            .into_iter()
            .filter(|item| engine.is_due(item, now) && item.next_due <= now)
            .collect();
        Ok(engine.sort_by_priority(overdue, now))
    }

    /// What each rating would schedule right now; nothing is persisted
    pub async fn preview(&self, item_id: &str) -> SchedulerResult<Vec<ReviewPreview>> {
        let item = self.load(item_id).await?;
        let engine = self.active_engine().await;
        let now = self.clock.now();

        // previews never advance the shared fuzz sequence
        let mut rng = self.rng.lock().clone();
        Ok(Rating::ALL
            .into_iter()
            .map(|rating| ReviewPreview {
                rating,
                update: engine.update(&item, ReviewEvent::new(rating), now, &mut rng),
            })
            .collect())
    }

    pub async fn due_stats(&self, scope: Option<&str>) -> SchedulerResult<DueStats> {
        let now = self.clock.now();
        let items = self.store.query_all(scope).await?;

        let mut stats = DueStats {
            total: items.len(),
            ..DueStats::default()
        };
        for item in &items {
            if item.is_due_at(now) {
                stats.due += 1;
                if days_overdue(item, now) >= 1.0 {
                    stats.overdue += 1;
                }
            }
            if item.review_phase().is_fresh() {
                stats.fresh += 1;
            }
        }
        stats.recommended_batch = recommended_batch_size(stats.due);
        Ok(stats)
    }
}

fn is_stale(item: &LearnableItem, algorithm: Algorithm) -> bool {
    item.looks_uninitialized() || (algorithm == Algorithm::Fsrs && item.fsrs.is_none())
}

fn days_overdue(item: &LearnableItem, now: DateTime<Utc>) -> f64 {
    danci_srs::days_between(item.next_due, now)
}
