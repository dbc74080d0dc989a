//! Classic SM-2 Scheduler
//!
//! SuperMemo-2 style update rules:
//! - Success grows the ease factor by a per-rating bonus and multiplies the
//!   interval by it, with a bonus for reviews done late
//! - The interval strictly grows on every success
//! - Fail resets the interval to one day and lowers ease and strength
//!
//! Priority ranks overdue items by days overdue, then by weakness.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::engine::SchedulerEngine;
use crate::rating::Rating;
use crate::sanitize::{clamp_ease, clamp_strength, round_interval, sanitize_interval};
use crate::types::{
    days_between, due_after, LearnableItem, PriorityKey, ReviewEvent, SchedulerUpdate,
    INITIAL_EASE_FACTOR, INITIAL_STRENGTH, MAX_INTERVAL_DAYS, MAX_STRENGTH, MIN_INTERVAL_DAYS,
};

// ==================== Constants ====================

/// Base priority of an item at least one full day overdue
const OVERDUE_BASE_PRIORITY: f64 = 1000.0;

/// Priority added per day overdue
const OVERDUE_DAY_WEIGHT: f64 = 10.0;

// ==================== Parameters ====================

/// Tunable constants of the classic algorithm
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassicParams {
    /// Weight of the lateness multiplier in the success interval
    pub lateness_bonus: f64,
    /// Ease lost on a failed review
    pub fail_ease_penalty: f64,
    /// Strength lost on a failed review
    pub fail_strength_penalty: i32,
    /// Strength gained per rating step above `Hard`
    pub strength_step: i32,
    /// Ease gained per rating, indexed by ordinal (`Fail` unused)
    pub ease_bonus: [f64; 4],
}

impl Default for ClassicParams {
    fn default() -> Self {
        Self {
            lateness_bonus: 0.1,
            fail_ease_penalty: 0.2,
            fail_strength_penalty: 20,
            strength_step: 20,
            ease_bonus: [0.0, 0.0, 0.1, 0.15],
        }
    }
}

/// Intermediate values of one classic update
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassicTrace {
    pub rating: Rating,
    pub days_late: f64,
    pub lateness_multiplier: f64,
    pub ease_delta: f64,
    /// Interval before rounding and the strict-growth floor
    pub raw_interval_days: f64,
}

// ==================== Engine ====================

#[derive(Clone, Debug, Default)]
pub struct ClassicEngine {
    params: ClassicParams,
}

impl ClassicEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: ClassicParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ClassicParams {
        &self.params
    }

    pub fn update_traced(
        &self,
        item: &LearnableItem,
        review: ReviewEvent,
        now: DateTime<Utc>,
    ) -> (SchedulerUpdate, ClassicTrace) {
        let rating = review.rating;
        let old_interval = sanitize_interval(item.interval_days);
        let old_ease = clamp_ease(item.ease_factor);
        let old_strength = clamp_strength(item.strength);

        let days_late = days_between(item.next_due, now).floor().max(0.0);
        let lateness_multiplier = (1.0 + days_late / f64::from(old_interval)).max(1.0);

        let (interval_days, ease_factor, strength, ease_delta, raw_interval_days) =
            if rating == Rating::Fail {
                let ease = clamp_ease(old_ease - self.params.fail_ease_penalty);
                let strength = clamp_strength(old_strength - self.params.fail_strength_penalty);
                (MIN_INTERVAL_DAYS, ease, strength, ease - old_ease, 1.0)
            } else {
                let ease = clamp_ease(old_ease + self.params.ease_bonus[rating.ordinal()]);
                let raw = f64::from(old_interval)
                    * ease
                    * (1.0 + self.params.lateness_bonus * lateness_multiplier);
                let interval = round_interval(raw)
                    .max(old_interval.saturating_add(1))
                    .min(MAX_INTERVAL_DAYS);
                let steps = rating.ordinal() as i32 - 1;
                let strength = clamp_strength(old_strength + self.params.strength_step * steps);
                (interval, ease, strength, ease - old_ease, raw)
            };

        let update = SchedulerUpdate {
            strength,
            interval_days,
            ease_factor,
            next_due: due_after(now, interval_days),
            last_review: Some(now),
            fsrs: None,
        };
        let trace = ClassicTrace {
            rating,
            days_late,
            lateness_multiplier,
            ease_delta,
            raw_interval_days,
        };
        (update, trace)
    }
}

impl SchedulerEngine for ClassicEngine {
    fn initialize(&self, now: DateTime<Utc>) -> SchedulerUpdate {
        SchedulerUpdate {
            strength: INITIAL_STRENGTH,
            interval_days: MIN_INTERVAL_DAYS,
            ease_factor: INITIAL_EASE_FACTOR,
            next_due: due_after(now, MIN_INTERVAL_DAYS),
            last_review: None,
            fsrs: None,
        }
    }

    fn update<R: Rng + ?Sized>(
        &self,
        item: &LearnableItem,
        review: ReviewEvent,
        now: DateTime<Utc>,
        _rng: &mut R,
    ) -> SchedulerUpdate {
        self.update_traced(item, review, now).0
    }

    fn priority(&self, item: &LearnableItem, now: DateTime<Utc>) -> PriorityKey {
        let weakness = f64::from(MAX_STRENGTH - clamp_strength(item.strength));
        let delta = days_between(item.next_due, now);

        if delta < 0.0 {
            let days_future = (-delta).ceil().max(1.0);
            return PriorityKey {
                due: false,
                score: -days_future,
            };
        }

        let days_overdue = delta.floor();
        let score = if days_overdue >= 1.0 {
            OVERDUE_BASE_PRIORITY + days_overdue * OVERDUE_DAY_WEIGHT + weakness
        } else {
            weakness
        };
        PriorityKey { due: true, score }
    }
}
