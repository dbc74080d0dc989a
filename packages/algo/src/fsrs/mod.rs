//! FSRS-style Difficulty/Stability Scheduler
//!
//! A simplified stability model in the spirit of FSRS (not the reference
//! FSRS parameterisation).
//!
//! Core formulas:
//! - Retrievability: R = exp(-t / S)
//! - Success gain: G = S × g(rating) × exp(-(D - 5) / 6) × (1 - R),
//!   capped at S × (1 + 1.2 × g(rating))
//! - Interval: I = -S × ln(R_target(rating)), then fuzzed ±5-15%
//!
//! Items without a structured review are in the learning phase and take
//! a fixed per-rating stability.

use chrono::{DateTime, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::engine::SchedulerEngine;
use crate::rating::Rating;
use crate::sanitize::{
    clamp_difficulty, clamp_ease, clamp_strength, finite_or, round_interval, sanitize_stability,
};
use crate::types::{
    days_between, due_after, FsrsFields, LearnableItem, PriorityKey, ReviewEvent, ReviewPhase,
    SchedulerUpdate, DEFAULT_DIFFICULTY, DEFAULT_STABILITY, FSRS_VERSION, INITIAL_EASE_FACTOR,
    INITIAL_STRENGTH, MAX_DIFFICULTY, MAX_INTERVAL_DAYS, MIN_EASE_FACTOR, MIN_INTERVAL_DAYS,
};

// ==================== Constants ====================

/// Ease gained per difficulty point below the maximum
const EASE_PER_DIFFICULTY: f64 = 0.12;

/// Divisor turning stability into a priority penalty
const PRIORITY_STABILITY_SCALE: f64 = 10.0;

/// Divisor turning difficulty headroom into a priority bonus
const PRIORITY_DIFFICULTY_SCALE: f64 = 10.0;

/// Priority penalty per lapse
const PRIORITY_LAPSE_WEIGHT: f64 = 0.2;

/// RNG used for interval fuzz
pub type FuzzRng = ChaCha8Rng;

/// Seeded fuzz RNG for reproducible runs, entropy-seeded otherwise
pub fn fuzz_rng(seed: Option<u64>) -> FuzzRng {
    match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    }
}

// ==================== Parameters ====================

/// Tunable constants of the stability model, per-rating tables indexed by ordinal
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FsrsParams {
    pub difficulty_adjustment: [f64; 4],
    pub target_retention: [f64; 4],
    pub strength_delta: [i32; 4],
    /// Stability assigned on the first structured review
    pub learning_stability: [f64; 4],
    /// Growth factor on success (`Fail` unused)
    pub growth_factor: [f64; 4],
    /// Relative jitter applied to intervals above one day
    pub fuzz_range: [f64; 4],
    /// Stability multiplier on a lapse
    pub fail_stability_factor: f64,
    /// Stability floor for reviewed items
    pub min_review_stability: f64,
    /// Scale of the success cap `S × (1 + cap × g)`
    pub growth_cap_scale: f64,
    /// Difficulty at which the difficulty factor is 1
    pub difficulty_pivot: f64,
    pub difficulty_spread: f64,
}

impl Default for FsrsParams {
    fn default() -> Self {
        Self {
            difficulty_adjustment: [-1.0, -0.4, 0.0, 0.3],
            target_retention: [0.5, 0.8, 0.9, 0.95],
            strength_delta: [-30, 5, 15, 25],
            learning_stability: [0.8, 1.2, 2.5, 4.0],
            growth_factor: [0.0, 0.6, 1.0, 1.4],
            fuzz_range: [0.05, 0.05, 0.10, 0.15],
            fail_stability_factor: 0.35,
            min_review_stability: 0.4,
            growth_cap_scale: 1.2,
            difficulty_pivot: 5.0,
            difficulty_spread: 6.0,
        }
    }
}

/// Intermediate values of one FSRS update
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FsrsTrace {
    pub rating: Rating,
    pub learning_phase: bool,
    pub elapsed_days: f64,
    pub retrievability: f64,
    pub difficulty_adjustment: f64,
    pub stability_gain: f64,
    pub raw_interval_days: f64,
    pub scheduled_interval_days: i32,
    /// Jitter window, absent when no fuzz was applied
    pub fuzz_bounds: Option<(f64, f64)>,
    pub fuzzed_interval_days: i32,
}

// ==================== Core Functions ====================

/// Probability of recall after `elapsed_days` at the given stability
pub fn retrievability(elapsed_days: f64, stability: f64) -> f64 {
    let elapsed = finite_or(elapsed_days, 0.0).max(0.0);
    (-elapsed / sanitize_stability(stability)).exp()
}

/// Jitter `interval_days` uniformly within ±`range`.
///
/// Intervals of one day or less come back unchanged (floored at 1).
pub fn fuzz_interval<R: Rng + ?Sized>(
    interval_days: i32,
    range: f64,
    rng: &mut R,
) -> (i32, Option<(f64, f64)>) {
    if interval_days <= MIN_INTERVAL_DAYS {
        return (MIN_INTERVAL_DAYS, None);
    }
    let range = finite_or(range, 0.0).clamp(0.0, 0.9);
    let base = f64::from(interval_days);
    let low = base * (1.0 - range);
    let high = base * (1.0 + range);
    let drawn = rng.gen_range(low..=high);
    (round_interval(drawn), Some((low, high)))
}

// ==================== Engine ====================

#[derive(Clone, Debug, Default)]
pub struct FsrsEngine {
    params: FsrsParams,
}

impl FsrsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: FsrsParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &FsrsParams {
        &self.params
    }

    /// Current probability of recall for a stored item
    pub fn retrievability_at(&self, item: &LearnableItem, now: DateTime<Utc>) -> f64 {
        let stability = item
            .fsrs
            .as_ref()
            .map(|fields| sanitize_stability(fields.stability))
            .unwrap_or(DEFAULT_STABILITY);
        retrievability(item.review_phase().elapsed_days(now), stability)
    }

    fn next_stability(
        &self,
        phase: &ReviewPhase,
        rating: Rating,
        old_stability: f64,
        difficulty: f64,
        retrievability: f64,
    ) -> (f64, f64) {
        let idx = rating.ordinal();
        let p = &self.params;

        if phase.is_fresh() {
            return (p.learning_stability[idx], 0.0);
        }

        if rating == Rating::Fail {
            let stability = (old_stability * p.fail_stability_factor).max(p.min_review_stability);
            return (stability, stability - old_stability);
        }

        let growth = p.growth_factor[idx];
        let difficulty_factor = (-(difficulty - p.difficulty_pivot) / p.difficulty_spread).exp();
        let gain = old_stability * growth * difficulty_factor * (1.0 - retrievability);
        let cap = old_stability * (1.0 + growth * p.growth_cap_scale);
        // cap wins when the floor exceeds it (tiny old stability)
        let stability = (old_stability + gain).max(p.min_review_stability).min(cap);
        (stability, gain)
    }

    pub fn update_traced<R: Rng + ?Sized>(
        &self,
        item: &LearnableItem,
        review: ReviewEvent,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> (SchedulerUpdate, FsrsTrace) {
        let rating = review.rating;
        let idx = rating.ordinal();
        let p = &self.params;

        let fields = item.fsrs.clone().unwrap_or_default();
        let old_stability = sanitize_stability(fields.stability);
        let old_difficulty = clamp_difficulty(fields.difficulty);

        let phase = ReviewPhase::of(item);
        let elapsed_days = phase.elapsed_days(now);
        let r = retrievability(elapsed_days, old_stability);

        let adjustment = p.difficulty_adjustment[idx];
        let difficulty = clamp_difficulty(old_difficulty + adjustment);

        let (stability, gain) = self.next_stability(&phase, rating, old_stability, difficulty, r);
        let stability = sanitize_stability(stability);
        let lapses = if rating == Rating::Fail {
            fields.lapses.saturating_add(1)
        } else {
            fields.lapses
        };

        let raw_interval_days = -stability * p.target_retention[idx].ln();
        let scheduled_interval_days = if rating == Rating::Fail {
            MIN_INTERVAL_DAYS
        } else {
            round_interval(raw_interval_days)
        };
        let (fuzzed, fuzz_bounds) = fuzz_interval(scheduled_interval_days, p.fuzz_range[idx], rng);
        let interval_days = fuzzed.clamp(MIN_INTERVAL_DAYS, MAX_INTERVAL_DAYS);

        let strength = clamp_strength(clamp_strength(item.strength) + p.strength_delta[idx]);
        let ease_factor = clamp_ease(MIN_EASE_FACTOR + (MAX_DIFFICULTY - difficulty) * EASE_PER_DIFFICULTY);

        let update = SchedulerUpdate {
            strength,
            interval_days,
            ease_factor,
            next_due: due_after(now, interval_days),
            last_review: Some(now),
            fsrs: Some(FsrsFields {
                difficulty,
                stability,
                lapses,
                last_rating: Some(rating),
                version: FSRS_VERSION.to_string(),
            }),
        };
        let trace = FsrsTrace {
            rating,
            learning_phase: phase.is_fresh(),
            elapsed_days,
            retrievability: r,
            difficulty_adjustment: adjustment,
            stability_gain: gain,
            raw_interval_days,
            scheduled_interval_days,
            fuzz_bounds,
            fuzzed_interval_days: interval_days,
        };
        (update, trace)
    }
}

impl SchedulerEngine for FsrsEngine {
    fn initialize(&self, now: DateTime<Utc>) -> SchedulerUpdate {
        SchedulerUpdate {
            strength: INITIAL_STRENGTH,
            interval_days: MIN_INTERVAL_DAYS,
            ease_factor: INITIAL_EASE_FACTOR,
            next_due: due_after(now, MIN_INTERVAL_DAYS),
            last_review: None,
            fsrs: Some(FsrsFields {
                difficulty: DEFAULT_DIFFICULTY,
                stability: DEFAULT_STABILITY,
                lapses: 0,
                last_rating: None,
                version: FSRS_VERSION.to_string(),
            }),
        }
    }

    fn update<R: Rng + ?Sized>(
        &self,
        item: &LearnableItem,
        review: ReviewEvent,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> SchedulerUpdate {
        self.update_traced(item, review, now, rng).0
    }

    fn priority(&self, item: &LearnableItem, now: DateTime<Utc>) -> PriorityKey {
        let fields = item.fsrs.clone().unwrap_or_default();
        let stability = sanitize_stability(fields.stability);
        let difficulty = clamp_difficulty(fields.difficulty);
        let r = self.retrievability_at(item, now);

        let due = item.is_due_at(now);
        let overdue_days = days_between(item.next_due, now);
        let due_bonus = if due { overdue_days + 1.0 } else { 0.0 };
        let future_penalty = if due { 0.0 } else { -r };
        let stability_penalty = stability / PRIORITY_STABILITY_SCALE;
        let difficulty_bonus = (MAX_DIFFICULTY - difficulty) / PRIORITY_DIFFICULTY_SCALE;
        let lapse_penalty = f64::from(fields.lapses) * PRIORITY_LAPSE_WEIGHT;

        let score = due_bonus + future_penalty + difficulty_bonus - stability_penalty - lapse_penalty;
        PriorityKey {
            due,
            score: finite_or(score, 0.0),
        }
    }
}
