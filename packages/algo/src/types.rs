//! Common Types and Constants
//!
//! Shared data structures used by both scheduling engines.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::rating::Rating;

// ==================== Constants ====================

/// Milliseconds in one scheduling day
pub const MS_PER_DAY: f64 = 86_400_000.0;

/// Lower bound of the coarse mastery indicator
pub const MIN_STRENGTH: i32 = 0;

/// Upper bound of the coarse mastery indicator
pub const MAX_STRENGTH: i32 = 100;

/// Strength assigned by `initialize`
pub const INITIAL_STRENGTH: i32 = 20;

/// Smallest interval an engine may schedule
pub const MIN_INTERVAL_DAYS: i32 = 1;

/// Largest interval an engine may schedule (~100 years)
pub const MAX_INTERVAL_DAYS: i32 = 36_500;

/// Ease factor assigned by `initialize`
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

/// Ease factor floor
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Ease factor ceiling
pub const MAX_EASE_FACTOR: f64 = 3.0;

/// Difficulty of an item with no FSRS history
pub const DEFAULT_DIFFICULTY: f64 = 5.0;

/// Stability of an item with no FSRS history
pub const DEFAULT_STABILITY: f64 = 1.0;

/// Difficulty bounds
pub const MIN_DIFFICULTY: f64 = 1.0;
pub const MAX_DIFFICULTY: f64 = 10.0;

/// Stability floor, guards every division by stability
pub const MIN_STABILITY: f64 = 0.1;

/// Tag written into `FsrsFields::version` by the current model
pub const FSRS_VERSION: &str = "danci-fsrs-1";

// ==================== Item State ====================

/// FSRS-specific scheduling fields
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FsrsFields {
    /// Intrinsic hardness [1, 10]
    pub difficulty: f64,
    /// Days until retrievability decays to the reference threshold (>= 0.1)
    pub stability: f64,
    /// Number of failed reviews
    pub lapses: u32,
    /// Rating of the last structured review
    pub last_rating: Option<Rating>,
    /// Model version tag, for future migrations
    pub version: String,
}

impl Default for FsrsFields {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            stability: DEFAULT_STABILITY,
            lapses: 0,
            last_rating: None,
            version: FSRS_VERSION.to_string(),
        }
    }
}

/// A reviewable fact (a vocabulary word in the app) and its scheduling state
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearnableItem {
    pub id: String,
    /// Coarse mastery indicator [0, 100]
    pub strength: i32,
    /// Days until the next scheduled review (>= 1)
    pub interval_days: i32,
    /// Classic growth multiplier [1.3, 3.0]
    pub ease_factor: f64,
    /// Last passive or structured study
    pub last_studied: Option<DateTime<Utc>>,
    /// Last structured review, only set by `update`
    pub last_review: Option<DateTime<Utc>>,
    /// The item is due once `now >= next_due`
    pub next_due: DateTime<Utc>,
    /// Absent until the item has been touched by the FSRS engine
    pub fsrs: Option<FsrsFields>,
}

impl LearnableItem {
    /// A pristine item as a store creates it, before any engine has run
    pub fn new(id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            strength: MIN_STRENGTH,
            interval_days: MIN_INTERVAL_DAYS,
            ease_factor: INITIAL_EASE_FACTOR,
            last_studied: None,
            last_review: None,
            next_due: now,
            fsrs: None,
        }
    }

    /// Replace the scheduling state wholesale with an engine's output.
    ///
    /// A classic update carries no FSRS block; the existing one is kept so a
    /// later switch back to FSRS resumes from it.
    pub fn apply(&mut self, update: &SchedulerUpdate) {
        self.strength = update.strength;
        self.interval_days = update.interval_days;
        self.ease_factor = update.ease_factor;
        self.next_due = update.next_due;
        self.last_review = update.last_review;
        if let Some(at) = update.last_review {
            self.last_studied = Some(at);
        }
        if let Some(fsrs) = &update.fsrs {
            self.fsrs = Some(fsrs.clone());
        }
    }

    /// Replace the scheduling state and drop all review history, including
    /// any FSRS block the update does not carry.
    pub fn reset(&mut self, update: &SchedulerUpdate) {
        self.strength = update.strength;
        self.interval_days = update.interval_days;
        self.ease_factor = update.ease_factor;
        self.next_due = update.next_due;
        self.last_review = None;
        self.last_studied = None;
        self.fsrs = update.fsrs.clone();
    }

    /// Builder-style variant of [`LearnableItem::apply`]
    pub fn with_update(mut self, update: &SchedulerUpdate) -> Self {
        self.apply(update);
        self
    }

    pub fn review_phase(&self) -> ReviewPhase {
        ReviewPhase::of(self)
    }

    /// `now >= next_due`, shared by every engine
    pub fn is_due_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.next_due
    }

    /// True when the item still holds the store's pristine defaults
    pub fn looks_uninitialized(&self) -> bool {
        self.last_review.is_none()
            && self.strength == MIN_STRENGTH
            && self.interval_days == MIN_INTERVAL_DAYS
            && (self.ease_factor - INITIAL_EASE_FACTOR).abs() < 1e-9
    }
}

/// Whether an item has had a structured review yet
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "phase")]
pub enum ReviewPhase {
    /// Never reviewed; may still have been studied passively
    Fresh { last_studied: Option<DateTime<Utc>> },
    Reviewed { last_review: DateTime<Utc> },
}

impl ReviewPhase {
    pub fn of(item: &LearnableItem) -> Self {
        match item.last_review {
            Some(last_review) => Self::Reviewed { last_review },
            None => Self::Fresh {
                last_studied: item.last_studied,
            },
        }
    }

    /// Timestamp elapsed time is measured from, if any
    pub fn anchor(&self) -> Option<DateTime<Utc>> {
        match *self {
            Self::Fresh { last_studied } => last_studied,
            Self::Reviewed { last_review } => Some(last_review),
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh { .. })
    }

    /// Days between the anchor and `now`, never negative; 0 without an anchor
    pub fn elapsed_days(&self, now: DateTime<Utc>) -> f64 {
        self.anchor()
            .map(|at| days_between(at, now).max(0.0))
            .unwrap_or(0.0)
    }
}

// ==================== Engine I/O ====================

/// One evaluated review
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewEvent {
    pub rating: Rating,
}

impl ReviewEvent {
    pub fn new(rating: Rating) -> Self {
        Self { rating }
    }
}

impl From<Rating> for ReviewEvent {
    fn from(rating: Rating) -> Self {
        Self { rating }
    }
}

/// Engine output; the only channel through which scheduling state changes
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerUpdate {
    pub strength: i32,
    pub interval_days: i32,
    pub ease_factor: f64,
    pub next_due: DateTime<Utc>,
    /// `None` after `initialize`, the review time after `update`
    pub last_review: Option<DateTime<Utc>>,
    /// Present only when produced by the FSRS engine
    pub fsrs: Option<FsrsFields>,
}

// ==================== Priority ====================

/// Ranking key: due items first, then score descending
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriorityKey {
    pub due: bool,
    pub score: f64,
}

impl PriorityKey {
    /// Descending comparison; NaN scores are treated as equal
    pub fn cmp_desc(&self, other: &Self) -> std::cmp::Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| {
                other
                    .score
                    .partial_cmp(&self.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }
}

// ==================== Time Helpers ====================

/// Fractional days from `from` to `to` (negative when `to` is earlier)
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / MS_PER_DAY
}

/// `now + days`, with the interval already clamped to the engine bounds
pub fn due_after(now: DateTime<Utc>, days: i32) -> DateTime<Utc> {
    let days = days.clamp(MIN_INTERVAL_DAYS, MAX_INTERVAL_DAYS);
    now.checked_add_signed(Duration::days(i64::from(days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn test_review_phase_prefers_last_review() {
        let mut item = LearnableItem::new("w1", t0());
        item.last_studied = Some(t0());
        assert!(item.review_phase().is_fresh());

        item.last_review = Some(t0() + Duration::days(2));
        let phase = item.review_phase();
        assert!(!phase.is_fresh());
        assert!((phase.elapsed_days(t0() + Duration::days(3)) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_elapsed_days_never_negative() {
        let mut item = LearnableItem::new("w1", t0());
        item.last_review = Some(t0() + Duration::days(5));
        assert_eq!(item.review_phase().elapsed_days(t0()), 0.0);
        assert_eq!(LearnableItem::new("w2", t0()).review_phase().elapsed_days(t0()), 0.0);
    }

    #[test]
    fn test_apply_keeps_fsrs_block_on_classic_update() {
        let mut item = LearnableItem::new("w1", t0());
        item.fsrs = Some(FsrsFields {
            stability: 7.0,
            ..Default::default()
        });
        let update = SchedulerUpdate {
            strength: 40,
            interval_days: 3,
            ease_factor: 2.6,
            next_due: t0() + Duration::days(3),
            last_review: Some(t0()),
            fsrs: None,
        };
        item.apply(&update);
        assert_eq!(item.strength, 40);
        assert_eq!(item.last_studied, Some(t0()));
        assert_eq!(item.fsrs.as_ref().map(|f| f.stability), Some(7.0));
    }

    #[test]
    fn test_reset_drops_history() {
        let mut item = LearnableItem::new("w1", t0());
        item.last_studied = Some(t0());
        item.last_review = Some(t0());
        item.fsrs = Some(FsrsFields {
            difficulty: 9.5,
            lapses: 7,
            ..FsrsFields::default()
        });

        let update = SchedulerUpdate {
            strength: INITIAL_STRENGTH,
            interval_days: 1,
            ease_factor: INITIAL_EASE_FACTOR,
            next_due: t0() + Duration::days(1),
            last_review: None,
            fsrs: None,
        };
        item.reset(&update);

        assert!(item.fsrs.is_none());
        assert!(item.last_studied.is_none());
        assert!(item.last_review.is_none());
        assert_eq!(item.strength, INITIAL_STRENGTH);
        assert!(item.review_phase().is_fresh());
    }

    #[test]
    fn test_looks_uninitialized() {
        let item = LearnableItem::new("w1", t0());
        assert!(item.looks_uninitialized());

        let mut initialized = item.clone();
        initialized.strength = INITIAL_STRENGTH;
        assert!(!initialized.looks_uninitialized());
    }

    #[test]
    fn test_priority_key_orders_due_first() {
        let due_low = PriorityKey { due: true, score: -5.0 };
        let future_high = PriorityKey { due: false, score: 3.0 };
        assert_eq!(due_low.cmp_desc(&future_high), std::cmp::Ordering::Less);
    }

    #[test]
    fn test_due_after_clamps_interval() {
        assert_eq!(due_after(t0(), 0), t0() + Duration::days(1));
        assert_eq!(due_after(t0(), 3), t0() + Duration::days(3));
    }

    #[test]
    fn test_item_serializes_camel_case() {
        let item = LearnableItem::new("w1", t0());
        let json = serde_json::to_value(&item).unwrap();
        assert!(json.get("intervalDays").is_some());
        assert!(json.get("easeFactor").is_some());
        assert!(json.get("nextDue").is_some());
    }
}
