//! Property-Based Tests for the scheduling engines
//!
//! Tests the following invariants:
//! - Bounds: every update keeps strength, interval, ease, difficulty and stability in range
//! - Classic: a fail resets the interval and costs exactly 20 strength; success strictly grows the interval
//! - FSRS: stability never drops below 0.4 on a fail and never exceeds the growth cap on success
//! - Fuzz: a one-day interval is never jittered
//! - Ranking: priority is non-increasing and due items precede future ones

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use danci_srs::sanitize::invariant_violations;
use danci_srs::{
    fuzz_interval, fuzz_rng, Algorithm, Engine, EngineTuning, FsrsFields, FsrsParams,
    LearnableItem, Rating, ReviewEvent, SchedulerEngine, MAX_INTERVAL_DAYS,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_rating() -> impl Strategy<Value = Rating> {
    prop_oneof![
        Just(Rating::Fail),
        Just(Rating::Hard),
        Just(Rating::Good),
        Just(Rating::Easy),
    ]
}

fn arb_algorithm() -> impl Strategy<Value = Algorithm> {
    prop_oneof![Just(Algorithm::Classic), Just(Algorithm::Fsrs)]
}

fn arb_fsrs_fields() -> impl Strategy<Value = FsrsFields> {
    (
        (1.0f64..=10.0f64),     // difficulty
        (0.1f64..=5000.0f64),   // stability
        (0u32..=50u32),         // lapses
    )
        .prop_map(|(difficulty, stability, lapses)| FsrsFields {
            difficulty,
            stability,
            lapses,
            ..FsrsFields::default()
        })
}

fn arb_item() -> impl Strategy<Value = LearnableItem> {
    (
        (0i32..=100i32),                          // strength
        (1i32..=3650i32),                         // interval_days
        (1.3f64..=3.0f64),                        // ease_factor
        (-2000i64..=2000i64),                     // next_due offset, hours
        proptest::option::of(0i64..=5000i64),     // hours between last review and next due
        proptest::option::of(arb_fsrs_fields()),
    )
        .prop_map(|(strength, interval_days, ease_factor, due_hours, review_gap, fsrs)| {
            let mut item = LearnableItem::new("w", t0());
            item.strength = strength;
            item.interval_days = interval_days;
            item.ease_factor = ease_factor;
            item.next_due = t0() + Duration::hours(due_hours);
            item.last_review = review_gap.map(|gap| item.next_due - Duration::hours(gap));
            item.last_studied = item.last_review;
            item.fsrs = fsrs;
            item
        })
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_updates_respect_bounds(
        algorithm in arb_algorithm(),
        item in arb_item(),
        rating in arb_rating(),
        seed in any::<u64>(),
    ) {
        let engine = Engine::for_algorithm(algorithm, &EngineTuning::default());
        let mut rng = fuzz_rng(Some(seed));
        let update = engine.update(&item, ReviewEvent::new(rating), t0(), &mut rng);
        prop_assert!(invariant_violations(&update, t0()).is_empty(), "{:?}", update);
        prop_assert_eq!(update.last_review, Some(t0()));

        let init = engine.initialize(t0());
        prop_assert!(invariant_violations(&init, t0()).is_empty());
    }

    #[test]
    fn prop_classic_fail_resets(item in arb_item()) {
        let engine = Engine::for_algorithm(Algorithm::Classic, &EngineTuning::default());
        let mut rng = fuzz_rng(Some(0));
        let update = engine.update(&item, ReviewEvent::new(Rating::Fail), t0(), &mut rng);
        prop_assert_eq!(update.interval_days, 1);
        prop_assert_eq!(update.strength, (item.strength - 20).max(0));
    }

    #[test]
    fn prop_classic_success_grows_interval(
        item in arb_item(),
        rating in prop_oneof![Just(Rating::Hard), Just(Rating::Good), Just(Rating::Easy)],
    ) {
        let engine = Engine::for_algorithm(Algorithm::Classic, &EngineTuning::default());
        let mut rng = fuzz_rng(Some(0));
        let update = engine.update(&item, ReviewEvent::new(rating), t0(), &mut rng);
        if item.interval_days < MAX_INTERVAL_DAYS {
            prop_assert!(update.interval_days > item.interval_days);
        } else {
            prop_assert_eq!(update.interval_days, MAX_INTERVAL_DAYS);
        }
    }

    #[test]
    fn prop_fsrs_stability_bounds(item in arb_item(), rating in arb_rating(), seed in any::<u64>()) {
        let params = FsrsParams::default();
        let engine = Engine::for_algorithm(Algorithm::Fsrs, &EngineTuning::default());
        let mut rng = fuzz_rng(Some(seed));
        let update = engine.update(&item, ReviewEvent::new(rating), t0(), &mut rng);
        let new_stability = update.fsrs.as_ref().map(|f| f.stability).unwrap_or_default();

        if rating == Rating::Fail {
            prop_assert!(new_stability >= 0.4);
            prop_assert_eq!(update.interval_days, 1);
        } else if item.last_review.is_some() {
            let old = item.fsrs.as_ref().map(|f| f.stability).unwrap_or(1.0);
            let cap = old * (1.0 + params.growth_factor[rating.ordinal()] * 1.2);
            prop_assert!(new_stability <= cap + 1e-9, "{} > {}", new_stability, cap);
        }
    }

    #[test]
    fn prop_fuzz_never_jitters_one_day(range in 0.0f64..=1.0f64, seed in any::<u64>()) {
        let mut rng = fuzz_rng(Some(seed));
        let (interval, bounds) = fuzz_interval(1, range, &mut rng);
        prop_assert_eq!(interval, 1);
        prop_assert!(bounds.is_none());
    }

    #[test]
    fn prop_is_due_engine_independent(item in arb_item(), offset_hours in -3000i64..=3000i64) {
        let tuning = EngineTuning::default();
        let now = t0() + Duration::hours(offset_hours);
        let classic = Engine::for_algorithm(Algorithm::Classic, &tuning);
        let fsrs = Engine::for_algorithm(Algorithm::Fsrs, &tuning);
        prop_assert_eq!(classic.is_due(&item, now), now >= item.next_due);
        prop_assert_eq!(fsrs.is_due(&item, now), now >= item.next_due);
    }

    #[test]
    fn prop_sort_by_priority_orders_keys(
        algorithm in arb_algorithm(),
        items in prop::collection::vec(arb_item(), 0..40),
    ) {
        let engine = Engine::for_algorithm(algorithm, &EngineTuning::default());
        let now = t0();
        let ranked = engine.sort_by_priority(items.clone(), now);
        prop_assert_eq!(ranked.len(), items.len());

        let keys: Vec<_> = ranked.iter().map(|item| engine.priority(item, now)).collect();
        for pair in keys.windows(2) {
            prop_assert!(pair[0].due >= pair[1].due, "future item ranked before a due one");
            if pair[0].due == pair[1].due {
                prop_assert!(pair[0].score >= pair[1].score);
            }
        }
        for pair in ranked.windows(2) {
            if !engine.is_due(&pair[0], now) {
                prop_assert!(!engine.is_due(&pair[1], now));
            }
        }
    }
}
