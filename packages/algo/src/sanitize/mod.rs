//! Data Sanitization
//!
//! Numerical stability utilities.
//!
//! Functions:
//! - Finite-value guards for stored item fields
//! - Range clamps for every scheduling parameter
//! - Update invariant diagnostics

use chrono::{DateTime, Utc};

use crate::types::{
    SchedulerUpdate, DEFAULT_DIFFICULTY, DEFAULT_STABILITY, INITIAL_EASE_FACTOR, MAX_DIFFICULTY,
    MAX_EASE_FACTOR, MAX_INTERVAL_DAYS, MAX_STRENGTH, MIN_DIFFICULTY, MIN_EASE_FACTOR,
    MIN_INTERVAL_DAYS, MIN_STABILITY, MIN_STRENGTH,
};

/// 检查数组是否包含无效值 (NaN 或 Inf)
pub fn has_invalid_values(arr: &[f64]) -> bool {
    arr.iter().any(|&x| x.is_nan() || x.is_infinite())
}

/// 非有限值替换为默认值
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

pub fn clamp_strength(strength: i32) -> i32 {
    strength.clamp(MIN_STRENGTH, MAX_STRENGTH)
}

pub fn clamp_ease(ease: f64) -> f64 {
    finite_or(ease, INITIAL_EASE_FACTOR).clamp(MIN_EASE_FACTOR, MAX_EASE_FACTOR)
}

pub fn clamp_difficulty(difficulty: f64) -> f64 {
    finite_or(difficulty, DEFAULT_DIFFICULTY).clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

/// Stored stability, floored so it can divide safely
pub fn sanitize_stability(stability: f64) -> f64 {
    finite_or(stability, DEFAULT_STABILITY).max(MIN_STABILITY)
}

/// Stored interval, repaired when a store hands back something below the floor
pub fn sanitize_interval(interval_days: i32) -> i32 {
    interval_days.clamp(MIN_INTERVAL_DAYS, MAX_INTERVAL_DAYS)
}

/// 四舍五入为天数，NaN 视为最小间隔
pub fn round_interval(days: f64) -> i32 {
    if !days.is_finite() {
        return if days == f64::INFINITY {
            MAX_INTERVAL_DAYS
        } else {
            MIN_INTERVAL_DAYS
        };
    }
    let rounded = days.round().clamp(MIN_INTERVAL_DAYS as f64, MAX_INTERVAL_DAYS as f64);
    rounded as i32
}

/// 诊断更新结果是否满足全部不变量，返回违反项描述
pub fn invariant_violations(update: &SchedulerUpdate, now: DateTime<Utc>) -> Vec<String> {
    let mut violations = Vec::new();

    if !(MIN_STRENGTH..=MAX_STRENGTH).contains(&update.strength) {
        violations.push(format!("strength out of range: {}", update.strength));
    }
    if update.interval_days < MIN_INTERVAL_DAYS {
        violations.push(format!("interval below floor: {}", update.interval_days));
    }
    if !(MIN_EASE_FACTOR..=MAX_EASE_FACTOR).contains(&update.ease_factor) {
        violations.push(format!("ease factor out of range: {}", update.ease_factor));
    }
    if update.next_due < now {
        violations.push(format!("next due in the past: {}", update.next_due));
    }
    if let Some(fsrs) = &update.fsrs {
        if has_invalid_values(&[fsrs.difficulty, fsrs.stability]) {
            violations.push("non-finite fsrs field".to_string());
        }
        if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&fsrs.difficulty) {
            violations.push(format!("difficulty out of range: {}", fsrs.difficulty));
        }
        if fsrs.stability < MIN_STABILITY {
            violations.push(format!("stability below floor: {}", fsrs.stability));
        }
    }

    violations
}
