//! Batch sizing and the quiz-facing batch types.

use serde::{Deserialize, Serialize};

use danci_srs::{Algorithm, QuizDifficulty, Rating};

/// Session size for a given number of due items
pub fn recommended_batch_size(due_count: usize) -> usize {
    match due_count {
        0..=10 => due_count,
        11..=25 => 15,
        26..=50 => 20,
        _ => 25,
    }
}

/// How many due candidates to load before ranking and truncating to `limit`.
///
/// FSRS over-fetches so its priority score can reorder the pool.
pub fn candidate_pool_size(algorithm: Algorithm, limit: usize) -> usize {
    match algorithm {
        Algorithm::Classic => limit,
        Algorithm::Fsrs => limit
            .saturating_mul(3)
            .min(limit.saturating_add(50))
            .max(limit),
    }
}

/// One answered quiz question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub item_id: String,
    pub correct: bool,
    pub response_time_ms: Option<i64>,
    pub difficulty: Option<QuizDifficulty>,
}

impl QuizResult {
    pub fn new(item_id: impl Into<String>, correct: bool) -> Self {
        Self {
            item_id: item_id.into(),
            correct,
            response_time_ms: None,
            difficulty: None,
        }
    }

    pub fn with_response_time(mut self, ms: i64) -> Self {
        self.response_time_ms = Some(ms);
        self
    }

    pub fn with_difficulty(mut self, difficulty: QuizDifficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    pub fn rating(&self) -> Rating {
        Rating::from_quiz(self.correct, self.response_time_ms, self.difficulty)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailure {
    pub item_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub processed: usize,
    pub failures: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Learner's explicit self-assessment of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyMark {
    Easy,
    Hard,
}

impl DifficultyMark {
    pub fn rating(self) -> Rating {
        match self {
            Self::Easy => Rating::Easy,
            Self::Hard => Rating::Hard,
        }
    }
}
