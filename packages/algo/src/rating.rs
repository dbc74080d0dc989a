//! Recall Rating Scale
//!
//! The closed four-point outcome vocabulary (`Fail < Hard < Good < Easy`)
//! shared by both engines, plus the mapping from quiz telemetry to a rating.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Answer time below which a correct answer counts as `Easy`
pub const EASY_RESPONSE_MS: i64 = 3000;

/// Answer time below which a correct answer counts as `Good`
pub const GOOD_RESPONSE_MS: i64 = 8000;

/// A rating outside the closed vocabulary reached a boundary
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid rating: {0}")]
pub struct InvalidRating(pub String);

/// Recall outcome of one review
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Fail = 0,
    Hard = 1,
    Good = 2,
    Easy = 3,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::Fail, Rating::Hard, Rating::Good, Rating::Easy];

    /// Ordinal 0-3, the index of every per-rating table
    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn from_ordinal(value: u8) -> Result<Self, InvalidRating> {
        match value {
            0 => Ok(Self::Fail),
            1 => Ok(Self::Hard),
            2 => Ok(Self::Good),
            3 => Ok(Self::Easy),
            other => Err(InvalidRating(other.to_string())),
        }
    }

    /// For ordinals already validated upstream; panics on anything else.
    pub fn from_ordinal_unchecked(value: u8) -> Self {
        match Self::from_ordinal(value) {
            Ok(rating) => rating,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn is_success(self) -> bool {
        self != Self::Fail
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fail => "fail",
            Self::Hard => "hard",
            Self::Good => "good",
            Self::Easy => "easy",
        }
    }

    /// Map quiz telemetry to a rating.
    ///
    /// An explicit difficulty tag wins over response latency; a correct
    /// answer with neither signal is `Good`.
    pub fn from_quiz(
        is_correct: bool,
        response_time_ms: Option<i64>,
        difficulty: Option<QuizDifficulty>,
    ) -> Self {
        if !is_correct {
            return Self::Fail;
        }
        if let Some(difficulty) = difficulty {
            return match difficulty {
                QuizDifficulty::Hard => Self::Hard,
                QuizDifficulty::Medium => Self::Good,
                QuizDifficulty::Easy => Self::Easy,
            };
        }
        match response_time_ms {
            Some(ms) if ms < EASY_RESPONSE_MS => Self::Easy,
            Some(ms) if ms < GOOD_RESPONSE_MS => Self::Good,
            Some(_) => Self::Hard,
            None => Self::Good,
        }
    }
}

impl TryFrom<u8> for Rating {
    type Error = InvalidRating;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_ordinal(value)
    }
}

impl FromStr for Rating {
    type Err = InvalidRating;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail" | "again" => Ok(Self::Fail),
            "hard" => Ok(Self::Hard),
            "good" => Ok(Self::Good),
            "easy" => Ok(Self::Easy),
            _ => Err(InvalidRating(s.to_string())),
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Explicit difficulty tag a learner may attach to a quiz answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizDifficulty {
    Hard,
    Medium,
    Easy,
}

impl FromStr for QuizDifficulty {
    type Err = InvalidRating;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hard" => Ok(Self::Hard),
            "medium" => Ok(Self::Medium),
            "easy" => Ok(Self::Easy),
            _ => Err(InvalidRating(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_round_trip() {
        for rating in Rating::ALL {
            assert_eq!(Rating::from_ordinal(rating.ordinal() as u8), Ok(rating));
        }
        assert!(Rating::from_ordinal(4).is_err());
        assert!(Rating::try_from(200u8).is_err());
    }

    #[test]
    fn test_ordering() {
        assert!(Rating::Fail < Rating::Hard);
        assert!(Rating::Hard < Rating::Good);
        assert!(Rating::Good < Rating::Easy);
    }

    #[test]
    #[should_panic(expected = "invalid rating")]
    fn test_unchecked_ordinal_panics() {
        Rating::from_ordinal_unchecked(7);
    }

    #[test]
    fn test_incorrect_is_always_fail() {
        assert_eq!(Rating::from_quiz(false, Some(500), Some(QuizDifficulty::Easy)), Rating::Fail);
        assert_eq!(Rating::from_quiz(false, None, None), Rating::Fail);
    }

    #[test]
    fn test_difficulty_tag_wins_over_latency() {
        assert_eq!(Rating::from_quiz(true, Some(500), Some(QuizDifficulty::Hard)), Rating::Hard);
        assert_eq!(Rating::from_quiz(true, Some(20_000), Some(QuizDifficulty::Medium)), Rating::Good);
        assert_eq!(Rating::from_quiz(true, None, Some(QuizDifficulty::Easy)), Rating::Easy);
    }

    #[test]
    fn test_latency_thresholds() {
        assert_eq!(Rating::from_quiz(true, Some(2999), None), Rating::Easy);
        assert_eq!(Rating::from_quiz(true, Some(3000), None), Rating::Good);
        assert_eq!(Rating::from_quiz(true, Some(7999), None), Rating::Good);
        assert_eq!(Rating::from_quiz(true, Some(8000), None), Rating::Hard);
    }

    #[test]
    fn test_correct_without_signal_is_good() {
        assert_eq!(Rating::from_quiz(true, None, None), Rating::Good);
    }

    #[test]
    fn test_parse() {
        assert_eq!("Easy".parse::<Rating>(), Ok(Rating::Easy));
        assert_eq!("again".parse::<Rating>(), Ok(Rating::Fail));
        assert!("meh".parse::<Rating>().is_err());
        assert_eq!("MEDIUM".parse::<QuizDifficulty>(), Ok(QuizDifficulty::Medium));
        assert!("trivial".parse::<QuizDifficulty>().is_err());
    }
}
