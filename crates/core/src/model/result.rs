use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

pub const MIN_SCORE: f64 = 0.0;
pub const MAX_SCORE: f64 = 100.0;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ResultError {
    #[error("score must be a finite value in [0, 100], got {0}")]
    ScoreOutOfRange(f64),
}

/// One completed quiz attempt. Never edited after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuizResult {
    score: f64,
    created_at: DateTime<Utc>,
}

impl QuizResult {
    /// # Errors
    ///
    /// Returns `ResultError::ScoreOutOfRange` for non-finite or out-of-range scores.
    pub fn new(score: f64, created_at: DateTime<Utc>) -> Result<Self, ResultError> {
        if !score.is_finite() || !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(ResultError::ScoreOutOfRange(score));
        }
        Ok(Self { score, created_at })
    }

    /// Pins any policy output into range. Non-finite values become the minimum.
    #[must_use]
    pub fn clamped(score: f64, created_at: DateTime<Utc>) -> Self {
        let score = if score.is_finite() {
            score.clamp(MIN_SCORE, MAX_SCORE)
        } else {
            MIN_SCORE
        };
        Self { score, created_at }
    }

    #[must_use]
    pub fn score(&self) -> f64 {
        self.score
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
