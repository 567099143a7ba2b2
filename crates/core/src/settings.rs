use std::time::Duration;

use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("question count must be > 0")]
    InvalidQuestionCount,

    #[error("time budget must be > 0 seconds")]
    InvalidTimeBudget,

    #[error("generation attempts must be > 0")]
    InvalidGenerationAttempts,

    #[error("tick interval must be > 0 ms")]
    InvalidTickInterval,

    #[error("event capacity must be > 0")]
    InvalidEventCapacity,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Tunables for one quiz session.
///
/// Defaults match the shipped game: 20 questions, a five minute countdown
/// ticking once per second, and at most 10 draws per generated question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSettings {
    question_count: u32,
    time_budget_secs: u32,
    max_generation_attempts: u32,
    tick_interval_ms: u64,
    event_capacity: usize,
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            question_count: 20,
            time_budget_secs: 300,
            max_generation_attempts: 10,
            tick_interval_ms: 1_000,
            event_capacity: 32,
        }
    }
}

impl QuizSettings {
    /// Creates custom quiz settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if any parameter is zero.
    pub fn new(
        question_count: u32,
        time_budget_secs: u32,
        max_generation_attempts: u32,
        tick_interval_ms: u64,
        event_capacity: usize,
    ) -> Result<Self, SettingsError> {
        Self {
            question_count,
            time_budget_secs,
            max_generation_attempts,
            tick_interval_ms,
            event_capacity,
        }
        .validate()
    }

    /// Check every field, returning the settings unchanged when valid.
    ///
    /// # Errors
    ///
    /// Returns the first `SettingsError` found.
    pub fn validate(self) -> Result<Self, SettingsError> {
        if self.question_count == 0 {
            return Err(SettingsError::InvalidQuestionCount);
        }
        if self.time_budget_secs == 0 {
            return Err(SettingsError::InvalidTimeBudget);
        }
        if self.max_generation_attempts == 0 {
            return Err(SettingsError::InvalidGenerationAttempts);
        }
        if self.tick_interval_ms == 0 {
            return Err(SettingsError::InvalidTickInterval);
        }
        if self.event_capacity == 0 {
            return Err(SettingsError::InvalidEventCapacity);
        }
        Ok(self)
    }

    #[must_use]
    pub fn with_question_count(mut self, count: u32) -> Self {
        self.question_count = count;
        self
    }

    #[must_use]
    pub fn with_time_budget_secs(mut self, secs: u32) -> Self {
        self.time_budget_secs = secs;
        self
    }

    #[must_use]
    pub fn with_max_generation_attempts(mut self, attempts: u32) -> Self {
        self.max_generation_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_tick_interval_ms(mut self, ms: u64) -> Self {
        self.tick_interval_ms = ms;
        self
    }

    // Accessors
    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    #[must_use]
    pub fn time_budget_secs(&self) -> u32 {
        self.time_budget_secs
    }

    #[must_use]
    pub fn max_generation_attempts(&self) -> u32 {
        self.max_generation_attempts
    }

    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    #[must_use]
    pub fn event_capacity(&self) -> usize {
        self.event_capacity
    }
}
