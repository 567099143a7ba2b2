//! Turns a finished session's points and leftover time into a 0..=100 score.

use std::fmt::Debug;

use crate::model::{MAX_SCORE, MIN_SCORE};
use crate::settings::QuizSettings;

/// Everything a scoring policy may look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreInput {
    pub points: u32,
    pub question_count: u32,
    pub remaining_secs: u32,
    pub time_budget_secs: u32,
}

impl ScoreInput {
    #[must_use]
    pub fn new(points: u32, remaining_secs: u32, settings: &QuizSettings) -> Self {
        Self {
            points,
            question_count: settings.question_count(),
            remaining_secs,
            time_budget_secs: settings.time_budget_secs(),
        }
    }

    fn answered_ratio(self) -> f64 {
        if self.question_count == 0 {
            return 0.0;
        }
        f64::from(self.points.min(self.question_count)) / f64::from(self.question_count)
    }

    fn time_ratio(self) -> f64 {
        if self.time_budget_secs == 0 {
            return 0.0;
        }
        f64::from(self.remaining_secs.min(self.time_budget_secs)) / f64::from(self.time_budget_secs)
    }
}

/// Pluggable score normalization.
///
/// Implementations must be monotonic: more points never lowers the score, and
/// with equal points more remaining time never lowers it.
pub trait ScoringPolicy: Send + Sync + Debug {
    fn score(&self, input: ScoreInput) -> f64;
}

/// `100 * points/count * (0.5 + 0.5 * remaining/budget)`.
///
/// A perfect run with the whole budget left scores 100; a perfect run that
/// used the entire budget scores 50.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedTimeBonus;

impl ScoringPolicy for WeightedTimeBonus {
    fn score(&self, input: ScoreInput) -> f64 {
        let raw = MAX_SCORE * input.answered_ratio() * (0.5 + 0.5 * input.time_ratio());
        finish(raw)
    }
}

/// Ignores the clock: `100 * points/count`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointsOnly;

impl ScoringPolicy for PointsOnly {
    fn score(&self, input: ScoreInput) -> f64 {
        finish(MAX_SCORE * input.answered_ratio())
    }
}

fn finish(raw: f64) -> f64 {
    ((raw * 100.0).round() / 100.0).clamp(MIN_SCORE, MAX_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(points: u32, remaining: u32) -> ScoreInput {
        ScoreInput::new(points, remaining, &QuizSettings::default())
    }

    #[test]
    fn boundaries() {
        let policy = WeightedTimeBonus;
        assert_eq!(policy.score(input(0, 0)), MIN_SCORE);
        assert_eq!(policy.score(input(20, 300)), MAX_SCORE);
        assert_eq!(policy.score(input(20, 0)), 50.0);
    }

    #[test]
    fn monotonic_in_points_and_time() {
        let policy = WeightedTimeBonus;
        for remaining in [0, 1, 150, 299, 300] {
            for points in 0..20 {
                assert!(policy.score(input(points + 1, remaining)) >= policy.score(input(points, remaining)));
            }
        }
        for points in 1..=20 {
            for remaining in 0..300 {
                assert!(policy.score(input(points, remaining + 1)) >= policy.score(input(points, remaining)));
            }
        }
    }

    #[test]
    fn rounded_to_two_decimals() {
        let s = WeightedTimeBonus.score(input(7, 123));
        assert_eq!(s, (s * 100.0).round() / 100.0);
    }

    #[test]
    fn points_only_ignores_time() {
        assert_eq!(PointsOnly.score(input(10, 0)), 50.0);
        assert_eq!(PointsOnly.score(input(10, 300)), 50.0);
    }

    #[test]
    fn overflowing_inputs_are_capped() {
        assert_eq!(WeightedTimeBonus.score(input(99, 9_999)), MAX_SCORE);
    }
}
