use serde::Serialize;

use crate::model::result::QuizResult;

/// Chronological results for one user in one quiz mode.
///
/// The best result is derived from the stored sequence on every read, so it
/// can never drift from `max(score)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuizHistory {
    results: Vec<QuizResult>,
}

impl QuizHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate from persisted results, already in insertion order.
    #[must_use]
    pub fn from_persisted(results: Vec<QuizResult>) -> Self {
        Self { results }
    }

    /// Append a result. This is the only mutator.
    pub fn push(&mut self, result: QuizResult) {
        self.results.push(result);
    }

    #[must_use]
    pub fn results(&self) -> &[QuizResult] {
        &self.results
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// The highest-scoring result, if any. Earliest wins on ties.
    #[must_use]
    pub fn best(&self) -> Option<&QuizResult> {
        self.results.iter().fold(None, |best, r| match best {
            Some(b) if b.score() >= r.score() => Some(b),
            _ => Some(r),
        })
    }

    /// Best score, or `0.0` for an empty history.
    #[must_use]
    pub fn best_result(&self) -> f64 {
        self.best().map_or(0.0, QuizResult::score)
    }

    /// Up to `n` most recent results, newest first.
    #[must_use]
    pub fn latest(&self, n: usize) -> Vec<&QuizResult> {
        self.results.iter().rev().take(n).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn result(score: f64, minutes: i64) -> QuizResult {
        QuizResult::new(score, fixed_now() + Duration::minutes(minutes)).unwrap()
    }

    #[test]
    fn empty_history_best_is_zero() {
        let history = QuizHistory::new();
        assert!(history.best().is_none());
        assert_eq!(history.best_result(), 0.0);
    }

    #[test]
    fn best_never_decreases_on_lower_append() {
        let mut history = QuizHistory::new();
        let mut max_seen = 0.0_f64;
        for (i, score) in [42.5, 17.0, 88.25, 3.0, 88.0, 60.0].into_iter().enumerate() {
            history.push(result(score, i64::try_from(i).unwrap()));
            max_seen = max_seen.max(score);
            assert_eq!(history.best_result(), max_seen);
        }
        assert_eq!(history.len(), 6);
    }

    #[test]
    fn latest_is_newest_first() {
        let history = QuizHistory::from_persisted(vec![result(1.0, 0), result(2.0, 1), result(3.0, 2)]);
        let latest: Vec<f64> = history.latest(2).iter().map(|r| r.score()).collect();
        assert_eq!(latest, vec![3.0, 2.0]);
    }
}
