use std::sync::Arc;

use catapult_core::Clock;
use catapult_core::model::{QuizHistory, QuizMode, QuizResult, UserId};
use storage::repository::{HistoryRepository, UserRepository};

use crate::error::HistoryServiceError;

/// Read and record quiz results per user and mode.
#[derive(Clone)]
pub struct HistoryService {
    clock: Clock,
    history: Arc<dyn HistoryRepository>,
    users: Arc<dyn UserRepository>,
}

impl HistoryService {
    #[must_use]
    pub fn new(
        clock: Clock,
        history: Arc<dyn HistoryRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            clock,
            history,
            users,
        }
    }

    /// Append a score stamped with the service clock.
    ///
    /// # Errors
    ///
    /// Returns `HistoryServiceError::Result` for an out-of-range score, or
    /// `HistoryServiceError::Storage` if the append fails.
    pub async fn record(
        &self,
        user: UserId,
        mode: QuizMode,
        score: f64,
    ) -> Result<QuizHistory, HistoryServiceError> {
        let result = QuizResult::new(score, self.clock.now())?;
        Ok(self.history.append(user, mode, &result).await?)
    }

    /// # Errors
    ///
    /// Returns `HistoryServiceError::Storage` on read failure.
    pub async fn history(
        &self,
        user: UserId,
        mode: QuizMode,
    ) -> Result<QuizHistory, HistoryServiceError> {
        Ok(self.history.read(user, mode).await?)
    }

    /// Best score per mode for the active user, for the history overview.
    ///
    /// # Errors
    ///
    /// Returns `HistoryServiceError::NoActiveUser` when nobody is selected.
    pub async fn active_best_results(&self) -> Result<Vec<(QuizMode, f64)>, HistoryServiceError> {
        let profiles = self.users.load_profiles().await?;
        let user = profiles
            .active_id()
            .ok_or(HistoryServiceError::NoActiveUser)?;
        Ok(self.history.best_results(user).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catapult_core::model::{User, UserProfiles};
    use catapult_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    fn service(repo: &InMemoryRepository) -> HistoryService {
        HistoryService::new(fixed_clock(), Arc::new(repo.clone()), Arc::new(repo.clone()))
    }

    #[tokio::test]
    async fn record_stamps_clock_and_tracks_best() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        let user = UserId::new(1);

        service.record(user, QuizMode::GuessFact, 55.0).await.unwrap();
        let history = service.record(user, QuizMode::GuessFact, 20.0).await.unwrap();
        assert_eq!(history.best_result(), 55.0);
        assert_eq!(history.results()[1].created_at(), fixed_now());

        assert!(matches!(
            service.record(user, QuizMode::GuessFact, 101.0).await,
            Err(HistoryServiceError::Result(_))
        ));
        assert_eq!(service.history(user, QuizMode::GuessFact).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn overview_requires_active_user() {
        let repo = InMemoryRepository::new();
        let service = service(&repo);
        assert!(matches!(
            service.active_best_results().await,
            Err(HistoryServiceError::NoActiveUser)
        ));

        let mut profiles = UserProfiles::new();
        profiles
            .add(User::new(UserId::new(4), "kit", "", "").unwrap())
            .unwrap();
        repo.save_profiles(&profiles).await.unwrap();
        service.record(UserId::new(4), QuizMode::LeftRightCat, 64.25).await.unwrap();

        let best = service.active_best_results().await.unwrap();
        assert!(best.contains(&(QuizMode::LeftRightCat, 64.25)));
        assert!(best.contains(&(QuizMode::GuessCat, 0.0)));
    }
}
