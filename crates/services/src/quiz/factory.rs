use std::sync::Arc;

use catapult_core::model::{QuizMode, SessionId};
use catapult_core::scoring::{ScoringPolicy, WeightedTimeBonus};
use catapult_core::{Clock, QuizSettings};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use storage::repository::{CatalogRepository, HistoryRepository, UserRepository};
use tracing::{Instrument, info, info_span};

use super::generator::{QuestionGenerator, generator_for_mode};
use super::session::QuizSession;
use super::state::{CoreDeps, SessionCore};
use crate::catalog_service::PhotoSource;
use crate::error::SessionError;

/// Starts quiz sessions with injected collaborators.
#[derive(Clone)]
pub struct QuizSessionFactory {
    clock: Clock,
    settings: QuizSettings,
    scoring: Arc<dyn ScoringPolicy>,
    catalog: Arc<dyn CatalogRepository>,
    photos: Arc<dyn PhotoSource>,
    history: Arc<dyn HistoryRepository>,
    users: Arc<dyn UserRepository>,
    seed: Option<u64>,
}

impl QuizSessionFactory {
    #[must_use]
    pub fn new(
        clock: Clock,
        settings: QuizSettings,
        catalog: Arc<dyn CatalogRepository>,
        photos: Arc<dyn PhotoSource>,
        history: Arc<dyn HistoryRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            clock,
            settings,
            scoring: Arc::new(WeightedTimeBonus),
            catalog,
            photos,
            history,
            users,
            seed: None,
        }
    }

    #[must_use]
    pub fn with_scoring(mut self, scoring: Arc<dyn ScoringPolicy>) -> Self {
        self.scoring = scoring;
        self
    }

    /// Seed the session RNG for reproducible question order.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    /// Start a session for the active user using the mode's question strategy.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Settings` for zero-valued settings,
    /// `SessionError::NoActiveUser` without an active user,
    /// `SessionError::EmptyPool` when the catalog is empty, or
    /// `SessionError::Storage` if either cannot be read.
    pub async fn start(&self, mode: QuizMode) -> Result<QuizSession, SessionError> {
        let generator = generator_for_mode(
            mode,
            Arc::clone(&self.photos),
            self.settings.max_generation_attempts(),
        );
        self.start_with_generator(mode, generator).await
    }

    /// Start a session with a custom question strategy.
    ///
    /// A first-question failure does not fail the start: the session stays in
    /// `Loading` with the issue recorded, and `QuizSession::retry` can recover.
    ///
    /// # Errors
    ///
    /// Same as [`QuizSessionFactory::start`].
    pub async fn start_with_generator(
        &self,
        mode: QuizMode,
        generator: Arc<dyn QuestionGenerator>,
    ) -> Result<QuizSession, SessionError> {
        let settings = self.settings.clone().validate()?;
        let profiles = self.users.load_profiles().await?;
        let user = profiles.active_id().ok_or(SessionError::NoActiveUser)?;

        let mut pool = self.catalog.list_cats().await?;
        if pool.is_empty() {
            return Err(SessionError::EmptyPool);
        }

        let mut rng = self
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        pool.shuffle(&mut rng);

        let id = SessionId::generate();
        let span = info_span!("quiz_session", session_id = %id, user_id = %user, %mode);
        let deps = CoreDeps {
            clock: self.clock,
            settings: settings.clone(),
            scoring: Arc::clone(&self.scoring),
            generator,
            history: Arc::clone(&self.history),
        };

        let (mut core, snapshots) = SessionCore::new(id, user, mode, pool, deps, rng);
        async {
            info!("session starting");
            core.begin().await;
        }
        .instrument(span.clone())
        .await;

        Ok(QuizSession::spawn(
            core,
            snapshots,
            settings.tick_interval(),
            settings.event_capacity(),
            span,
        ))
    }
}
