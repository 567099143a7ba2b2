use std::sync::Arc;

use catapult_core::QuizSettings;
use storage::repository::Storage;

use crate::Clock;
use crate::catalog_service::{CatalogService, PhotoFetcher, PhotoSource};
use crate::error::AppServicesError;
use crate::history_service::HistoryService;
use crate::quiz::QuizSessionFactory;
use crate::user_service::UserService;

/// Assembles app-facing services over one storage backend.
#[derive(Clone)]
pub struct AppServices {
    catalog: Arc<CatalogService>,
    quiz: Arc<QuizSessionFactory>,
    history: Arc<HistoryService>,
    users: Arc<UserService>,
}

impl AppServices {
    /// Build services backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        clock: Clock,
        settings: QuizSettings,
        fetcher: Arc<dyn PhotoFetcher>,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(Self::from_storage(&storage, clock, settings, fetcher))
    }

    /// Build services over fresh in-memory storage.
    #[must_use]
    pub fn in_memory(clock: Clock, settings: QuizSettings, fetcher: Arc<dyn PhotoFetcher>) -> Self {
        Self::from_storage(&Storage::in_memory(), clock, settings, fetcher)
    }

    #[must_use]
    pub fn from_storage(
        storage: &Storage,
        clock: Clock,
        settings: QuizSettings,
        fetcher: Arc<dyn PhotoFetcher>,
    ) -> Self {
        let catalog = Arc::new(CatalogService::new(Arc::clone(&storage.catalog), fetcher));
        let photos: Arc<dyn PhotoSource> = catalog.clone();
        let quiz = Arc::new(QuizSessionFactory::new(
            clock,
            settings,
            Arc::clone(&storage.catalog),
            photos,
            Arc::clone(&storage.history),
            Arc::clone(&storage.users),
        ));
        let history = Arc::new(HistoryService::new(
            clock,
            Arc::clone(&storage.history),
            Arc::clone(&storage.users),
        ));
        let users = Arc::new(UserService::new(Arc::clone(&storage.users)));

        Self {
            catalog,
            quiz,
            history,
            users,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> Arc<CatalogService> {
        Arc::clone(&self.catalog)
    }

    #[must_use]
    pub fn quiz(&self) -> Arc<QuizSessionFactory> {
        Arc::clone(&self.quiz)
    }

    #[must_use]
    pub fn history(&self) -> Arc<HistoryService> {
        Arc::clone(&self.history)
    }

    #[must_use]
    pub fn users(&self) -> Arc<UserService> {
        Arc::clone(&self.users)
    }
}
