//! Shared error types for the services crate.

use thiserror::Error;

use catapult_core::model::{ResultError, UserError};
use catapult_core::settings::SettingsError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

/// Errors reported by a `PhotoFetcher`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FetchError {
    #[error("photo service unavailable: {0}")]
    Unavailable(String),
}

/// Errors emitted by question generation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerateError {
    #[error("cat pool is empty")]
    EmptyPool,
    #[error("no valid question after {attempts} attempts")]
    DataUnavailable { attempts: u32 },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by quiz sessions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no active user selected")]
    NoActiveUser,
    #[error("cat pool is empty")]
    EmptyPool,
    #[error("no valid question after {attempts} attempts")]
    DataUnavailable { attempts: u32 },
    #[error("failed to persist quiz result: {0}")]
    PersistenceFailure(#[source] StorageError),
    #[error("session has not terminated")]
    NotTerminated,
    #[error("session is closed")]
    Closed,
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<GenerateError> for SessionError {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::EmptyPool => SessionError::EmptyPool,
            GenerateError::DataUnavailable { attempts } => SessionError::DataUnavailable { attempts },
            GenerateError::Storage(e) => SessionError::Storage(e),
        }
    }
}

/// Errors emitted by `HistoryService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HistoryServiceError {
    #[error("no active user selected")]
    NoActiveUser,
    #[error(transparent)]
    Result(#[from] ResultError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `UserService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UserServiceError {
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
