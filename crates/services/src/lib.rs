#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalog_service;
pub mod error;
pub mod history_service;
pub mod quiz;
pub mod user_service;

pub use catapult_core::Clock;

pub use app_services::AppServices;
pub use catalog_service::{CatalogService, NoopFetcher, PhotoFetcher, PhotoSource};
pub use error::{
    AppServicesError, FetchError, GenerateError, HistoryServiceError, SessionError,
    UserServiceError,
};
pub use history_service::HistoryService;
pub use quiz::{
    AnswerOutcome, CatQuestionGenerator, IgnoredReason, PersistStatus, QuestionGenerator,
    QuizSession, QuizSessionFactory, SessionIssue, SessionPhase, SessionSnapshot,
    TerminationReason, generator_for_mode,
};
pub use user_service::UserService;
