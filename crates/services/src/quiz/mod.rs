mod factory;
mod generator;
mod session;
mod state;

// Public API of the quiz engine.
pub use crate::error::SessionError;
pub use factory::QuizSessionFactory;
pub use generator::{CatQuestionGenerator, QuestionGenerator, generator_for_mode};
pub use session::QuizSession;
pub use state::{
    AnswerOutcome, IgnoredReason, PersistStatus, SessionIssue, SessionPhase, SessionSnapshot,
    TerminationReason,
};
