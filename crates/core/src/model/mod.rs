mod cat;
mod history;
mod ids;
mod mode;
mod question;
mod result;
mod user;

pub use cat::{Cat, CatError, PhotoUrl, PhotoUrlError, normalize_traits};
pub use history::QuizHistory;
pub use ids::{CatId, ParseIdError, SessionId, UserId};
pub use mode::{ParseModeError, QuizMode};
pub use question::{OPTION_COUNT, PromptKind, Question, QuestionError};
pub use result::{MAX_SCORE, MIN_SCORE, QuizResult, ResultError};
pub use user::{User, UserError, UserProfiles};
