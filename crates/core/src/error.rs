use thiserror::Error;

use crate::model::{
    CatError, ParseIdError, PhotoUrlError, QuestionError, ResultError, UserError,
};
use crate::settings::SettingsError;

/// Any domain validation failure.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Id(#[from] ParseIdError),
    #[error(transparent)]
    Cat(#[from] CatError),
    #[error(transparent)]
    PhotoUrl(#[from] PhotoUrlError),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    QuizResult(#[from] ResultError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CatId, PhotoUrl};

    fn import(id: &str, photo: &str) -> Result<(CatId, PhotoUrl), Error> {
        Ok((CatId::new(id)?, PhotoUrl::parse(photo)?))
    }

    #[test]
    fn record_errors_convert_into_domain_error() {
        assert!(import("abys", "https://cdn.example.com/a.jpg").is_ok());
        assert!(matches!(import("  ", "https://cdn.example.com/a.jpg"), Err(Error::Id(_))));
        assert!(matches!(import("abys", "not a url"), Err(Error::PhotoUrl(_))));
    }
}
