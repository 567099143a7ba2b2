use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::question::PromptKind;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown quiz mode: {0}")]
pub struct ParseModeError(pub String);

/// The three quiz variants. History is kept separately per mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QuizMode {
    /// Mixed facts: each question draws one of the three prompt kinds.
    GuessFact,
    /// Name the breed from its photo.
    GuessCat,
    /// Pick the trait matching the pictured cat.
    LeftRightCat,
}

impl QuizMode {
    pub const ALL: [QuizMode; 3] = [QuizMode::GuessFact, QuizMode::GuessCat, QuizMode::LeftRightCat];

    /// Stable storage code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuizMode::GuessFact => "guess_fact",
            QuizMode::GuessCat => "guess_cat",
            QuizMode::LeftRightCat => "left_right_cat",
        }
    }

    /// Prompt kinds this mode may ask. A single entry means the mode is fixed.
    #[must_use]
    pub fn prompt_kinds(self) -> &'static [PromptKind] {
        match self {
            QuizMode::GuessFact => &PromptKind::ALL,
            QuizMode::GuessCat => &[PromptKind::IdentifyByPhoto],
            QuizMode::LeftRightCat => &[PromptKind::PickMatchingTrait],
        }
    }
}

impl fmt::Display for QuizMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuizMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "guess_fact" => Ok(QuizMode::GuessFact),
            "guess_cat" => Ok(QuizMode::GuessCat),
            "left_right_cat" => Ok(QuizMode::LeftRightCat),
            other => Err(ParseModeError(other.to_owned())),
        }
    }
}
