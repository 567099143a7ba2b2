use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use crate::model::cat::PhotoUrl;

/// Every question offers exactly this many options.
pub const OPTION_COUNT: usize = 4;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("expected 4 options, got {len}")]
    WrongOptionCount { len: usize },

    #[error("duplicate option: {0}")]
    DuplicateOption(String),

    #[error("correct answer is not among the options")]
    MissingCorrectAnswer,
}

//
// ─── PROMPT KIND ───────────────────────────────────────────────────────────────
//

/// What the player is asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PromptKind {
    /// Name the breed shown in the photo.
    IdentifyByPhoto,
    /// Pick the one trait that does not belong to the pictured cat.
    OddTraitOut,
    /// Pick the one trait that does belong to the pictured cat.
    PickMatchingTrait,
}

impl PromptKind {
    pub const ALL: [PromptKind; 3] = [
        PromptKind::IdentifyByPhoto,
        PromptKind::OddTraitOut,
        PromptKind::PickMatchingTrait,
    ];

    /// Player-facing prompt line.
    #[must_use]
    pub fn prompt_text(self) -> &'static str {
        match self {
            PromptKind::IdentifyByPhoto => "What's the breed of the cat in the photo?",
            PromptKind::OddTraitOut => "Odd one out! Which trait doesn't fit this cat?",
            PromptKind::PickMatchingTrait => "Which trait belongs to this cat?",
        }
    }

    /// Whether building this kind needs the drawn cat's traits.
    #[must_use]
    pub fn needs_traits(self) -> bool {
        !matches!(self, PromptKind::IdentifyByPhoto)
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// One multiple-choice question. Replaced wholesale on advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    kind: PromptKind,
    options: Vec<String>,
    correct: String,
    image: Option<String>,
}

impl Question {
    /// Build a question, checking option integrity.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` unless there are exactly four pairwise
    /// distinct options containing the correct answer.
    pub fn new(
        kind: PromptKind,
        options: Vec<String>,
        correct: impl Into<String>,
        image: Option<PhotoUrl>,
    ) -> Result<Self, QuestionError> {
        if options.len() != OPTION_COUNT {
            return Err(QuestionError::WrongOptionCount { len: options.len() });
        }
        let mut seen = HashSet::with_capacity(OPTION_COUNT);
        for option in &options {
            if !seen.insert(option.as_str()) {
                return Err(QuestionError::DuplicateOption(option.clone()));
            }
        }
        let correct = correct.into();
        if !seen.contains(correct.as_str()) {
            return Err(QuestionError::MissingCorrectAnswer);
        }

        Ok(Self {
            kind,
            options,
            correct,
            image: image.map(|p| p.as_str().to_owned()),
        })
    }

    #[must_use]
    pub fn kind(&self) -> PromptKind {
        self.kind
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct
    }

    #[must_use]
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    #[must_use]
    pub fn has_option(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    /// Exact string comparison against the correct answer.
    #[must_use]
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct == answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn valid_question_builds() {
        let q = Question::new(
            PromptKind::IdentifyByPhoto,
            opts(&["Bengal", "Sphynx", "Siamese", "Persian"]),
            "Sphynx",
            Some(PhotoUrl::parse("https://example.com/a.jpg").unwrap()),
        )
        .unwrap();
        assert!(q.is_correct("Sphynx"));
        assert!(!q.is_correct("sphynx"));
        assert!(q.has_option("Persian"));
        assert_eq!(q.image(), Some("https://example.com/a.jpg"));
    }

    #[test]
    fn rejects_duplicates_and_missing_answer() {
        let dup = Question::new(
            PromptKind::OddTraitOut,
            opts(&["calm", "calm", "shy", "loyal"]),
            "shy",
            None,
        );
        assert_eq!(dup.unwrap_err(), QuestionError::DuplicateOption("calm".into()));

        let missing = Question::new(
            PromptKind::OddTraitOut,
            opts(&["calm", "playful", "shy", "loyal"]),
            "lazy",
            None,
        );
        assert_eq!(missing.unwrap_err(), QuestionError::MissingCorrectAnswer);
    }

    #[test]
    fn rejects_wrong_count() {
        let err = Question::new(PromptKind::PickMatchingTrait, opts(&["a", "b"]), "a", None)
            .unwrap_err();
        assert_eq!(err, QuestionError::WrongOptionCount { len: 2 });
    }

    #[test]
    fn only_photo_prompt_skips_traits() {
        assert!(!PromptKind::IdentifyByPhoto.needs_traits());
        assert!(PromptKind::OddTraitOut.needs_traits());
        assert!(PromptKind::PickMatchingTrait.needs_traits());
    }
}
