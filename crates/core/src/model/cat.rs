use std::collections::HashSet;

use thiserror::Error;
use url::Url;

use crate::model::ids::CatId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatError {
    #[error("cat name cannot be empty")]
    EmptyName,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PhotoUrlError {
    #[error("photo url cannot be empty")]
    Empty,

    #[error("invalid photo url: {0}")]
    Invalid(String),
}

//
// ─── TRAIT NORMALIZATION ───────────────────────────────────────────────────────
//

/// Splits a comma-separated temperament list into normalized traits.
///
/// Whitespace is removed, traits are lowercased, empty entries dropped and
/// duplicates collapsed (first occurrence wins).
#[must_use]
pub fn normalize_traits(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(',')
        .map(|t| {
            t.chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>()
                .to_lowercase()
        })
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

//
// ─── CAT ───────────────────────────────────────────────────────────────────────
//

/// A cat breed record as cached from the remote catalog.
///
/// Immutable once built; sessions work on cloned snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cat {
    id: CatId,
    name: String,
    description: String,
    alt_names: String,
    temperament: String,
}

impl Cat {
    /// Build a cat record.
    ///
    /// # Errors
    ///
    /// Returns `CatError::EmptyName` if the name is blank.
    pub fn new(
        id: CatId,
        name: impl Into<String>,
        description: impl Into<String>,
        alt_names: impl Into<String>,
        temperament: impl Into<String>,
    ) -> Result<Self, CatError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(CatError::EmptyName);
        }
        Ok(Self {
            id,
            name,
            description: description.into(),
            alt_names: alt_names.into(),
            temperament: temperament.into(),
        })
    }

    #[must_use]
    pub fn id(&self) -> &CatId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Raw comma-separated alternate names, as stored.
    #[must_use]
    pub fn alt_names_raw(&self) -> &str {
        &self.alt_names
    }

    /// Raw comma-separated temperament, as stored.
    #[must_use]
    pub fn temperament_raw(&self) -> &str {
        &self.temperament
    }

    /// Alternate names split on commas and trimmed.
    #[must_use]
    pub fn alt_names(&self) -> Vec<String> {
        self.alt_names
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Normalized, de-duplicated temperament traits.
    #[must_use]
    pub fn traits(&self) -> Vec<String> {
        normalize_traits(&self.temperament)
    }
}

//
// ─── PHOTO URL ─────────────────────────────────────────────────────────────────
//

/// Validated reference to a cat photo.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhotoUrl(Url);

impl PhotoUrl {
    /// Parse a photo URL.
    ///
    /// # Errors
    ///
    /// Returns `PhotoUrlError` if the string is blank or not an absolute URL.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, PhotoUrlError> {
        let s = raw.as_ref().trim();
        if s.is_empty() {
            return Err(PhotoUrlError::Empty);
        }
        Url::parse(s)
            .map(PhotoUrl)
            .map_err(|_| PhotoUrlError::Invalid(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl std::fmt::Display for PhotoUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}
