//! Movie domain model.
//!
//! # Responsibility
//! - Define the canonical movie record persisted by the catalog store.
//! - Derive URL-safe slugs from title and release year.
//! - Validate write-path invariants before any SQL is issued.
//!
//! # Invariants
//! - `id` is stable and never reused for another movie.
//! - `slug` only contains `[a-z0-9-]`.
//! - `year_of_release` is positive, so derived slugs never carry a sign.
//! - Genre labels are non-blank and never contain `,` because the list
//!   query aggregates labels into one comma-joined string.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a catalog movie.
pub type MovieId = Uuid;

/// Separator used by the aggregated genre column of list queries.
pub const GENRE_SEPARATOR: char = ',';

static SLUG_DISALLOWED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^0-9A-Za-z\s-]").expect("valid slug filter regex"));
static SLUG_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s-]+").expect("valid slug separator regex"));
static SLUG_SHAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("valid slug shape regex"));

/// Canonical catalog record.
///
/// Genres are kept in a `BTreeSet` so that equality is order-insensitive and
/// iteration is always sorted, matching the aggregate order of list queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub slug: String,
    pub year_of_release: i32,
    #[serde(default)]
    pub genres: BTreeSet<String>,
}

/// Validation failures for movie write paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovieValidationError {
    NilId,
    EmptyTitle,
    InvalidYear(i32),
    InvalidSlug(String),
    InvalidGenre(String),
}

impl Display for MovieValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NilId => write!(f, "movie id must not be nil"),
            Self::EmptyTitle => write!(f, "movie title must not be empty"),
            Self::InvalidYear(year) => {
                write!(f, "movie year of release `{year}` must be positive")
            }
            Self::InvalidSlug(slug) => {
                write!(f, "movie slug `{slug}` must match [a-z0-9-] and not be empty")
            }
            Self::InvalidGenre(label) => write!(
                f,
                "genre label `{label}` must not be blank or contain `{GENRE_SEPARATOR}`"
            ),
        }
    }
}

impl Error for MovieValidationError {}

impl Movie {
    /// Creates a movie with a generated id and a derived slug.
    pub fn new<I, S>(title: impl Into<String>, year_of_release: i32, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let title = title.into();
        Self {
            id: Uuid::new_v4(),
            slug: derive_slug(&title, year_of_release),
            title,
            year_of_release,
            genres: genres.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a movie with a caller-provided id.
    ///
    /// Used by seed/import paths where identity already exists externally.
    ///
    /// # Errors
    /// - Returns [`MovieValidationError::NilId`] for `Uuid::nil()`.
    pub fn with_id<I, S>(
        id: MovieId,
        title: impl Into<String>,
        year_of_release: i32,
        genres: I,
    ) -> Result<Self, MovieValidationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if id.is_nil() {
            return Err(MovieValidationError::NilId);
        }
        let mut movie = Self::new(title, year_of_release, genres);
        movie.id = id;
        Ok(movie)
    }

    /// Re-derives `slug` from the current title and year.
    pub fn refresh_slug(&mut self) {
        self.slug = derive_slug(&self.title, self.year_of_release);
    }

    /// Checks write-path invariants.
    pub fn validate(&self) -> Result<(), MovieValidationError> {
        if self.id.is_nil() {
            return Err(MovieValidationError::NilId);
        }
        if self.title.trim().is_empty() {
            return Err(MovieValidationError::EmptyTitle);
        }
        if self.year_of_release <= 0 {
            return Err(MovieValidationError::InvalidYear(self.year_of_release));
        }
        if !SLUG_SHAPE_RE.is_match(&self.slug) {
            return Err(MovieValidationError::InvalidSlug(self.slug.clone()));
        }
        if let Some(label) = self
            .genres
            .iter()
            .find(|label| label.trim().is_empty() || label.contains(GENRE_SEPARATOR))
        {
            return Err(MovieValidationError::InvalidGenre(label.clone()));
        }
        Ok(())
    }
}

/// Derives a URL-safe slug such as `the-matrix-1999`.
///
/// Punctuation and non-ASCII characters are dropped, runs of whitespace and
/// hyphens collapse into one `-`, and the release year is appended.
pub fn derive_slug(title: &str, year_of_release: i32) -> String {
    let filtered = SLUG_DISALLOWED_RE.replace_all(title, "");
    let lowered = filtered.to_ascii_lowercase();
    let joined = SLUG_SEPARATOR_RE.replace_all(lowered.trim(), "-");
    let stem = joined.trim_matches('-');
    if stem.is_empty() {
        return year_of_release.to_string();
    }
    format!("{stem}-{year_of_release}")
}

/// Splits an aggregated genre column back into a label set.
///
/// `None` (a movie without genre rows) and the empty string both map to an
/// empty set.
pub fn split_genre_list(aggregate: Option<&str>) -> BTreeSet<String> {
    match aggregate {
        Some(value) if !value.is_empty() => value
            .split(GENRE_SEPARATOR)
            .map(str::to_string)
            .collect(),
        _ => BTreeSet::new(),
    }
}

/// Joins labels the same way the list query aggregates them.
pub fn join_genre_list(genres: &BTreeSet<String>) -> String {
    let mut joined = String::new();
    for (index, genre) in genres.iter().enumerate() {
        if index > 0 {
            joined.push(GENRE_SEPARATOR);
        }
        joined.push_str(genre);
    }
    joined
}
