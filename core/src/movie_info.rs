//! Catalog entry describing a film.

use crate::validation::{Validate, ValidationError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Separator used when rendering catalog validation messages.
const MESSAGE_SEPARATOR: &str = ",";

/// A catalog entry describing a film.
///
/// The same type is used as the request payload and as the persisted
/// document, so every field tolerates being absent on the wire: missing
/// fields are reported by [`Validate::validate`] rather than by the JSON
/// decoder.
///
/// # Examples
///
/// ```
/// use movies_core::MovieInfo;
///
/// let json = r#"{"name":"Batman Begins","year":2005,"cast":["Christian Bale"],"releaseDate":"2005-06-15"}"#;
/// let info: MovieInfo = serde_json::from_str(json).unwrap();
/// assert_eq!(info.movie_info_id, None);
/// assert_eq!(info.year, Some(2005));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieInfo {
    /// Store-assigned identifier. `None` until the first save.
    #[serde(default)]
    pub movie_info_id: Option<String>,
    /// Title of the film.
    #[serde(default)]
    pub name: String,
    /// Release year.
    #[serde(default)]
    pub year: Option<i32>,
    /// Ordered cast list.
    #[serde(default)]
    pub cast: Vec<String>,
    /// Calendar release date.
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
}

impl MovieInfo {
    /// Create an unsaved entry with no release date.
    #[must_use]
    pub fn new(name: impl Into<String>, year: i32, cast: Vec<String>) -> Self {
        Self {
            movie_info_id: None,
            name: name.into(),
            year: Some(year),
            cast,
            release_date: None,
        }
    }

    /// Set the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.movie_info_id = Some(id.into());
        self
    }

    /// Set the release date.
    #[must_use]
    pub const fn with_release_date(mut self, date: NaiveDate) -> Self {
        self.release_date = Some(date);
        self
    }

    /// Copy every mutable field from `update`, keeping this entry's id.
    pub fn apply_update(&mut self, update: Self) {
        self.name = update.name;
        self.year = update.year;
        self.cast = update.cast;
        self.release_date = update.release_date;
    }
}

impl Validate for MovieInfo {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut messages = Vec::new();

        if self.name.trim().is_empty() {
            messages.push("movieInfo.name must be present".to_string());
        }
        if !self.year.is_some_and(|year| year > 0) {
            messages.push("movieInfo.year must be a Positive Value".to_string());
        }
        if self.cast.is_empty() || self.cast.iter().any(|member| member.trim().is_empty()) {
            messages.push("movieInfo.cast must be present".to_string());
        }

        ValidationError::check(messages, MESSAGE_SEPARATOR)
    }
}
