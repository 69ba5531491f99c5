//! User-supplied rating and comment referencing a catalog entry.

use crate::validation::{Validate, ValidationError};
use serde::{Deserialize, Deserializer, Serialize};

/// Separator used when rendering review validation messages.
const MESSAGE_SEPARATOR: &str = ", ";

/// A user review of a catalog entry.
///
/// `movie_info_id` references a [`MovieInfo`](crate::MovieInfo) by id. The
/// reference is not enforced across services.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Store-assigned identifier. `None` until the first save.
    #[serde(default)]
    pub review_id: Option<String>,
    /// Catalog entry this review belongs to.
    #[serde(default, deserialize_with = "string_or_number")]
    pub movie_info_id: Option<String>,
    /// Free-form comment.
    #[serde(default)]
    pub comment: String,
    /// Non-negative rating.
    #[serde(default)]
    pub rating: f64,
}

impl Review {
    /// Create an unsaved review.
    #[must_use]
    pub fn new(movie_info_id: impl Into<String>, comment: impl Into<String>, rating: f64) -> Self {
        Self {
            review_id: None,
            movie_info_id: Some(movie_info_id.into()),
            comment: comment.into(),
            rating,
        }
    }

    /// Set the identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.review_id = Some(id.into());
        self
    }

    /// Copy `comment` and `rating` from `update`. The catalog reference is
    /// never changed after creation.
    pub fn apply_update(&mut self, update: Self) {
        self.comment = update.comment;
        self.rating = update.rating;
    }
}

impl Validate for Review {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut messages = Vec::new();

        if self.movie_info_id.as_deref().is_none_or(|id| id.trim().is_empty()) {
            messages.push("rating.movieInfoId : must not be null".to_string());
        }
        if self.rating < 0.0 || self.rating.is_nan() {
            messages.push("rating.negative : please pass a non-negative value".to_string());
        }

        ValidationError::check(messages, MESSAGE_SEPARATOR)
    }
}

/// Review documents written by older clients carry numeric catalog ids.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Reference {
        Text(String),
        Number(i64),
    }

    Ok(Option::<Reference>::deserialize(deserializer)?.map(|reference| match reference {
        Reference::Text(text) => text,
        Reference::Number(number) => number.to_string(),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn numeric_reference_is_read_as_string() {
        let body = r#"{"reviewId":"1","movieInfoId":1,"comment":"Awesome Movie","rating":9.0}"#;
        let review: Review = serde_json::from_str(body).unwrap();
        assert_eq!(review.movie_info_id.as_deref(), Some("1"));

        let json = serde_json::to_value(&review).unwrap();
        assert_eq!(json["movieInfoId"], "1");
    }

    #[test]
    fn null_reference_and_negative_rating_fail_together() {
        let body = r#"{"movieInfoId":null,"comment":"Awesome Movie","rating":-9.0}"#;
        let review: Review = serde_json::from_str(body).unwrap();

        let err = review.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "rating.movieInfoId : must not be null, rating.negative : please pass a non-negative value"
        );
    }

    #[test]
    fn zero_rating_is_allowed() {
        assert!(Review::new("abc", "meh", 0.0).validate().is_ok());
    }

    #[test]
    fn apply_update_keeps_reference() {
        let mut stored = Review::new("abc", "Awesome Movie", 9.0).with_id("r1");
        stored.apply_update(Review::new("other", "Not an Awesome Movie", 8.0));

        assert_eq!(stored.movie_info_id.as_deref(), Some("abc"));
        assert_eq!(stored.comment, "Not an Awesome Movie");
        assert!((stored.rating - 8.0).abs() < f64::EPSILON);
    }
}
