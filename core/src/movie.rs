//! Aggregator composite of a catalog entry and its reviews.

use crate::movie_info::MovieInfo;
use crate::review::Review;
use serde::{Deserialize, Serialize};

/// A catalog entry with every review that references it.
///
/// Built per request by the aggregator; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    /// The catalog entry.
    pub movie_info: MovieInfo,
    /// Reviews referencing the entry, in upstream order. May be empty.
    pub review_list: Vec<Review>,
}

impl Movie {
    /// Compose a movie view.
    #[must_use]
    pub const fn new(movie_info: MovieInfo, review_list: Vec<Review>) -> Self {
        Self {
            movie_info,
            review_list,
        }
    }
}
