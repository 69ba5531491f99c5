//! Shared state of the three services.
//!
//! Each service owns its own state type; handlers receive it through
//! `State<..>` and clone it per request (every field is a cheap handle).

use movies_client::MovieComposer;
use movies_core::{MovieInfo, MovieInfoStore, Review, ReviewStore};
use movies_runtime::ChangeStreamSink;
use std::sync::Arc;

/// Catalog service state.
#[derive(Clone)]
pub struct CatalogState {
    /// Document store for catalog entries
    pub store: Arc<dyn MovieInfoStore>,
    /// Newly created entries, served at `/v1/movieinfos/stream`
    pub sink: ChangeStreamSink<MovieInfo>,
}

impl CatalogState {
    /// Create catalog state over `store` and `sink`.
    #[must_use]
    pub fn new(store: Arc<dyn MovieInfoStore>, sink: ChangeStreamSink<MovieInfo>) -> Self {
        Self { store, sink }
    }
}

/// Reviews service state.
#[derive(Clone)]
pub struct ReviewsState {
    /// Document store for reviews
    pub store: Arc<dyn ReviewStore>,
    /// Newly created reviews, served at `/v1/reviews/stream`
    pub sink: ChangeStreamSink<Review>,
}

impl ReviewsState {
    /// Create reviews state over `store` and `sink`.
    #[must_use]
    pub fn new(store: Arc<dyn ReviewStore>, sink: ChangeStreamSink<Review>) -> Self {
        Self { store, sink }
    }
}

/// Aggregator service state.
#[derive(Clone, Debug)]
pub struct AggregatorState {
    /// Upstream composition
    pub composer: Arc<MovieComposer>,
}

impl AggregatorState {
    /// Create aggregator state around `composer`.
    #[must_use]
    pub fn new(composer: MovieComposer) -> Self {
        Self {
            composer: Arc::new(composer),
        }
    }
}
