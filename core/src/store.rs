//! Document-store contracts for catalog entries and reviews.
//!
//! The catalog and reviews services persist their entities through these
//! traits. `save` assigns an id when the entity has none and otherwise
//! upserts by id; there is no optimistic-concurrency token.
//!
//! # Implementations
//!
//! - `PostgresMovieInfoStore` / `PostgresReviewStore` (in `movies-postgres`): JSONB documents
//! - `InMemoryMovieInfoStore` / `InMemoryReviewStore` (in `movies-testing`): tests
//!
//! # Dyn Compatibility
//!
//! Methods return `Pin<Box<dyn Future>>` instead of using `async fn` so the
//! services can hold `Arc<dyn MovieInfoStore>` in their router state.
//!
//! # Example
//!
//! ```no_run
//! use futures::TryStreamExt;
//! use movies_core::{MovieInfo, MovieInfoStore, StoreError};
//!
//! async fn example(store: &dyn MovieInfoStore) -> Result<(), StoreError> {
//!     let saved = store
//!         .save(MovieInfo::new("Batman Begins", 2005, vec!["Christian Bale".into()]))
//!         .await?;
//!     assert!(saved.movie_info_id.is_some());
//!
//!     let from_2005: Vec<MovieInfo> = store.find_by_year(2005).try_collect().await?;
//!     assert_eq!(from_2005.len(), 1);
//!     Ok(())
//! }
//! ```

use crate::movie_info::MovieInfo;
use crate::review::Review;
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors raised by a store backend.
///
/// Services do not remap these; they surface as `500`.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to reach the backend
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Backend rejected or failed a query
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// A document could not be encoded or decoded
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Lazily produced sequence of entities.
pub type EntityStream<T> = Pin<Box<dyn Stream<Item = Result<T, StoreError>> + Send>>;

/// Boxed future returned by store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Persistence for [`MovieInfo`] documents.
pub trait MovieInfoStore: Send + Sync {
    /// Every entry, in insertion order.
    fn find_all(&self) -> EntityStream<MovieInfo>;

    /// Entry with the given id, if any.
    fn find_by_id(&self, id: &str) -> StoreFuture<'_, Option<MovieInfo>>;

    /// Entries released in `year`.
    fn find_by_year(&self, year: i32) -> EntityStream<MovieInfo>;

    /// First entry whose name matches exactly, if any.
    fn find_by_name(&self, name: &str) -> StoreFuture<'_, Option<MovieInfo>>;

    /// Insert or replace. Assigns an id when `movie_info_id` is `None`.
    fn save(&self, movie_info: MovieInfo) -> StoreFuture<'_, MovieInfo>;

    /// Remove the entry with the given id. Missing ids are not an error.
    fn delete_by_id(&self, id: &str) -> StoreFuture<'_, ()>;

    /// Remove every entry.
    fn delete_all(&self) -> StoreFuture<'_, ()>;
}

/// Persistence for [`Review`] documents.
pub trait ReviewStore: Send + Sync {
    /// Every review, in insertion order.
    fn find_all(&self) -> EntityStream<Review>;

    /// Review with the given id, if any.
    fn find_by_id(&self, id: &str) -> StoreFuture<'_, Option<Review>>;

    /// Reviews referencing the given catalog entry.
    fn find_by_movie_info_id(&self, movie_info_id: &str) -> EntityStream<Review>;

    /// Insert or replace. Assigns an id when `review_id` is `None`.
    fn save(&self, review: Review) -> StoreFuture<'_, Review>;

    /// Remove the review with the given id. Missing ids are not an error.
    fn delete_by_id(&self, id: &str) -> StoreFuture<'_, ()>;

    /// Remove every review.
    fn delete_all(&self) -> StoreFuture<'_, ()>;
}
