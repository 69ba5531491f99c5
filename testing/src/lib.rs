//! # Movies Testing
//!
//! Testing utilities for the movies services.
//!
//! This crate provides:
//! - In-memory implementations of the store contracts
//! - Canonical fixtures for catalog entries and reviews
//!
//! ## Example
//!
//! ```
//! use movies_core::MovieInfoStore;
//! use movies_testing::{InMemoryMovieInfoStore, fixtures};
//!
//! # async fn example() -> Result<(), movies_core::StoreError> {
//! let store = InMemoryMovieInfoStore::new();
//! for info in fixtures::movie_infos() {
//!     store.save(info).await?;
//! }
//! assert_eq!(store.len(), 3);
//! # Ok(())
//! # }
//! ```

pub mod fixtures;
pub mod stores;

pub use stores::{InMemoryMovieInfoStore, InMemoryReviewStore};
