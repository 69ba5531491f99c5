//! # Movies Core
//!
//! Domain types and contracts shared by the catalog, reviews and aggregator
//! services.
//!
//! This crate performs no I/O. It defines:
//!
//! - **Entities**: [`MovieInfo`], [`Review`] and the aggregator-only composite [`Movie`]
//! - **Validation**: the [`Validate`] trait and the sorted, joined [`ValidationError`]
//! - **Upstream errors**: the [`UpstreamError`] taxonomy the aggregator classifies
//!   HTTP responses into
//! - **Stores**: the [`MovieInfoStore`] and [`ReviewStore`] document-store contracts
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   catalog    │   │   reviews    │   │  aggregator  │
//! │ MovieInfo    │   │ Review       │   │ Movie        │
//! │ MovieInfo-   │   │ ReviewStore  │   │ UpstreamError│
//! │   Store      │   │              │   │              │
//! └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!        └─────────── movies-core ──────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use movies_core::{MovieInfo, Validate};
//!
//! let info = MovieInfo::new("Batman Begins", 2005, vec!["Christian Bale".to_string()]);
//! assert!(info.validate().is_ok());
//! ```

pub mod error;
pub mod movie;
pub mod movie_info;
pub mod review;
pub mod store;
pub mod validation;

// Re-export commonly used types
pub use error::{Upstream, UpstreamError};
pub use movie::Movie;
pub use movie_info::MovieInfo;
pub use review::Review;
pub use store::{EntityStream, MovieInfoStore, ReviewStore, StoreError, StoreFuture};
pub use validation::{Validate, ValidationError};

pub use chrono::NaiveDate;
