//! # Movies Client
//!
//! The aggregator's upstream layer: non-blocking HTTP clients for the
//! catalog and reviews services and the composer that joins their results.
//!
//! ## Request path
//!
//! ```text
//! MovieComposer::retrieve_movie(id)
//!   │
//!   ├─► MoviesInfoRestClient ── GET {catalog}/{id} ───────────┐
//!   │                                                         │
//!   └─► ReviewsRestClient ───── GET {reviews}?movieInfoId=id ─┤  (only after catalog succeeded)
//!                                                             ▼
//!                              UpstreamClient: timeout ─► classify ─► retry 5xx
//!                                                             │
//!                        2xx ─► decode   404 ─► NotFound / empty   4xx ─► ClientFault
//!                                                             5xx ─► ServerFault ─► Exhausted
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use movies_client::{ClientSettings, MovieComposer};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let composer = MovieComposer::from_urls(
//!     reqwest::Client::new(),
//!     "http://localhost:8080/v1/movieinfos".parse()?,
//!     "http://localhost:8081/v1/reviews".parse()?,
//!     ClientSettings::default(),
//! );
//!
//! let movie = composer.retrieve_movie("abc").await?;
//! println!("{} has {} reviews", movie.movie_info.name, movie.review_list.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod composer;
pub mod json_stream;
pub mod movie_info;
pub mod reviews;

pub use client::{ClientSettings, UpstreamClient};
pub use composer::MovieComposer;
pub use json_stream::{JsonArrayDecoder, JsonStreamError, UpstreamStream, decode_json_array};
pub use movie_info::MoviesInfoRestClient;
pub use reviews::ReviewsRestClient;
