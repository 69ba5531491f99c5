//! # Movies
//!
//! Three small HTTP services over a shared domain:
//!
//! ```text
//!                  ┌────────────────────────┐
//!   GET /v1/movies │ aggregator  (:8082)    │
//!  ───────────────▶│ MovieComposer          │
//!                  └──────┬──────────┬──────┘
//!              catalog    │          │  reviews (404 = none)
//!                         ▼          ▼
//!        ┌──────────────────┐  ┌──────────────────┐
//!        │ catalog (:8080)  │  │ reviews (:8081)  │
//!        │ /v1/movieinfos   │  │ /v1/reviews      │
//!        │ + ndjson stream  │  │ + ndjson stream  │
//!        └────────┬─────────┘  └────────┬─────────┘
//!                 └──── PostgreSQL ─────┘
//! ```
//!
//! Each binary loads its configuration from the environment, installs
//! tracing (and Prometheus when `METRICS_PORT` is set), builds its state
//! and serves until Ctrl+C or SIGTERM.

pub mod api;
pub mod bootstrap;
pub mod config;
pub mod server;

pub use config::{AggregatorConfig, ConfigError, StoreServiceConfig};
pub use server::{
    AggregatorState, CatalogState, ReviewsState, aggregator_router, catalog_router, reviews_router,
};
