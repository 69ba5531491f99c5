//! Axum integration for the movies services.
//!
//! The catalog, reviews and aggregator binaries share the pieces in this
//! crate so their HTTP behavior stays uniform:
//!
//! ```text
//! request ──▶ RequestTracing ──▶ ValidatedJson / CorrelationId ──▶ handler
//!                                                                   │
//! response ◀── AppError (text/plain) or Json or NdJson ◀────────────┘
//! ```
//!
//! - [`AppError`]: maps validation, store and upstream failures to statuses
//! - [`ValidatedJson`]: deserialize then validate a request body
//! - [`NdJson`]: newline-delimited JSON streaming for change streams
//! - [`request_tracing_layer`]: correlation id, request span, completion log
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use movies_web::{health_check, request_tracing_layer};
//!
//! let app = Router::new()
//!     .route("/health", get(health_check))
//!     .layer(request_tracing_layer());
//! ```

pub mod error;
pub mod extractors;
pub mod health;
pub mod middleware;
pub mod ndjson;

pub use error::AppError;
pub use extractors::{CorrelationId, ValidatedJson};
pub use health::health_check;
pub use middleware::{CORRELATION_ID_HEADER, RequestTracingLayer, request_tracing_layer};
pub use ndjson::{NDJSON_CONTENT_TYPE, NdJson};

/// Result type for web handlers.
pub type WebResult<T> = Result<T, AppError>;
