//! # Movies Runtime
//!
//! Runtime building blocks shared by the movies services.
//!
//! ## Core Components
//!
//! - **Retry**: bounded retry with fixed or exponential backoff and an
//!   error-classification predicate ([`retry`])
//! - **Change streams**: replay-latest multicast of newly created entities
//!   with per-subscriber backpressure ([`change_stream`])
//! - **Metrics**: Prometheus recorder and per-concern recorders ([`metrics`])
//!
//! ## Example
//!
//! ```rust
//! use movies_runtime::change_stream::ChangeStreamSink;
//! use movies_runtime::retry::RetryPolicy;
//!
//! let sink: ChangeStreamSink<String> = ChangeStreamSink::new("movie_info");
//! assert_eq!(sink.subscriber_count(), 0);
//!
//! let policy = RetryPolicy::default();
//! assert_eq!(policy.max_attempts(), 4);
//! ```

/// Replay-latest multicast sink for newly created entities
pub mod change_stream;

/// Prometheus metrics for observability
pub mod metrics;

/// Retry logic with fixed or exponential backoff
pub mod retry;

pub use change_stream::{ChangeStreamSink, EmitError, EmitFailurePolicy, Subscription};
pub use retry::{Backoff, RetryError, RetryPolicy, retry_with_predicate};
