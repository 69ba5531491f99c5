//! Error taxonomy for calls from the aggregator to its upstreams.
//!
//! Every non-2xx response, timeout or undecodable body is classified into
//! exactly one [`UpstreamError`] variant. Only [`UpstreamError::ServerFault`]
//! is retryable; when retries run out the last fault is wrapped in
//! [`UpstreamError::Exhausted`].

use std::fmt;
use thiserror::Error;

/// Which upstream service a call targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Upstream {
    /// The catalog (`movie-info`) service.
    MoviesInfo,
    /// The reviews service.
    Reviews,
}

impl Upstream {
    /// Label used in composite server-fault messages.
    #[must_use]
    pub const fn service_name(self) -> &'static str {
        match self {
            Self::MoviesInfo => "MoviesInfoService",
            Self::Reviews => "ReviewService",
        }
    }

    /// Short label used for metrics and log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MoviesInfo => "movies_info",
            Self::Reviews => "reviews",
        }
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.service_name())
    }
}

/// Failure of a single upstream call.
///
/// The `Display` form of each variant is the plain-text body the aggregator
/// returns to its own caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UpstreamError {
    /// Upstream answered 404 for the requested id.
    #[error("There is no MovieInfo Available for the passed in id: {id}")]
    NotFound {
        /// Upstream that answered.
        upstream: Upstream,
        /// Requested id.
        id: String,
    },

    /// Upstream answered a 4xx other than 404.
    #[error("{body}")]
    ClientFault {
        /// Upstream that answered.
        upstream: Upstream,
        /// HTTP status returned.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// Upstream answered 5xx, timed out or could not be reached. Retryable.
    #[error("Server Exception in {upstream}{body}")]
    ServerFault {
        /// Upstream that answered.
        upstream: Upstream,
        /// HTTP status returned (synthesized for timeouts and connect errors).
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// Retries ran out; `cause` is the last fault observed.
    #[error("{cause}")]
    Exhausted {
        /// Upstream that kept failing.
        upstream: Upstream,
        /// Total attempts made, including the first.
        attempts: usize,
        /// Last fault observed.
        cause: Box<UpstreamError>,
    },

    /// A success response carried a body that could not be decoded.
    #[error("Failed to decode response from {upstream}: {message}")]
    Decode {
        /// Upstream that answered.
        upstream: Upstream,
        /// Decoder message.
        message: String,
    },
}

impl UpstreamError {
    /// Upstream the error came from.
    #[must_use]
    pub const fn upstream(&self) -> Upstream {
        match self {
            Self::NotFound { upstream, .. }
            | Self::ClientFault { upstream, .. }
            | Self::ServerFault { upstream, .. }
            | Self::Exhausted { upstream, .. }
            | Self::Decode { upstream, .. } => *upstream,
        }
    }

    /// Whether the retry policy may re-attempt the call.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ServerFault { .. })
    }

    /// The upstream HTTP status behind this error, if one was observed.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::ClientFault { status, .. } | Self::ServerFault { status, .. } => Some(*status),
            Self::Exhausted { cause, .. } => cause.status(),
            Self::Decode { .. } => None,
        }
    }
}
