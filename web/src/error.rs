//! Error type for web handlers.
//!
//! Every error body is plain text: the validation message list, the
//! aggregator's upstream message, or nothing at all for a bare 404.

use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use movies_core::{StoreError, UpstreamError, ValidationError};
use std::fmt;

/// Application error type for web handlers.
///
/// Converts into a plain-text response. Server errors are logged together
/// with their `source`, which is never sent to the client.
///
/// # Examples
///
/// ```ignore
/// async fn handler(Path(id): Path<String>) -> Result<Json<MovieInfo>, AppError> {
///     let info = store.find_by_id(&id).await?.ok_or_else(AppError::not_found)?;
///     Ok(Json(info))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create an error with an explicit status and body.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            source: None,
        }
    }

    /// Attach an internal error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// 400 with the given body.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// 404 with an empty body.
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, String::new())
    }

    /// 500 with a generic body.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// 502 with the given body.
    #[must_use]
    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    /// HTTP status of the response.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Response body.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    message = %self.message,
                    error = %source,
                    "Request failed"
                ),
                None => tracing::error!(
                    status = %self.status,
                    message = %self.message,
                    "Request failed"
                ),
            }
        } else {
            tracing::debug!(status = %self.status, message = %self.message, "Request rejected");
        }

        if self.message.is_empty() {
            return self.status.into_response();
        }

        (
            self.status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.message,
        )
            .into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::bad_request(err.to_string())
    }
}

/// Store failures are not remapped: 500, details only in the log.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::internal("An internal error occurred").with_source(err.into())
    }
}

/// Aggregator mapping of upstream failures.
impl From<UpstreamError> for AppError {
    fn from(err: UpstreamError) -> Self {
        let message = err.to_string();
        let mapped = match &err {
            UpstreamError::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, message),
            UpstreamError::ClientFault { .. } | UpstreamError::Decode { .. } => {
                Self::bad_gateway(message)
            }
            UpstreamError::ServerFault { .. } | UpstreamError::Exhausted { .. } => {
                Self::internal(message)
            }
        };

        if let Some(upstream_status) = err.status() {
            tracing::warn!(
                upstream = %err.upstream(),
                upstream_status,
                status = %mapped.status,
                "Upstream call failed"
            );
        }

        mapped
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use movies_core::Upstream;

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn display_includes_status() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[400] Invalid input");
    }

    #[tokio::test]
    async fn not_found_has_empty_body() {
        let response = AppError::not_found().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "");
    }

    #[tokio::test]
    async fn validation_error_is_plain_text_400() {
        let err = ValidationError::new(
            [
                "movieInfo.name must be present".to_string(),
                "movieInfo.cast must be present".to_string(),
            ],
            ",",
        );
        let response = AppError::from(err).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; charset=utf-8"
        );
        assert_eq!(
            body_text(response).await,
            "movieInfo.cast must be present,movieInfo.name must be present"
        );
    }

    #[test]
    fn upstream_errors_map_to_statuses() {
        let not_found = UpstreamError::NotFound {
            upstream: Upstream::MoviesInfo,
            id: "abc".to_string(),
        };
        let client_fault = UpstreamError::ClientFault {
            upstream: Upstream::MoviesInfo,
            status: 400,
            body: "bad".to_string(),
        };
        let exhausted = UpstreamError::Exhausted {
            upstream: Upstream::Reviews,
            attempts: 4,
            cause: Box::new(UpstreamError::ServerFault {
                upstream: Upstream::Reviews,
                status: 500,
                body: "down".to_string(),
            }),
        };

        let decode = UpstreamError::Decode {
            upstream: Upstream::Reviews,
            message: "response body interrupted".to_string(),
        };

        assert_eq!(AppError::from(not_found).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::from(client_fault).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(AppError::from(decode).status(), StatusCode::BAD_GATEWAY);

        let err = AppError::from(exhausted);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Server Exception in ReviewServicedown");
    }

    #[test]
    fn store_error_hides_details() {
        let err = AppError::from(StoreError::DatabaseError("relation missing".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "An internal error occurred");
        assert!(std::error::Error::source(&err).is_some());
    }
}
