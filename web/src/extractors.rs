//! Custom Axum extractors.
//!
//! - [`ValidatedJson`]: JSON body that passed its [`Validate`] checks
//! - [`CorrelationId`]: the request's correlation id
//!
//! # Examples
//!
//! ```ignore
//! use movies_web::{AppError, ValidatedJson};
//!
//! async fn create(ValidatedJson(info): ValidatedJson<MovieInfo>) -> Result<Json<MovieInfo>, AppError> {
//!     // `info` already satisfies every field constraint
//!     Ok(Json(info))
//! }
//! ```

use crate::error::AppError;
use crate::middleware::CORRELATION_ID_HEADER;
use axum::{
    Json, async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use movies_core::Validate;
use serde::de::DeserializeOwned;
use std::fmt;
use uuid::Uuid;

/// A JSON body that deserialized and validated.
///
/// Rejections:
/// - malformed JSON or wrong content type: the JSON rejection's status and text
/// - failed constraints: `400` with the sorted, joined messages
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::new(rejection.status(), rejection.body_text()))?;

        value.validate()?;
        Ok(Self(value))
    }
}

/// Correlation ID for request tracing.
///
/// Taken from the request extensions when the correlation middleware ran,
/// otherwise from the `X-Correlation-ID` header, otherwise freshly generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(pub Uuid);

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CorrelationId
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(id) = parts.extensions.get::<Self>() {
            return Ok(*id);
        }

        let id = parts
            .headers
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        Ok(Self(id))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{StatusCode, header},
        routing::post,
    };
    use movies_core::MovieInfo;
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new().route(
            "/movieinfos",
            post(|ValidatedJson(info): ValidatedJson<MovieInfo>| async move { info.name }),
        )
    }

    async fn post_json(body: &'static str) -> (StatusCode, String) {
        let request = axum::http::Request::post("/movieinfos")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn valid_body_reaches_handler() {
        let (status, body) =
            post_json(r#"{"name":"Batman Begins","year":2005,"cast":["Christian Bale"]}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Batman Begins");
    }

    #[tokio::test]
    async fn invalid_body_is_rejected_with_sorted_messages() {
        let (status, body) =
            post_json(r#"{"name":"","year":-2005,"cast":[""],"releaseDate":"2005-06-15"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            "movieInfo.cast must be present,movieInfo.name must be present,movieInfo.year must be a Positive Value"
        );
    }

    #[tokio::test]
    async fn malformed_json_is_a_client_error() {
        let (status, _) = post_json("{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
