//! Request tracing middleware.
//!
//! Every request gets a correlation id (taken from `X-Correlation-ID` when it
//! is a valid UUID, generated otherwise), runs inside an `http_request` span
//! carrying that id, and logs its status and latency on completion. The id is
//! echoed back in the response header.
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use movies_web::middleware::request_tracing_layer;
//!
//! let app = Router::new()
//!     .route("/v1/movieinfos", get(list))
//!     .layer(request_tracing_layer());
//! ```

use crate::extractors::CorrelationId;
use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    response::Response,
};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

/// Header name for correlation ID.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

const CORRELATION_ID_NAME: HeaderName = HeaderName::from_static("x-correlation-id");

/// Create the request tracing layer.
#[must_use]
pub const fn request_tracing_layer() -> RequestTracingLayer {
    RequestTracingLayer
}

/// Layer for [`RequestTracing`].
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestTracingLayer;

impl<S> Layer<S> for RequestTracingLayer {
    type Service = RequestTracing<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestTracing { inner }
    }
}

/// Middleware service that assigns correlation ids and traces requests.
#[derive(Clone, Debug)]
pub struct RequestTracing<S> {
    inner: S,
}

impl<S> Service<Request> for RequestTracing<S>
where
    S: Service<Request, Response = Response> + Send + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request) -> Self::Future {
        let correlation_id = req
            .headers()
            .get(CORRELATION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_else(Uuid::new_v4);

        req.extensions_mut().insert(CorrelationId(correlation_id));

        let span = tracing::info_span!(
            "http_request",
            correlation_id = %correlation_id,
            method = %req.method(),
            uri = %req.uri(),
        );
        let started = Instant::now();
        let fut = self.inner.call(req);

        Box::pin(
            async move {
                let mut response = fut.await?;

                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = started.elapsed().as_millis(),
                    "Request completed"
                );

                if let Ok(value) = HeaderValue::from_str(&correlation_id.to_string()) {
                    response.headers_mut().insert(CORRELATION_ID_NAME, value);
                }
                Ok(response)
            }
            .instrument(span),
        )
    }
}
