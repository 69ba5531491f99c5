//! Shared request path for both upstreams: send, time out, classify, retry.
//!
//! The per-attempt timeout covers the whole exchange: connecting, the
//! response headers, and whatever part of the body the caller reads inside
//! the attempt. A body that the caller streams afterwards is guarded by
//! [`with_idle_timeout`] instead.

use async_stream::stream;
use futures::{Stream, StreamExt};
use movies_core::{Upstream, UpstreamError};
use movies_runtime::metrics::UpstreamMetrics;
use movies_runtime::retry::{RetryError, RetryPolicy, retry_with_predicate};
use reqwest::{Client, Response, StatusCode, Url};
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Per-upstream call settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    /// Retry policy applied to server faults.
    pub retry: RetryPolicy,
    /// Timeout for a single attempt, classified as a server fault when hit.
    ///
    /// Also the longest a streamed body may go without delivering a chunk.
    pub timeout: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Outcome of a classified attempt that is not an error for every caller.
#[derive(Debug)]
pub(crate) enum Classified<T> {
    /// 2xx, with whatever the caller read from the response.
    Success(T),
    /// 404; the caller decides whether that is an error.
    NotFound,
}

/// What one exchange produced before classification.
enum Exchange<T> {
    Success(T),
    NotFound,
    Failed { status: StatusCode, body: String },
}

/// A streamed body chunk could not be delivered.
#[derive(Error, Debug)]
pub(crate) enum BodyError {
    /// The connection failed mid-body.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// No chunk arrived within the idle timeout.
    #[error("no data received for {millis}ms")]
    Stalled {
        /// Idle timeout that elapsed.
        millis: u128,
    },
}

/// Pass `body` through, ending it with [`BodyError::Stalled`] once a chunk
/// takes longer than `idle` to arrive.
pub(crate) fn with_idle_timeout<S, B>(
    body: S,
    idle: Duration,
) -> impl Stream<Item = Result<B, BodyError>> + Send + 'static
where
    S: Stream<Item = Result<B, reqwest::Error>> + Send + 'static,
    B: Send + 'static,
{
    stream! {
        let mut body = Box::pin(body);
        loop {
            match tokio::time::timeout(idle, body.next()).await {
                Ok(Some(chunk)) => yield chunk.map_err(BodyError::from),
                Ok(None) => break,
                Err(_) => {
                    yield Err(BodyError::Stalled { millis: idle.as_millis() });
                    break;
                }
            }
        }
    }
}

/// HTTP access to one upstream service.
///
/// Cheap to clone: the underlying `reqwest::Client` is a pooled handle.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: Client,
    upstream: Upstream,
    base_url: Url,
    settings: ClientSettings,
}

impl UpstreamClient {
    /// Create a client for `upstream` rooted at `base_url`.
    #[must_use]
    pub const fn new(
        http: Client,
        upstream: Upstream,
        base_url: Url,
        settings: ClientSettings,
    ) -> Self {
        Self {
            http,
            upstream,
            base_url,
            settings,
        }
    }

    /// Upstream this client talks to.
    #[must_use]
    pub const fn upstream(&self) -> Upstream {
        self.upstream
    }

    /// Base URL requests are built from.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Per-attempt and body idle timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.settings.timeout
    }

    /// `GET` `url` under the retry policy and classify the final response.
    ///
    /// `read` runs on a 2xx response inside the attempt, so its time counts
    /// against the attempt timeout and its transport errors are retried.
    pub(crate) async fn get<T, F, Fut>(
        &self,
        url: &Url,
        read: F,
    ) -> Result<Classified<T>, UpstreamError>
    where
        F: Fn(Response) -> Fut,
        Fut: Future<Output = reqwest::Result<T>>,
    {
        let outcome = retry_with_predicate(
            &self.settings.retry,
            || self.attempt(url, &read),
            UpstreamError::is_retryable,
        )
        .await;

        match outcome {
            Ok(classified) => Ok(classified),
            Err(RetryError::Aborted(err)) => Err(err),
            Err(RetryError::Exhausted { attempts, last }) => Err(UpstreamError::Exhausted {
                upstream: self.upstream,
                attempts,
                cause: Box::new(last),
            }),
        }
    }

    async fn attempt<T, F, Fut>(&self, url: &Url, read: &F) -> Result<Classified<T>, UpstreamError>
    where
        F: Fn(Response) -> Fut,
        Fut: Future<Output = reqwest::Result<T>>,
    {
        let started = Instant::now();
        let upstream = self.upstream;
        let timeout = self.settings.timeout;

        let outcome = tokio::time::timeout(timeout, self.exchange(url, read)).await;
        let (status, exchange) = match outcome {
            Ok(Ok(exchanged)) => exchanged,
            Ok(Err(e)) => {
                UpstreamMetrics::record_request(upstream.as_str(), "transport", started.elapsed());
                tracing::warn!(
                    upstream = %upstream,
                    url = %url,
                    error = %e,
                    "Upstream request failed"
                );
                return Err(UpstreamError::ServerFault {
                    upstream,
                    status: StatusCode::SERVICE_UNAVAILABLE.as_u16(),
                    body: e.to_string(),
                });
            }
            Err(_) => {
                UpstreamMetrics::record_request(upstream.as_str(), "timeout", started.elapsed());
                tracing::warn!(
                    upstream = %upstream,
                    url = %url,
                    timeout_ms = timeout.as_millis(),
                    "Upstream request timed out"
                );
                return Err(UpstreamError::ServerFault {
                    upstream,
                    status: StatusCode::GATEWAY_TIMEOUT.as_u16(),
                    body: format!("upstream request timed out after {}ms", timeout.as_millis()),
                });
            }
        };

        UpstreamMetrics::record_request(upstream.as_str(), status.as_str(), started.elapsed());

        match exchange {
            Exchange::Success(value) => Ok(Classified::Success(value)),
            Exchange::NotFound => {
                tracing::info!(upstream = %upstream, url = %url, "Upstream returned 404");
                Ok(Classified::NotFound)
            }
            Exchange::Failed { status, body } => {
                tracing::info!(
                    upstream = %upstream,
                    status = status.as_u16(),
                    url = %url,
                    "Upstream returned non-success status"
                );
                if status.is_client_error() {
                    Err(UpstreamError::ClientFault {
                        upstream,
                        status: status.as_u16(),
                        body,
                    })
                } else {
                    Err(UpstreamError::ServerFault {
                        upstream,
                        status: status.as_u16(),
                        body,
                    })
                }
            }
        }
    }

    /// Send the request and read the part of the body the outcome needs.
    async fn exchange<T, F, Fut>(
        &self,
        url: &Url,
        read: &F,
    ) -> reqwest::Result<(StatusCode, Exchange<T>)>
    where
        F: Fn(Response) -> Fut,
        Fut: Future<Output = reqwest::Result<T>>,
    {
        let response = self.http.get(url.clone()).send().await?;
        let status = response.status();

        let exchange = if status.is_success() {
            Exchange::Success(read(response).await?)
        } else if status == StatusCode::NOT_FOUND {
            Exchange::NotFound
        } else {
            Exchange::Failed {
                status,
                body: response.text().await?,
            }
        };

        Ok((status, exchange))
    }
}
