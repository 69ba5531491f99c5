//! Newline-delimited JSON streaming responses.
//!
//! Change streams are long-lived: the body never ends until the client goes
//! away or the sink completes. Each item is serialized on its own line.

use axum::{
    body::Body,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use futures::{Stream, StreamExt};
use serde::Serialize;

/// Content type of [`NdJson`] responses.
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Streams every item of `S` as one JSON document per line.
///
/// ```ignore
/// async fn stream(State(state): State<CatalogState>) -> NdJson<Subscription<MovieInfo>> {
///     NdJson(state.sink.subscribe())
/// }
/// ```
#[derive(Debug)]
pub struct NdJson<S>(pub S);

impl<S, T> IntoResponse for NdJson<S>
where
    S: Stream<Item = T> + Send + 'static,
    T: Serialize,
{
    fn into_response(self) -> Response {
        let lines = self.0.map(|item| {
            let mut line = serde_json::to_vec(&item)?;
            line.push(b'\n');
            Ok::<_, serde_json::Error>(line)
        });

        let mut response = Body::from_stream(lines).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(NDJSON_CONTENT_TYPE),
        );
        response
    }
}
