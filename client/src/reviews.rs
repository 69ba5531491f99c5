//! Reviews upstream client.

use crate::client::{Classified, UpstreamClient, with_idle_timeout};
use crate::json_stream::{UpstreamStream, decode_json_array};
use async_stream::stream;
use movies_core::{Review, Upstream};
use reqwest::{Response, Url};

/// Streams the reviews of a catalog entry.
#[derive(Debug, Clone)]
pub struct ReviewsRestClient {
    client: UpstreamClient,
}

impl ReviewsRestClient {
    /// Wrap an [`UpstreamClient`] pointed at the reviews service's `/v1/reviews`.
    #[must_use]
    pub const fn new(client: UpstreamClient) -> Self {
        Self { client }
    }

    /// `GET {base}?movieInfoId={id}`, decoded element by element.
    ///
    /// Nothing is sent until the stream is first polled. A 404 yields an empty
    /// stream. The retry policy covers the request up to the response status;
    /// once the body is streaming, failures end the stream with
    /// [`UpstreamError::Decode`](movies_core::UpstreamError::Decode). That
    /// includes a body that delivers no chunk for the client timeout.
    #[must_use]
    pub fn retrieve_reviews(&self, movie_info_id: &str) -> UpstreamStream<Review> {
        let client = self.client.clone();
        let url = self.query_url(movie_info_id);

        Box::pin(stream! {
            let headers_only =
                |response: Response| std::future::ready(Ok::<_, reqwest::Error>(response));
            match client.get(&url, headers_only).await {
                Ok(Classified::Success(response)) => {
                    let body = with_idle_timeout(response.bytes_stream(), client.timeout());
                    let reviews = decode_json_array::<Review, _, _, _>(Upstream::Reviews, body);
                    for await review in reviews {
                        yield review;
                    }
                }
                Ok(Classified::NotFound) => {
                    tracing::debug!(url = %url, "No reviews found upstream");
                }
                Err(e) => yield Err(e),
            }
        })
    }

    fn query_url(&self, movie_info_id: &str) -> Url {
        let mut url = self.client.base_url().clone();
        url.query_pairs_mut().append_pair("movieInfoId", movie_info_id);
        url
    }
}
