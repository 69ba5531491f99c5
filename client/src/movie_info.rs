//! Catalog (`movie-info`) upstream client.

use crate::client::{Classified, UpstreamClient};
use movies_core::{MovieInfo, Upstream, UpstreamError};
use reqwest::{Response, Url};

/// Fetches single catalog entries by id.
#[derive(Debug, Clone)]
pub struct MoviesInfoRestClient {
    client: UpstreamClient,
}

impl MoviesInfoRestClient {
    /// Wrap an [`UpstreamClient`] pointed at the catalog's `/v1/movieinfos`.
    #[must_use]
    pub const fn new(client: UpstreamClient) -> Self {
        Self { client }
    }

    /// `GET {base}/{id}`.
    ///
    /// # Errors
    ///
    /// - [`UpstreamError::NotFound`] when the catalog answers 404.
    /// - [`UpstreamError::ClientFault`] for any other 4xx.
    /// - [`UpstreamError::Exhausted`] once server faults outlast the retry
    ///   policy. A body that does not arrive within the attempt timeout is a
    ///   server fault.
    /// - [`UpstreamError::Decode`] when the 2xx body is not a `MovieInfo`.
    pub async fn retrieve_movie_info(
        &self,
        movie_info_id: &str,
    ) -> Result<MovieInfo, UpstreamError> {
        let url = self.item_url(movie_info_id);

        match self.client.get(&url, Response::bytes).await? {
            Classified::Success(body) => {
                serde_json::from_slice::<MovieInfo>(&body).map_err(|e| UpstreamError::Decode {
                    upstream: Upstream::MoviesInfo,
                    message: e.to_string(),
                })
            }
            Classified::NotFound => Err(UpstreamError::NotFound {
                upstream: Upstream::MoviesInfo,
                id: movie_info_id.to_string(),
            }),
        }
    }

    fn item_url(&self, movie_info_id: &str) -> Url {
        let mut url = self.client.base_url().clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(movie_info_id);
        }
        url
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::client::ClientSettings;

    fn client(base: &str) -> MoviesInfoRestClient {
        MoviesInfoRestClient::new(UpstreamClient::new(
            reqwest::Client::new(),
            Upstream::MoviesInfo,
            Url::parse(base).unwrap(),
            ClientSettings::default(),
        ))
    }

    #[test]
    fn item_url_appends_the_encoded_id() {
        let client = client("http://localhost:8080/v1/movieinfos");
        assert_eq!(
            client.item_url("abc").as_str(),
            "http://localhost:8080/v1/movieinfos/abc"
        );
        assert_eq!(
            client.item_url("a b/c").as_str(),
            "http://localhost:8080/v1/movieinfos/a%20b%2Fc"
        );
    }

    #[test]
    fn item_url_tolerates_a_trailing_slash() {
        let client = client("http://localhost:8080/v1/movieinfos/");
        assert_eq!(
            client.item_url("abc").as_str(),
            "http://localhost:8080/v1/movieinfos/abc"
        );
    }
}
