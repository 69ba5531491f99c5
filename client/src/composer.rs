//! Composes the aggregator's `Movie` view from both upstreams.

use crate::client::{ClientSettings, UpstreamClient};
use crate::movie_info::MoviesInfoRestClient;
use crate::reviews::ReviewsRestClient;
use futures::TryStreamExt;
use movies_core::{Movie, Review, Upstream, UpstreamError};
use reqwest::{Client, Url};

/// Catalog first, then reviews.
///
/// The reviews call starts only after the catalog call succeeded, so a
/// catalog failure is reported without any review traffic.
#[derive(Debug, Clone)]
pub struct MovieComposer {
    movies_info: MoviesInfoRestClient,
    reviews: ReviewsRestClient,
}

impl MovieComposer {
    /// Create a composer over the two upstream clients.
    #[must_use]
    pub const fn new(movies_info: MoviesInfoRestClient, reviews: ReviewsRestClient) -> Self {
        Self { movies_info, reviews }
    }

    /// Build both upstream clients over one shared `reqwest::Client`.
    #[must_use]
    pub fn from_urls(
        http: Client,
        movies_info_url: Url,
        reviews_url: Url,
        settings: ClientSettings,
    ) -> Self {
        Self::new(
            MoviesInfoRestClient::new(UpstreamClient::new(
                http.clone(),
                Upstream::MoviesInfo,
                movies_info_url,
                settings.clone(),
            )),
            ReviewsRestClient::new(UpstreamClient::new(
                http,
                Upstream::Reviews,
                reviews_url,
                settings,
            )),
        )
    }

    /// Fetch the catalog entry and all of its reviews.
    ///
    /// # Errors
    ///
    /// Propagates the first [`UpstreamError`] from either upstream. A reviews
    /// 404 is not an error and yields an empty `review_list`.
    pub async fn retrieve_movie(&self, movie_info_id: &str) -> Result<Movie, UpstreamError> {
        let movie_info = self.movies_info.retrieve_movie_info(movie_info_id).await?;

        let review_list: Vec<Review> = self
            .reviews
            .retrieve_reviews(movie_info_id)
            .try_collect()
            .await?;

        tracing::debug!(
            movie_info_id,
            reviews = review_list.len(),
            "Composed movie"
        );
        Ok(Movie::new(movie_info, review_list))
    }
}
