//! Reviews endpoints.
//!
//! - GET /v1/reviews[?movieInfoId=X] - All reviews, or those of one entry
//! - GET /v1/reviews/stream - Newly created reviews as ndjson
//! - POST /v1/reviews - Create a review (validated)
//! - PUT /v1/reviews/:id - Change `comment` and `rating` (validated)
//! - DELETE /v1/reviews/:id - Delete a review

use super::publish;
use crate::server::state::ReviewsState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use futures::TryStreamExt;
use movies_core::Review;
use movies_runtime::Subscription;
use movies_web::{AppError, NdJson, ValidatedJson, WebResult};
use serde::Deserialize;

/// Query parameters of the review listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsQuery {
    /// Only reviews of this catalog entry
    pub movie_info_id: Option<String>,
}

/// List reviews.
///
/// ```bash
/// curl 'http://localhost:8081/v1/reviews?movieInfoId=1'
/// ```
pub async fn list_reviews(
    State(state): State<ReviewsState>,
    Query(query): Query<ReviewsQuery>,
) -> WebResult<Json<Vec<Review>>> {
    let reviews = match query.movie_info_id.as_deref() {
        Some(movie_info_id) => {
            state
                .store
                .find_by_movie_info_id(movie_info_id)
                .try_collect()
                .await?
        }
        None => state.store.find_all().try_collect().await?,
    };
    Ok(Json(reviews))
}

/// Follow newly created reviews.
pub async fn stream_reviews(State(state): State<ReviewsState>) -> NdJson<Subscription<Review>> {
    NdJson(state.sink.subscribe())
}

/// Create a review and announce it on the change stream.
///
/// ```bash
/// curl -X POST http://localhost:8081/v1/reviews \
///   -H "Content-Type: application/json" \
///   -d '{"movieInfoId":"1","comment":"Awesome Movie","rating":9.0}'
/// ```
pub async fn create_review(
    State(state): State<ReviewsState>,
    ValidatedJson(review): ValidatedJson<Review>,
) -> WebResult<(StatusCode, Json<Review>)> {
    let saved = state.store.save(review).await?;
    tracing::info!(
        review_id = ?saved.review_id,
        movie_info_id = ?saved.movie_info_id,
        "Review created"
    );

    publish(&state.sink, saved.clone());
    Ok((StatusCode::CREATED, Json(saved)))
}

/// Change the comment and rating of an existing review.
///
/// The stored `movieInfoId` is kept even when the body names another one.
pub async fn update_review(
    State(state): State<ReviewsState>,
    Path(id): Path<String>,
    ValidatedJson(update): ValidatedJson<Review>,
) -> WebResult<Json<Review>> {
    let Some(mut existing) = state.store.find_by_id(&id).await? else {
        return Err(AppError::not_found());
    };

    existing.apply_update(update);
    let saved = state.store.save(existing).await?;
    tracing::info!(review_id = %id, "Review updated");

    Ok(Json(saved))
}

/// Delete a review if it exists; always 204.
pub async fn delete_review(
    State(state): State<ReviewsState>,
    Path(id): Path<String>,
) -> WebResult<StatusCode> {
    if state.store.find_by_id(&id).await?.is_some() {
        state.store.delete_by_id(&id).await?;
        tracing::info!(review_id = %id, "Review deleted");
    }
    Ok(StatusCode::NO_CONTENT)
}
