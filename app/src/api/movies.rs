//! Aggregator endpoint.
//!
//! - GET /v1/movies/:id - Catalog entry plus its reviews

use crate::server::state::AggregatorState;
use axum::{
    Json,
    extract::{Path, State},
};
use movies_core::Movie;
use movies_web::{CorrelationId, WebResult};

/// Compose a movie from the catalog and reviews services.
///
/// Upstream failures are mapped by `AppError`: a missing catalog entry is a
/// 404 with an explanatory body, exhausted retries a 500.
///
/// ```bash
/// curl http://localhost:8082/v1/movies/abc
/// ```
pub async fn get_movie(
    State(state): State<AggregatorState>,
    Path(id): Path<String>,
    correlation_id: CorrelationId,
) -> WebResult<Json<Movie>> {
    tracing::debug!(movie_info_id = %id, %correlation_id, "Composing movie");
    let movie = state.composer.retrieve_movie(&id).await?;
    Ok(Json(movie))
}
