//! Catalog endpoints.
//!
//! - GET /v1/movieinfos - List all entries
//! - GET /v1/movieinfos/year?year=N - Entries released in `N` (all when absent)
//! - GET /v1/movieinfos/:id - One entry, 404 with an empty body when missing
//! - GET /v1/movieinfos/stream - Newly created entries as ndjson
//! - POST /v1/movieinfos - Create an entry (validated)
//! - PUT /v1/movieinfos/:id - Replace the mutable fields of an entry
//! - DELETE /v1/movieinfos/:id - Delete an entry

use super::publish;
use crate::server::state::CatalogState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use futures::TryStreamExt;
use movies_core::MovieInfo;
use movies_runtime::Subscription;
use movies_web::{AppError, NdJson, ValidatedJson, WebResult};
use serde::Deserialize;

/// Query parameters of the year filter.
#[derive(Debug, Deserialize)]
pub struct YearQuery {
    /// Release year to filter by
    pub year: Option<i32>,
}

/// List every catalog entry in insertion order.
///
/// ```bash
/// curl http://localhost:8080/v1/movieinfos
/// ```
pub async fn list_movie_infos(
    State(state): State<CatalogState>,
) -> WebResult<Json<Vec<MovieInfo>>> {
    let infos = state.store.find_all().try_collect().await?;
    Ok(Json(infos))
}

/// List entries of one release year.
///
/// ```bash
/// curl 'http://localhost:8080/v1/movieinfos/year?year=2005'
/// ```
pub async fn movie_infos_by_year(
    State(state): State<CatalogState>,
    Query(query): Query<YearQuery>,
) -> WebResult<Json<Vec<MovieInfo>>> {
    let infos = match query.year {
        Some(year) => state.store.find_by_year(year).try_collect().await?,
        None => state.store.find_all().try_collect().await?,
    };
    Ok(Json(infos))
}

/// Fetch one entry by id.
pub async fn get_movie_info(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
) -> WebResult<Json<MovieInfo>> {
    state
        .store
        .find_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(AppError::not_found)
}

/// Follow newly created entries.
///
/// The most recently created entry (if any) is sent first. The response
/// stays open until the client disconnects or the service shuts down.
///
/// ```bash
/// curl -N http://localhost:8080/v1/movieinfos/stream
/// ```
pub async fn stream_movie_infos(
    State(state): State<CatalogState>,
) -> NdJson<Subscription<MovieInfo>> {
    NdJson(state.sink.subscribe())
}

/// Create an entry and announce it on the change stream.
///
/// ```bash
/// curl -X POST http://localhost:8080/v1/movieinfos \
///   -H "Content-Type: application/json" \
///   -d '{"name":"Batman Begins","year":2005,"cast":["Christian Bale"],"releaseDate":"2005-06-15"}'
/// ```
pub async fn create_movie_info(
    State(state): State<CatalogState>,
    ValidatedJson(info): ValidatedJson<MovieInfo>,
) -> WebResult<(StatusCode, Json<MovieInfo>)> {
    let saved = state.store.save(info).await?;
    tracing::info!(movie_info_id = ?saved.movie_info_id, name = %saved.name, "Movie info created");

    publish(&state.sink, saved.clone());
    Ok((StatusCode::CREATED, Json(saved)))
}

/// Copy `name`, `year`, `cast` and `releaseDate` onto an existing entry.
pub async fn update_movie_info(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
    Json(update): Json<MovieInfo>,
) -> WebResult<Json<MovieInfo>> {
    let Some(mut existing) = state.store.find_by_id(&id).await? else {
        return Err(AppError::not_found());
    };

    existing.apply_update(update);
    let saved = state.store.save(existing).await?;
    tracing::info!(movie_info_id = %id, "Movie info updated");

    Ok(Json(saved))
}

/// Delete an entry. Deleting a missing id is not an error.
pub async fn delete_movie_info(
    State(state): State<CatalogState>,
    Path(id): Path<String>,
) -> WebResult<StatusCode> {
    state.store.delete_by_id(&id).await?;
    tracing::info!(movie_info_id = %id, "Movie info deleted");
    Ok(StatusCode::NO_CONTENT)
}
