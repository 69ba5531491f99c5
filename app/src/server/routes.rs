//! Routers of the three services.
//!
//! Every router serves `/health` and nests its resource under `/v1`. Requests
//! pass through the request tracing layer (correlation id and span) and the
//! `tower-http` trace layer.

use super::state::{AggregatorState, CatalogState, ReviewsState};
use crate::api::{movie_infos, movies, reviews};
use axum::{
    Router,
    routing::{get, put},
};
use movies_web::{health_check, request_tracing_layer};
use tower_http::trace::TraceLayer;

/// Catalog service router.
pub fn catalog_router(state: CatalogState) -> Router {
    let api = Router::new()
        .route(
            "/movieinfos",
            get(movie_infos::list_movie_infos).post(movie_infos::create_movie_info),
        )
        .route("/movieinfos/year", get(movie_infos::movie_infos_by_year))
        .route("/movieinfos/stream", get(movie_infos::stream_movie_infos))
        .route(
            "/movieinfos/:id",
            get(movie_infos::get_movie_info)
                .put(movie_infos::update_movie_info)
                .delete(movie_infos::delete_movie_info),
        );

    with_common_layers(api.with_state(state))
}

/// Reviews service router.
pub fn reviews_router(state: ReviewsState) -> Router {
    let api = Router::new()
        .route("/reviews", get(reviews::list_reviews).post(reviews::create_review))
        .route("/reviews/stream", get(reviews::stream_reviews))
        .route(
            "/reviews/:id",
            put(reviews::update_review).delete(reviews::delete_review),
        );

    with_common_layers(api.with_state(state))
}

/// Aggregator service router.
pub fn aggregator_router(state: AggregatorState) -> Router {
    let api = Router::new()
        .route("/movies/:id", get(movies::get_movie))
        .with_state(state);

    with_common_layers(api)
}

fn with_common_layers(api: Router) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(request_tracing_layer())
}
