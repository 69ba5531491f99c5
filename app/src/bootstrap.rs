//! Process setup shared by the three binaries.
//!
//! Tracing, the optional Prometheus endpoint, and construction of each
//! service's state from its configuration.

use crate::config::{AggregatorConfig, DatabaseConfig, StoreServiceConfig};
use crate::server::{AggregatorState, CatalogState, ReviewsState};
use anyhow::Context;
use axum::{Router, routing::get};
use movies_client::MovieComposer;
use movies_postgres::{PgPool, PostgresMovieInfoStore, PostgresReviewStore};
use movies_runtime::ChangeStreamSink;
use movies_runtime::change_stream::EmitFailurePolicy;
use movies_runtime::metrics::MetricsServer;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,movies=debug,sqlx=warn";

/// Load `.env` (if present) and install the global tracing subscriber.
pub fn init_tracing() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(fmt::layer())
        .init();
}

/// Install the Prometheus recorder and serve `GET /metrics` on `addr`.
///
/// Returns `None` when `addr` is `None`.
///
/// # Errors
///
/// Returns an error if the recorder cannot be installed or the listener
/// cannot bind.
pub async fn start_metrics(addr: Option<SocketAddr>) -> anyhow::Result<Option<JoinHandle<()>>> {
    let Some(addr) = addr else {
        return Ok(None);
    };

    let mut metrics = MetricsServer::new(addr);
    metrics.start().context("installing metrics recorder")?;

    let handle = metrics.handle().cloned();
    let router = Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.map(|h| h.render()).unwrap_or_default() }
        }),
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding metrics listener on {addr}"))?;

    Ok(Some(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!(error = %e, "Metrics server failed");
        }
    })))
}

async fn connect_store(database: &DatabaseConfig) -> anyhow::Result<PgPool> {
    info!(max_connections = database.max_connections, "Connecting to document store...");
    let pool = movies_postgres::connect(&database.url, database.max_connections)
        .await
        .context("connecting to document store")?;
    movies_postgres::migrate(&pool)
        .await
        .context("running document store migrations")?;
    info!("Document store ready");
    Ok(pool)
}

/// Connect the catalog store and create its change stream.
///
/// # Errors
///
/// Returns an error if the store is unreachable or cannot be migrated.
pub async fn catalog_state(config: &StoreServiceConfig) -> anyhow::Result<CatalogState> {
    let pool = connect_store(&config.database).await?;
    Ok(CatalogState::new(
        Arc::new(PostgresMovieInfoStore::new(pool)),
        ChangeStreamSink::with_options(
            "movie_info",
            config.change_stream_buffer,
            EmitFailurePolicy::FailFast,
        ),
    ))
}

/// Connect the reviews store and create its change stream.
///
/// # Errors
///
/// Returns an error if the store is unreachable or cannot be migrated.
pub async fn reviews_state(config: &StoreServiceConfig) -> anyhow::Result<ReviewsState> {
    let pool = connect_store(&config.database).await?;
    Ok(ReviewsState::new(
        Arc::new(PostgresReviewStore::new(pool)),
        ChangeStreamSink::with_options(
            "review",
            config.change_stream_buffer,
            EmitFailurePolicy::FailFast,
        ),
    ))
}

/// Build the shared HTTP client and both upstream clients.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn aggregator_state(config: &AggregatorConfig) -> anyhow::Result<AggregatorState> {
    let http = reqwest::Client::builder()
        .build()
        .context("building HTTP client")?;

    let rest = &config.rest_client;
    info!(
        movies_info_url = %rest.movies_info_url,
        reviews_url = %rest.reviews_url,
        max_retries = rest.max_retries,
        "Upstreams configured"
    );

    Ok(AggregatorState::new(MovieComposer::from_urls(
        http,
        rest.movies_info_url.clone(),
        rest.reviews_url.clone(),
        rest.settings(),
    )))
}
