//! Aggregator service.
//!
//! ```bash
//! REST_CLIENT_MOVIES_INFO_URL=http://localhost:8080/v1/movieinfos \
//! REST_CLIENT_REVIEWS_URL=http://localhost:8081/v1/reviews \
//!   cargo run --bin movies-service
//! ```

use movies::bootstrap;
use movies::config::AggregatorConfig;
use movies::server::{aggregator_router, serve, shutdown_signal};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    bootstrap::init_tracing();
    info!("Starting movies-service");

    let config = AggregatorConfig::from_env()?;
    let _metrics = bootstrap::start_metrics(config.server.metrics_addr()).await?;

    let state = bootstrap::aggregator_state(&config)?;

    let addr = config.server.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %addr, "Server listening");

    serve(
        listener,
        aggregator_router(state),
        shutdown_signal(),
        || {},
        config.server.shutdown_timeout,
    )
    .await?;

    Ok(())
}
