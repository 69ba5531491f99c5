//! HTTP server plumbing shared by the three binaries.
//!
//! - Application state per service
//! - Routers
//! - Serving with graceful shutdown

pub mod routes;
pub mod state;

pub use routes::{aggregator_router, catalog_router, reviews_router};
pub use state::{AggregatorState, CatalogState, ReviewsState};

use axum::Router;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::Notify;
use tracing::{error, info, warn};

/// Serve `app` on `listener` until `shutdown` resolves.
///
/// `on_shutdown` runs as soon as the signal arrives, before waiting for
/// in-flight requests; the services use it to complete their change streams
/// so open ndjson responses end. Requests still running after `grace` are
/// abandoned.
///
/// # Errors
///
/// Returns an error if the server fails while accepting connections.
pub async fn serve<S, F>(
    listener: TcpListener,
    app: Router,
    shutdown: S,
    on_shutdown: F,
    grace: Duration,
) -> std::io::Result<()>
where
    S: Future<Output = ()> + Send + 'static,
    F: FnOnce() + Send + 'static,
{
    let draining = Arc::new(Notify::new());
    let signalled = Arc::clone(&draining);

    let server = async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                on_shutdown();
                signalled.notify_one();
            })
            .await
    };

    let deadline = async move {
        draining.notified().await;
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => {
            result?;
            info!("Server stopped");
        }
        () = deadline => {
            warn!(
                grace_secs = grace.as_secs(),
                "Graceful shutdown timed out, dropping open connections"
            );
        }
    }
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM.
///
/// A handler that cannot be installed is logged and never fires.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
