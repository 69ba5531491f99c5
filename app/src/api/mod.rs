//! HTTP handlers, one module per resource.

pub mod movie_infos;
pub mod movies;
pub mod reviews;

use movies_runtime::ChangeStreamSink;

/// Announce a saved entity to live subscribers.
///
/// The save already happened, so a saturated or completed sink is logged and
/// the request still succeeds.
fn publish<T>(sink: &ChangeStreamSink<T>, item: T)
where
    T: Clone + Send + 'static,
{
    match sink.publish(item) {
        Ok(report) => {
            tracing::debug!(sink = sink.name(), delivered = report.delivered, "Published change");
        }
        Err(e) => tracing::warn!(sink = sink.name(), error = %e, "Failed to publish change"),
    }
}
