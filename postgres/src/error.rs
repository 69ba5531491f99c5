use movies_core::StoreError;
use movies_runtime::metrics::StoreMetrics;
use std::time::Instant;

/// Classify a `sqlx` failure.
pub(crate) fn store_error(e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Tls(_) => StoreError::ConnectionFailed(e.to_string()),
        sqlx::Error::Decode(_) | sqlx::Error::ColumnDecode { .. } => {
            StoreError::SerializationError(e.to_string())
        }
        _ => StoreError::DatabaseError(e.to_string()),
    }
}

/// Record and log a failed operation.
pub(crate) fn failed(table: &'static str, operation: &'static str, e: sqlx::Error) -> StoreError {
    StoreMetrics::record_error(table, operation);
    tracing::error!(table, operation, error = %e, "Store operation failed");
    store_error(e)
}

/// Record latency or failure of one store operation and pass the result through.
pub(crate) fn observe<T>(
    table: &'static str,
    operation: &'static str,
    started: Instant,
    result: Result<T, sqlx::Error>,
) -> Result<T, StoreError> {
    match result {
        Ok(value) => {
            StoreMetrics::record_operation(table, operation, started.elapsed());
            Ok(value)
        }
        Err(e) => Err(failed(table, operation, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_is_a_connection_failure() {
        assert!(matches!(
            store_error(sqlx::Error::PoolTimedOut),
            StoreError::ConnectionFailed(_)
        ));
    }

    #[test]
    fn missing_row_is_a_database_error() {
        assert!(matches!(
            store_error(sqlx::Error::RowNotFound),
            StoreError::DatabaseError(_)
        ));
    }
}
