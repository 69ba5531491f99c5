//! `PostgreSQL` document stores for the movies services.
//!
//! Catalog entries and reviews are persisted as JSONB documents, one table
//! per entity, with expression indexes backing the typed queries:
//!
//! ```text
//! movie_info                         review
//! ┌──────────────────────────┐       ┌──────────────────────────┐
//! │ id        TEXT PK        │       │ id        TEXT PK        │
//! │ seq       BIGSERIAL      │       │ seq       BIGSERIAL      │
//! │ document  JSONB          │       │ document  JSONB          │
//! │   ├ idx (year)::int      │       │   └ idx movieInfoId      │
//! │   └ idx name             │       │                          │
//! └──────────────────────────┘       └──────────────────────────┘
//! ```
//!
//! Listing is ordered by `seq`, i.e. insertion order; an upsert keeps the
//! original position.
//!
//! # Example
//!
//! ```ignore
//! use movies_postgres::{PostgresMovieInfoStore, connect, migrate};
//!
//! let pool = connect("postgres://localhost/movies", 10).await?;
//! migrate(&pool).await?;
//! let store = PostgresMovieInfoStore::new(pool);
//! ```

mod error;
pub mod movie_info;
pub mod review;

pub use movie_info::PostgresMovieInfoStore;
pub use review::PostgresReviewStore;
pub use sqlx::postgres::PgPool;

use movies_core::StoreError;
use sqlx::postgres::PgPoolOptions;

/// Open a connection pool.
///
/// # Errors
///
/// Returns [`StoreError::ConnectionFailed`] if the database is unreachable.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, StoreError> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
        .map_err(|e| StoreError::ConnectionFailed(e.to_string()))
}

/// Create the `movie_info` and `review` tables and their indexes.
///
/// # Errors
///
/// Returns [`StoreError::DatabaseError`] if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| StoreError::DatabaseError(format!("Migration failed: {e}")))
}
