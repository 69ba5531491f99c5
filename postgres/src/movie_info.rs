//! Catalog store over the `movie_info` table.

use crate::error::{failed, observe};
use async_stream::try_stream;
use futures::TryStreamExt;
use movies_core::{EntityStream, MovieInfo, MovieInfoStore, StoreFuture};
use movies_runtime::metrics::StoreMetrics;
use sqlx::PgPool;
use sqlx::types::Json;
use std::time::Instant;

const TABLE: &str = "movie_info";

/// PostgreSQL-backed [`MovieInfoStore`].
#[derive(Clone, Debug)]
pub struct PostgresMovieInfoStore {
    pool: PgPool,
}

impl PostgresMovieInfoStore {
    /// Create a store over an existing pool. Run [`crate::migrate`] first.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn stream_query(&self, operation: &'static str, year: Option<i32>) -> EntityStream<MovieInfo> {
        let pool = self.pool.clone();

        Box::pin(try_stream! {
            let started = Instant::now();
            let mut rows = match year {
                Some(year) => sqlx::query_as::<_, (Json<MovieInfo>,)>(
                    "SELECT document FROM movie_info WHERE (document->>'year')::INT = $1 ORDER BY seq",
                )
                .bind(year)
                .fetch(&pool),
                None => sqlx::query_as::<_, (Json<MovieInfo>,)>(
                    "SELECT document FROM movie_info ORDER BY seq",
                )
                .fetch(&pool),
            };

            let mut count = 0_usize;
            while let Some((Json(info),)) = rows
                .try_next()
                .await
                .map_err(|e| failed(TABLE, operation, e))?
            {
                count += 1;
                yield info;
            }
            StoreMetrics::record_operation(TABLE, operation, started.elapsed());
            tracing::trace!(operation, count, "Streamed catalog entries");
        })
    }
}

impl MovieInfoStore for PostgresMovieInfoStore {
    fn find_all(&self) -> EntityStream<MovieInfo> {
        self.stream_query("find_all", None)
    }

    fn find_by_id(&self, id: &str) -> StoreFuture<'_, Option<MovieInfo>> {
        let id = id.to_string();
        Box::pin(async move {
            let started = Instant::now();
            let row: Option<(Json<MovieInfo>,)> = observe(
                TABLE,
                "find_by_id",
                started,
                sqlx::query_as("SELECT document FROM movie_info WHERE id = $1")
                    .bind(&id)
                    .fetch_optional(&self.pool)
                    .await,
            )?;
            Ok(row.map(|(Json(info),)| info))
        })
    }

    fn find_by_year(&self, year: i32) -> EntityStream<MovieInfo> {
        self.stream_query("find_by_year", Some(year))
    }

    fn find_by_name(&self, name: &str) -> StoreFuture<'_, Option<MovieInfo>> {
        let name = name.to_string();
        Box::pin(async move {
            let started = Instant::now();
            let row: Option<(Json<MovieInfo>,)> = observe(
                TABLE,
                "find_by_name",
                started,
                sqlx::query_as(
                    "SELECT document FROM movie_info WHERE document->>'name' = $1 \
                     ORDER BY seq LIMIT 1",
                )
                .bind(&name)
                .fetch_optional(&self.pool)
                .await,
            )?;
            Ok(row.map(|(Json(info),)| info))
        })
    }

    fn save(&self, mut movie_info: MovieInfo) -> StoreFuture<'_, MovieInfo> {
        Box::pin(async move {
            let started = Instant::now();
            let id = movie_info
                .movie_info_id
                .get_or_insert_with(|| uuid::Uuid::new_v4().to_string())
                .clone();

            observe(
                TABLE,
                "save",
                started,
                sqlx::query(
                    "INSERT INTO movie_info (id, document) VALUES ($1, $2) \
                     ON CONFLICT (id) DO UPDATE SET document = EXCLUDED.document, updated_at = now()",
                )
                .bind(&id)
                .bind(Json(&movie_info))
                .execute(&self.pool)
                .await,
            )?;

            tracing::debug!(movie_info_id = %id, "Saved catalog entry");
            Ok(movie_info)
        })
    }

    fn delete_by_id(&self, id: &str) -> StoreFuture<'_, ()> {
        let id = id.to_string();
        Box::pin(async move {
            let started = Instant::now();
            observe(
                TABLE,
                "delete_by_id",
                started,
                sqlx::query("DELETE FROM movie_info WHERE id = $1")
                    .bind(&id)
                    .execute(&self.pool)
                    .await,
            )?;
            Ok(())
        })
    }

    fn delete_all(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            let started = Instant::now();
            observe(
                TABLE,
                "delete_all",
                started,
                sqlx::query("DELETE FROM movie_info").execute(&self.pool).await,
            )?;
            Ok(())
        })
    }
}
