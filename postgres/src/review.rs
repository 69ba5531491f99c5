//! Reviews store over the `review` table.

use crate::error::{failed, observe};
use async_stream::try_stream;
use futures::TryStreamExt;
use movies_core::{EntityStream, Review, ReviewStore, StoreFuture};
use movies_runtime::metrics::StoreMetrics;
use sqlx::PgPool;
use sqlx::types::Json;
use std::time::Instant;

const TABLE: &str = "review";

/// PostgreSQL-backed [`ReviewStore`].
#[derive(Clone, Debug)]
pub struct PostgresReviewStore {
    pool: PgPool,
}

impl PostgresReviewStore {
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

    fn stream_query(
        &self,
        operation: &'static str,
        movie_info_id: Option<String>,
    ) -> EntityStream<Review> {
        let pool = self.pool.clone();

        Box::pin(try_stream! {
            let started = Instant::now();
            let mut rows = match &movie_info_id {
                Some(movie_info_id) => sqlx::query_as::<_, (Json<Review>,)>(
                    "SELECT document FROM review WHERE document->>'movieInfoId' = $1 ORDER BY seq",
                )
                .bind(movie_info_id)
                .fetch(&pool),
                None => {
                    sqlx::query_as::<_, (Json<Review>,)>("SELECT document FROM review ORDER BY seq")
                        .fetch(&pool)
                }
            };

            while let Some((Json(review),)) = rows
                .try_next()
                .await
                .map_err(|e| failed(TABLE, operation, e))?
            {
                yield review;
            }
            StoreMetrics::record_operation(TABLE, operation, started.elapsed());
        })
    }
}

impl ReviewStore for PostgresReviewStore {
    fn find_all(&self) -> EntityStream<Review> {
        self.stream_query("find_all", None)
    }

    fn find_by_id(&self, id: &str) -> StoreFuture<'_, Option<Review>> {
        let id = id.to_string();
        Box::pin(async move {
            let started = Instant::now();
            let row: Option<(Json<Review>,)> = observe(
                TABLE,
                "find_by_id",
                started,
                sqlx::query_as("SELECT document FROM review WHERE id = $1")
                    .bind(&id)
                    .fetch_optional(&self.pool)
                    .await,
            )?;
            Ok(row.map(|(Json(review),)| review))
        })
    }

    fn find_by_movie_info_id(&self, movie_info_id: &str) -> EntityStream<Review> {
        self.stream_query("find_by_movie_info_id", Some(movie_info_id.to_string()))
    }

    fn save(&self, mut review: Review) -> StoreFuture<'_, Review> {
        Box::pin(async move {
            let started = Instant::now();
            let id = review
                .review_id
                .get_or_insert_with(|| uuid::Uuid::new_v4().to_string())
                .clone();

            observe(
                TABLE,
                "save",
                started,
                sqlx::query(
                    "INSERT INTO review (id, document) VALUES ($1, $2) \
                     ON CONFLICT (id) DO UPDATE SET document = EXCLUDED.document, updated_at = now()",
                )
                .bind(&id)
                .bind(Json(&review))
                .execute(&self.pool)
                .await,
            )?;

            tracing::debug!(review_id = %id, "Saved review");
            Ok(review)
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
                sqlx::query("DELETE FROM review WHERE id = $1")
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
                sqlx::query("DELETE FROM review").execute(&self.pool).await,
            )?;
            Ok(())
        })
    }
}
