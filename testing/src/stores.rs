//! In-memory store implementations.
//!
//! Fast, deterministic stand-ins for the PostgreSQL stores:
//! - [`InMemoryMovieInfoStore`]: catalog entries
//! - [`InMemoryReviewStore`]: reviews
//!
//! Both keep insertion order, assign UUID ids on first save and can be told
//! to fail every operation to exercise error paths.

#![allow(clippy::unwrap_used)] // Test infrastructure; a poisoned lock means a test already panicked
#![allow(clippy::missing_panics_doc)]

use futures::stream;
use movies_core::{
    EntityStream, MovieInfo, MovieInfoStore, Review, ReviewStore, StoreError, StoreFuture,
};
use std::sync::{Arc, RwLock};

/// Ordered documents plus an optional injected failure.
#[derive(Debug)]
struct Documents<T> {
    items: RwLock<Vec<T>>,
    failure: RwLock<Option<String>>,
}

impl<T: Clone> Documents<T> {
    fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            failure: RwLock::new(None),
        }
    }

    fn check(&self) -> Result<(), StoreError> {
        match self.failure.read().unwrap().as_ref() {
            Some(message) => Err(StoreError::DatabaseError(message.clone())),
            None => Ok(()),
        }
    }

    fn snapshot(&self, keep: impl Fn(&T) -> bool) -> Result<Vec<T>, StoreError> {
        self.check()?;
        Ok(self.items.read().unwrap().iter().filter(|item| keep(item)).cloned().collect())
    }

    fn find(&self, matches: impl Fn(&T) -> bool) -> Result<Option<T>, StoreError> {
        self.check()?;
        Ok(self.items.read().unwrap().iter().find(|item| matches(item)).cloned())
    }

    fn upsert(&self, item: T, same: impl Fn(&T) -> bool) -> Result<T, StoreError> {
        self.check()?;
        let mut items = self.items.write().unwrap();
        match items.iter_mut().find(|existing| same(existing)) {
            Some(existing) => *existing = item.clone(),
            None => items.push(item.clone()),
        }
        Ok(item)
    }

    fn remove(&self, matches: impl Fn(&T) -> bool) -> Result<(), StoreError> {
        self.check()?;
        self.items.write().unwrap().retain(|item| !matches(item));
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.check()?;
        self.items.write().unwrap().clear();
        Ok(())
    }

    fn len(&self) -> usize {
        self.items.read().unwrap().len()
    }

    fn set_failure(&self, message: Option<String>) {
        *self.failure.write().unwrap() = message;
    }
}

fn into_stream<T: Send + 'static>(result: Result<Vec<T>, StoreError>) -> EntityStream<T> {
    match result {
        Ok(items) => Box::pin(stream::iter(items.into_iter().map(Ok))),
        Err(e) => Box::pin(stream::once(async move { Err(e) })),
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// In-memory catalog store.
///
/// # Example
///
/// ```
/// use movies_core::{MovieInfo, MovieInfoStore};
/// use movies_testing::InMemoryMovieInfoStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryMovieInfoStore::new();
/// let saved = store.save(MovieInfo::new("Batman Begins", 2005, vec!["Christian Bale".into()])).await?;
///
/// let id = saved.movie_info_id.clone().unwrap_or_default();
/// assert_eq!(store.find_by_id(&id).await?, Some(saved));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryMovieInfoStore {
    documents: Arc<Documents<MovieInfo>>,
}

impl InMemoryMovieInfoStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            documents: Arc::new(Documents::new()),
        }
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every subsequent operation fail with `StoreError::DatabaseError(message)`.
    pub fn fail_with(&self, message: impl Into<String>) {
        self.documents.set_failure(Some(message.into()));
    }

    /// Undo [`fail_with`](Self::fail_with).
    pub fn recover(&self) {
        self.documents.set_failure(None);
    }
}

impl Default for InMemoryMovieInfoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MovieInfoStore for InMemoryMovieInfoStore {
    fn find_all(&self) -> EntityStream<MovieInfo> {
        into_stream(self.documents.snapshot(|_| true))
    }

    fn find_by_id(&self, id: &str) -> StoreFuture<'_, Option<MovieInfo>> {
        let id = id.to_string();
        Box::pin(async move {
            self.documents
                .find(|info| info.movie_info_id.as_deref() == Some(id.as_str()))
        })
    }

    fn find_by_year(&self, year: i32) -> EntityStream<MovieInfo> {
        into_stream(self.documents.snapshot(|info| info.year == Some(year)))
    }

    fn find_by_name(&self, name: &str) -> StoreFuture<'_, Option<MovieInfo>> {
        let name = name.to_string();
        Box::pin(async move { self.documents.find(|info| info.name == name) })
    }

    fn save(&self, mut movie_info: MovieInfo) -> StoreFuture<'_, MovieInfo> {
        Box::pin(async move {
            let id = movie_info.movie_info_id.get_or_insert_with(new_id).clone();
            self.documents.upsert(movie_info, |existing| {
                existing.movie_info_id.as_deref() == Some(id.as_str())
            })
        })
    }

    fn delete_by_id(&self, id: &str) -> StoreFuture<'_, ()> {
        let id = id.to_string();
        Box::pin(async move {
            self.documents
                .remove(|info| info.movie_info_id.as_deref() == Some(id.as_str()))
        })
    }

    fn delete_all(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move { self.documents.clear() })
    }
}

/// In-memory reviews store.
#[derive(Debug, Clone)]
pub struct InMemoryReviewStore {
    documents: Arc<Documents<Review>>,
}

impl InMemoryReviewStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            documents: Arc::new(Documents::new()),
        }
    }

    /// Number of stored reviews.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the store holds no reviews.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make every subsequent operation fail with `StoreError::DatabaseError(message)`.
    pub fn fail_with(&self, message: impl Into<String>) {
        self.documents.set_failure(Some(message.into()));
    }

    /// Undo [`fail_with`](Self::fail_with).
    pub fn recover(&self) {
        self.documents.set_failure(None);
    }
}

impl Default for InMemoryReviewStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReviewStore for InMemoryReviewStore {
    fn find_all(&self) -> EntityStream<Review> {
        into_stream(self.documents.snapshot(|_| true))
    }

    fn find_by_id(&self, id: &str) -> StoreFuture<'_, Option<Review>> {
        let id = id.to_string();
        Box::pin(async move {
            self.documents
                .find(|review| review.review_id.as_deref() == Some(id.as_str()))
        })
    }

    fn find_by_movie_info_id(&self, movie_info_id: &str) -> EntityStream<Review> {
        into_stream(
            self.documents
                .snapshot(|review| review.movie_info_id.as_deref() == Some(movie_info_id)),
        )
    }

    fn save(&self, mut review: Review) -> StoreFuture<'_, Review> {
        Box::pin(async move {
            let id = review.review_id.get_or_insert_with(new_id).clone();
            self.documents
                .upsert(review, |existing| existing.review_id.as_deref() == Some(id.as_str()))
        })
    }

    fn delete_by_id(&self, id: &str) -> StoreFuture<'_, ()> {
        let id = id.to_string();
        Box::pin(async move {
            self.documents
                .remove(|review| review.review_id.as_deref() == Some(id.as_str()))
        })
    }

    fn delete_all(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move { self.documents.clear() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use futures::TryStreamExt;

    #[tokio::test]
    async fn save_assigns_id_and_upserts_by_id() {
        let store = InMemoryMovieInfoStore::new();

        let saved = store.save(fixtures::batman_begins()).await.unwrap();
        let id = saved.movie_info_id.clone().unwrap();
        assert!(!id.is_empty());

        let mut renamed = saved.clone();
        renamed.name = "Batman Begins (2005)".to_string();
        store.save(renamed.clone()).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.find_by_id(&id).await.unwrap(), Some(renamed));
    }

    #[tokio::test]
    async fn queries_keep_insertion_order() {
        let store = InMemoryMovieInfoStore::new();
        for info in fixtures::movie_infos() {
            store.save(info).await.unwrap();
        }

        let names: Vec<String> = store
            .find_all()
            .map_ok(|info| info.name)
            .try_collect()
            .await
            .unwrap();
        assert_eq!(names, ["Batman Begins", "The Dark Knight", "Dark Knight Rises"]);

        let from_2005: Vec<MovieInfo> = store.find_by_year(2005).try_collect().await.unwrap();
        assert_eq!(from_2005.len(), 1);

        let by_name = store.find_by_name("The Dark Knight").await.unwrap().unwrap();
        assert_eq!(by_name.year, Some(2008));
    }

    #[tokio::test]
    async fn injected_failure_surfaces_as_store_error() {
        let store = InMemoryReviewStore::new();
        store.fail_with("connection reset");

        let err = store.save(fixtures::reviews().remove(0)).await.unwrap_err();
        assert_eq!(err.to_string(), "Database error: connection reset");

        let listed: Result<Vec<Review>, _> = store.find_all().try_collect().await;
        assert!(listed.is_err());

        store.recover();
        assert!(store.find_all().try_collect::<Vec<_>>().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reviews_filter_by_movie_info_id_and_delete() {
        let store = InMemoryReviewStore::new();
        for review in fixtures::reviews() {
            store.save(review).await.unwrap();
        }

        let for_one: Vec<Review> = store.find_by_movie_info_id("1").try_collect().await.unwrap();
        assert_eq!(for_one.len(), 2);

        let id = for_one[0].review_id.clone().unwrap();
        store.delete_by_id(&id).await.unwrap();
        store.delete_by_id("missing").await.unwrap();
        assert_eq!(store.len(), 2);

        store.delete_all().await.unwrap();
        assert!(store.is_empty());
    }
}
