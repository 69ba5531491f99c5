//! Reviews service HTTP tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use futures::StreamExt;
use movies::{ReviewsState, reviews_router};
use movies_core::{Review, ReviewStore};
use movies_runtime::ChangeStreamSink;
use movies_testing::{InMemoryReviewStore, fixtures};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn setup() -> (InMemoryReviewStore, ReviewsState) {
    let store = InMemoryReviewStore::new();
    let state = ReviewsState::new(Arc::new(store.clone()), ChangeStreamSink::new("review"));
    (store, state)
}

async fn seeded() -> (InMemoryReviewStore, Router) {
    let (store, state) = setup();
    for review in fixtures::reviews() {
        store.save(review).await.unwrap();
    }
    (store, reviews_router(state))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn with_json(method: &str, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn first_id(store: &InMemoryReviewStore, movie_info_id: &str) -> String {
    let reviews: Vec<Review> =
        futures::TryStreamExt::try_collect(store.find_by_movie_info_id(movie_info_id))
            .await
            .unwrap();
    reviews[0].review_id.clone().unwrap()
}

#[tokio::test]
async fn create_review_assigns_id() {
    let (store, state) = setup();
    let app = reviews_router(state);

    let body = json!({"movieInfoId": 1, "comment": "Awesome Movie", "rating": 9.0});
    let (status, text) = send(&app, with_json("POST", "/v1/reviews", &body)).await;

    assert_eq!(status, StatusCode::CREATED);
    let created: Review = serde_json::from_str(&text).unwrap();
    assert!(created.review_id.is_some());
    assert_eq!(created.movie_info_id.as_deref(), Some("1"));
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn invalid_review_is_rejected() {
    let (store, state) = setup();
    let app = reviews_router(state);

    let body = json!({"movieInfoId": null, "comment": "Awesome Movie", "rating": -9.0});
    let (status, text) = send(&app, with_json("POST", "/v1/reviews", &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        text,
        "rating.movieInfoId : must not be null, rating.negative : please pass a non-negative value"
    );
    assert!(store.is_empty());
}

#[tokio::test]
async fn list_all_or_by_movie_info_id() {
    let (_, app) = seeded().await;

    let (status, text) = send(&app, get("/v1/reviews")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Vec<Review>>(&text).unwrap().len(), 3);

    let (_, text) = send(&app, get("/v1/reviews?movieInfoId=1")).await;
    let for_one: Vec<Review> = serde_json::from_str(&text).unwrap();
    assert_eq!(for_one.len(), 2);
    assert!(for_one.iter().all(|r| r.movie_info_id.as_deref() == Some("1")));

    let (_, text) = send(&app, get("/v1/reviews?movieInfoId=99")).await;
    assert_eq!(text, "[]");
}

#[tokio::test]
async fn update_changes_only_comment_and_rating() {
    let (store, app) = seeded().await;
    let id = first_id(&store, "1").await;

    let body = json!({"movieInfoId": "2", "comment": "Not an Awesome Movie", "rating": 8.0});
    let (status, text) = send(&app, with_json("PUT", &format!("/v1/reviews/{id}"), &body)).await;

    assert_eq!(status, StatusCode::OK);
    let updated: Review = serde_json::from_str(&text).unwrap();
    assert_eq!(updated.review_id.as_deref(), Some(id.as_str()));
    assert_eq!(updated.movie_info_id.as_deref(), Some("1"));
    assert_eq!(updated.comment, "Not an Awesome Movie");
    assert!((updated.rating - 8.0).abs() < f64::EPSILON);

    assert_eq!(store.find_by_id(&id).await.unwrap(), Some(updated));
}

#[tokio::test]
async fn update_validates_and_reports_missing() {
    let (_, app) = seeded().await;

    let invalid = json!({"movieInfoId": "1", "comment": "x", "rating": -1.0});
    let (status, text) = send(&app, with_json("PUT", "/v1/reviews/missing", &invalid)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(text, "rating.negative : please pass a non-negative value");

    let valid = json!({"movieInfoId": "1", "comment": "x", "rating": 1.0});
    let (status, text) = send(&app, with_json("PUT", "/v1/reviews/missing", &valid)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(text.is_empty());
}

#[tokio::test]
async fn delete_is_idempotent() {
    let (store, app) = seeded().await;
    let id = first_id(&store, "2").await;

    let request = Request::delete(format!("/v1/reviews/{id}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(store.len(), 2);

    let request = Request::delete("/v1/reviews/missing")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(store.len(), 2);
}

#[tokio::test]
async fn stream_delivers_new_reviews() {
    let (_, state) = setup();
    let app = reviews_router(state);

    let response = app.clone().oneshot(get("/v1/reviews/stream")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let mut frames = response.into_body().into_data_stream();

    let body = json!({"movieInfoId": "2", "comment": "Excellent Movie", "rating": 8.0});
    let (status, _) = send(&app, with_json("POST", "/v1/reviews", &body)).await;
    assert_eq!(status, StatusCode::CREATED);

    let frame = tokio::time::timeout(Duration::from_secs(5), frames.next())
        .await
        .expect("created review")
        .unwrap()
        .unwrap();
    let review: Review = serde_json::from_slice(frame.strip_suffix(b"\n").unwrap()).unwrap();
    assert_eq!(review.comment, "Excellent Movie");
}
