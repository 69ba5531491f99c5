//! Aggregator service HTTP tests against stubbed upstreams.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use movies::{AggregatorConfig, aggregator_router, bootstrap};
use movies_core::{Movie, Review};
use movies_testing::fixtures;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Aggregator wired to `server` through the same configuration path the
/// binary uses, with a 10 ms retry delay.
fn aggregator(server: &MockServer) -> Router {
    let movies_info_url = format!("{}/v1/movieinfos", server.uri());
    let reviews_url = format!("{}/v1/reviews", server.uri());

    let config = AggregatorConfig::from_lookup(|var| match var {
        "REST_CLIENT_MOVIES_INFO_URL" => Some(movies_info_url.clone()),
        "REST_CLIENT_REVIEWS_URL" => Some(reviews_url.clone()),
        "REST_CLIENT_RETRY_DELAY_MS" => Some("10".to_string()),
        _ => None,
    })
    .unwrap();

    aggregator_router(bootstrap::aggregator_state(&config).unwrap())
}

async fn get_movie(app: Router, id: &str) -> (StatusCode, String) {
    let request = Request::get(format!("/v1/movies/{id}")).body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn batman_begins_abc() -> movies_core::MovieInfo {
    fixtures::batman_begins().with_id("abc")
}

async fn stub_catalog(server: &MockServer, template: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path("/v1/movieinfos/abc"))
        .respond_with(template)
        .expect(times)
        .mount(server)
        .await;
}

async fn stub_reviews(server: &MockServer, template: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path("/v1/reviews"))
        .and(query_param("movieInfoId", "abc"))
        .respond_with(template)
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn composes_catalog_entry_with_reviews() {
    let server = MockServer::start().await;
    stub_catalog(&server, ResponseTemplate::new(200).set_body_json(batman_begins_abc()), 1).await;
    let reviews = vec![
        Review::new("abc", "Awesome Movie", 9.0).with_id("1"),
        Review::new("abc", "Awesome Movie1", 9.0).with_id("2"),
    ];
    stub_reviews(&server, ResponseTemplate::new(200).set_body_json(&reviews), 1).await;

    let (status, body) = get_movie(aggregator(&server), "abc").await;

    assert_eq!(status, StatusCode::OK);
    let movie: Movie = serde_json::from_str(&body).unwrap();
    assert_eq!(movie.movie_info.name, "Batman Begins");
    assert_eq!(movie.review_list.len(), 2);

    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(json.get("movieInfo").is_some());
    assert!(json.get("reviewList").is_some());
}

#[tokio::test]
async fn missing_catalog_entry_is_404_without_reviews_call() {
    let server = MockServer::start().await;
    stub_catalog(&server, ResponseTemplate::new(404), 1).await;
    stub_reviews(&server, ResponseTemplate::new(200).set_body_json(Vec::<Review>::new()), 0).await;

    let (status, body) = get_movie(aggregator(&server), "abc").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "There is no MovieInfo Available for the passed in id: abc");
}

#[tokio::test]
async fn persistent_catalog_failure_is_retried_four_times() {
    let server = MockServer::start().await;
    stub_catalog(
        &server,
        ResponseTemplate::new(500).set_body_string("MovieInfo Service Unavailable"),
        4,
    )
    .await;
    stub_reviews(&server, ResponseTemplate::new(200).set_body_json(Vec::<Review>::new()), 0).await;

    let (status, body) = get_movie(aggregator(&server), "abc").await;

    assert!(status.is_server_error());
    assert_eq!(body, "Server Exception in MoviesInfoServiceMovieInfo Service Unavailable");
}

#[tokio::test]
async fn reviews_not_found_yields_empty_review_list() {
    let server = MockServer::start().await;
    stub_catalog(&server, ResponseTemplate::new(200).set_body_json(batman_begins_abc()), 1).await;
    stub_reviews(&server, ResponseTemplate::new(404), 1).await;

    let (status, body) = get_movie(aggregator(&server), "abc").await;

    assert_eq!(status, StatusCode::OK);
    let movie: Movie = serde_json::from_str(&body).unwrap();
    assert_eq!(movie.movie_info, batman_begins_abc());
    assert!(movie.review_list.is_empty());
}

#[tokio::test]
async fn catalog_client_fault_is_a_bad_gateway() {
    let server = MockServer::start().await;
    stub_catalog(&server, ResponseTemplate::new(400).set_body_string("bad id"), 1).await;

    let (status, body) = get_movie(aggregator(&server), "abc").await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("bad id"));
}
