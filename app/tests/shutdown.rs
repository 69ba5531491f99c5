//! Graceful shutdown over a real listener.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use movies::server::serve;
use movies::{CatalogState, catalog_router};
use movies_runtime::ChangeStreamSink;
use movies_testing::InMemoryMovieInfoStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

fn state() -> CatalogState {
    CatalogState::new(Arc::new(InMemoryMovieInfoStore::new()), ChangeStreamSink::new("movie_info"))
}

#[tokio::test]
async fn completing_the_sink_ends_open_streams() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = state();
    let sink = state.sink.clone();
    let (stop, stopped) = oneshot::channel::<()>();

    let server = tokio::spawn(serve(
        listener,
        catalog_router(state),
        async move {
            let _ = stopped.await;
        },
        move || sink.complete(),
        Duration::from_secs(5),
    ));

    let mut response = reqwest::get(format!("http://{addr}/v1/movieinfos/stream"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    stop.send(()).unwrap();

    let chunk = tokio::time::timeout(Duration::from_secs(5), response.chunk())
        .await
        .expect("stream should end after shutdown")
        .unwrap();
    assert!(chunk.is_none());

    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should stop")
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn open_connections_are_dropped_after_grace_period() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();

    let server = tokio::spawn(serve(
        listener,
        catalog_router(state()),
        async move {
            let _ = stopped.await;
        },
        || {},
        Duration::from_millis(100),
    ));

    let response = reqwest::get(format!("http://{addr}/v1/movieinfos/stream"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    stop.send(()).unwrap();

    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server should give up waiting")
        .unwrap()
        .unwrap();
    drop(response);
}
