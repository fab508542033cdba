use crate::helpers::{spawn_app, untouched};
use axum::http::StatusCode;
use std::sync::Arc;

#[tokio::test]
async fn docs_page_is_served() {
    let test_app = spawn_app(Arc::new(untouched())).await;
    let (status, body) = test_app.get("/docs").await;

    assert_eq!(status, StatusCode::OK);
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("/stations/daily"));
    assert!(html.contains("/stations/hourly"));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let test_app = spawn_app(Arc::new(untouched())).await;
    let (status, _) = test_app.get("/stations/monthly?station=10637").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
