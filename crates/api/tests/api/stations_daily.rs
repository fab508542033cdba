use crate::helpers::{daily_row, spawn_app, untouched, MockWeatherAccess};
use axum::http::StatusCode;
use chrono::{NaiveDate, NaiveDateTime};
use meteostat_api::{weather_data, Frequency};
use std::sync::Arc;

fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, s)
        .unwrap()
}

#[tokio::test]
async fn single_day_returns_envelope() {
    let mut weather_data = MockWeatherAccess::new();
    weather_data
        .expect_count()
        .withf(|frequency, req| {
            *frequency == Frequency::Daily
                && req.station == "10637"
                && req.start == at(2020, 1, 1, 0, 0, 0)
                && req.end == at(2020, 1, 1, 23, 59, 59)
                && req.timezone.is_none()
        })
        .times(1)
        .returning(|_, _| Ok(1));
    weather_data
        .expect_daily()
        .times(1)
        .returning(|_| Ok(vec![daily_row("2020-01-01 00:00:00")]));

    let test_app = spawn_app(Arc::new(weather_data)).await;
    let (status, body) = test_app
        .get_json("/stations/daily?station=10637&start=2020-01-01&end=2020-01-01")
        .await;

    assert_eq!(status, StatusCode::OK);
    let envelope = body.as_object().unwrap();
    assert_eq!(envelope.len(), 2);
    assert!(body["meta"]["generated"].is_string());

    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["date"], "2020-01-01 00:00:00");
    assert_eq!(data[0]["tavg"], 1.2);
    assert!(data[0]["snow"].is_null());
    assert!(data[0]["tsun"].is_null());
}

#[tokio::test]
async fn response_is_json() {
    let mut weather_data = MockWeatherAccess::new();
    weather_data.expect_count().times(1).returning(|_, _| Ok(0));
    weather_data.expect_daily().times(0);

    let test_app = spawn_app(Arc::new(weather_data)).await;
    let request = axum::http::Request::builder()
        .uri("/stations/daily?station=10637&start=2020-01-01&end=2020-01-02")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(test_app.app.clone(), request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[hyper::header::CONTENT_TYPE],
        "application/json"
    );
}

#[tokio::test]
async fn zero_rows_skip_fetch() {
    let mut weather_data = MockWeatherAccess::new();
    weather_data.expect_count().times(1).returning(|_, _| Ok(0));
    weather_data.expect_daily().times(0);

    let test_app = spawn_app(Arc::new(weather_data)).await;
    let (status, body) = test_app
        .get_json("/stations/daily?station=99999&start=2020-01-01&end=2020-12-31")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], serde_json::json!([]));
    assert!(body["meta"]["generated"].is_string());
}

#[tokio::test]
async fn model_defaults_to_true() {
    let mut weather_data = MockWeatherAccess::new();
    weather_data
        .expect_count()
        .withf(|_, req| req.model)
        .times(1)
        .returning(|_, _| Ok(0));

    let test_app = spawn_app(Arc::new(weather_data)).await;
    let (status, _) = test_app
        .get("/stations/daily?station=10637&start=2020-01-01&end=2020-01-31")
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn options_are_forwarded() {
    let mut weather_data = MockWeatherAccess::new();
    weather_data
        .expect_count()
        .withf(|_, req| {
            !req.model
                && req.freq.as_deref() == Some("W")
                && req.units.as_deref() == Some("imperial")
        })
        .times(1)
        .returning(|_, _| Ok(1));
    weather_data
        .expect_daily()
        .withf(|req| !req.model && req.units.as_deref() == Some("imperial"))
        .times(1)
        .returning(|_| Ok(vec![daily_row("2020-01-01 00:00:00")]));

    let test_app = spawn_app(Arc::new(weather_data)).await;
    let (status, _) = test_app
        .get("/stations/daily?station=10637&start=2020-01-01&end=2020-01-31&model=false&freq=W&units=imperial")
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn ten_year_boundary() {
    let mut weather_data = MockWeatherAccess::new();
    weather_data.expect_count().times(1).returning(|_, _| Ok(0));
    let test_app = spawn_app(Arc::new(weather_data)).await;

    // 2010-01-01 + 3650 days
    let (status, _) = test_app
        .get("/stations/daily?station=10637&start=2010-01-01&end=2019-12-30")
        .await;
    assert_eq!(status, StatusCode::OK);

    let test_app = spawn_app(Arc::new(untouched())).await;
    let (status, _) = test_app
        .get("/stations/daily?station=10637&start=2010-01-01&end=2019-12-31")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn invalid_requests_never_reach_data_source() {
    let test_app = spawn_app(Arc::new(untouched())).await;

    for uri in [
        "/stations/daily?start=2020-01-01&end=2020-01-01",
        "/stations/daily?station=&start=2020-01-01&end=2020-01-01",
        "/stations/daily?station=10637&end=2020-01-01",
        "/stations/daily?station=10637&start=2020-1-1&end=2020-01-01",
        "/stations/daily?station=10637&start=2020-01-01&end=2020-01-011",
        "/stations/daily?station=10637&start=2020-02-02&end=2020-02-01",
        "/stations/daily?station=10637&start=2020-13-01&end=2020-12-01",
        "/stations/daily?station=10637&start=2020-02-30&end=2020-03-01",
        "/stations/daily?station=10637&start=2020-01-01&end=2020-01-02&model=maybe",
    ] {
        let (status, _) = test_app.get(uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn data_source_failure_is_generic_500() {
    let mut weather_data = MockWeatherAccess::new();
    weather_data
        .expect_count()
        .times(1)
        .returning(|_, _| Err(weather_data::Error::MissingColumn("tavg")));

    let test_app = spawn_app(Arc::new(weather_data)).await;
    let (status, body) = test_app
        .get("/stations/daily?station=10637&start=2020-01-01&end=2020-01-01")
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body = String::from_utf8(body).unwrap();
    assert!(!body.contains("tavg"));
}
