use crate::helpers::{hourly_row, spawn_app, untouched, MockWeatherAccess};
use axum::http::StatusCode;
use meteostat_api::Frequency;
use std::sync::Arc;

#[tokio::test]
async fn coco_is_integer_or_null() {
    let mut weather_data = MockWeatherAccess::new();
    weather_data
        .expect_count()
        .withf(|frequency, _| *frequency == Frequency::Hourly)
        .times(1)
        .returning(|_, _| Ok(2));
    weather_data.expect_hourly().times(1).returning(|_| {
        Ok(vec![
            hourly_row("2020-01-01 00:00:00", Some(3)),
            hourly_row("2020-01-01 01:00:00", None),
        ])
    });

    let test_app = spawn_app(Arc::new(weather_data)).await;
    let (status, body) = test_app
        .get_json("/stations/hourly?station=10637&start=2020-01-01&end=2020-01-01")
        .await;

    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert!(data[0]["coco"].is_i64());
    assert_eq!(data[0]["coco"], 3);
    assert!(data[1]["coco"].is_null());
    assert_eq!(data[1]["date"], "2020-01-01 01:00:00");
}

#[tokio::test]
async fn timezone_is_forwarded() {
    let mut weather_data = MockWeatherAccess::new();
    weather_data
        .expect_count()
        .withf(|_, req| req.timezone == Some(chrono_tz::Europe::Berlin) && req.model)
        .times(1)
        .returning(|_, _| Ok(1));
    weather_data
        .expect_hourly()
        .withf(|req| req.timezone == Some(chrono_tz::Europe::Berlin))
        .times(1)
        .returning(|_| Ok(vec![hourly_row("2020-01-01 00:00:00", Some(1))]));

    let test_app = spawn_app(Arc::new(weather_data)).await;
    let (status, _) = test_app
        .get("/stations/hourly?station=10637&start=2020-01-01&end=2020-01-02&tz=Europe%2FBerlin")
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_timezone_is_rejected() {
    let test_app = spawn_app(Arc::new(untouched())).await;
    let (status, _) = test_app
        .get("/stations/hourly?station=10637&start=2020-01-01&end=2020-01-02&tz=Nowhere%2FLand")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn zero_rows_skip_fetch() {
    let mut weather_data = MockWeatherAccess::new();
    weather_data
        .expect_count()
        .withf(|_, req| !req.model)
        .times(1)
        .returning(|_, _| Ok(0));
    weather_data.expect_hourly().times(0);

    let test_app = spawn_app(Arc::new(weather_data)).await;
    let (status, body) = test_app
        .get_json("/stations/hourly?station=10637&start=2020-01-01&end=2020-01-01&model=false")
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], serde_json::json!([]));
}

#[tokio::test]
async fn thirty_day_boundary() {
    let mut weather_data = MockWeatherAccess::new();
    weather_data.expect_count().times(1).returning(|_, _| Ok(0));
    let test_app = spawn_app(Arc::new(weather_data)).await;
    let (status, _) = test_app
        .get("/stations/hourly?station=10637&start=2020-01-01&end=2020-01-31")
        .await;
    assert_eq!(status, StatusCode::OK);

    let test_app = spawn_app(Arc::new(untouched())).await;
    for end in ["2020-02-01", "2020-02-15"] {
        let uri = format!("/stations/hourly?station=10637&start=2020-01-01&end={end}");
        let (status, _) = test_app.get(&uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
    }
}

#[tokio::test]
async fn daily_range_is_too_long_for_hourly() {
    let test_app = spawn_app(Arc::new(untouched())).await;
    let (status, _) = test_app
        .get("/stations/hourly?station=10637&start=2020-01-01&end=2020-12-31")
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
