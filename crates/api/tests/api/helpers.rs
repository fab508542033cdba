use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use hyper::Method;
use meteostat_api::{
    app, weather_data, AppState, DailyObservation, Frequency, HourlyObservation, StationRequest,
    WeatherData,
};
use mockall::mock;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

mock! {
    pub WeatherAccess {}
    #[async_trait]
    impl WeatherData for WeatherAccess {
        async fn count(
            &self,
            frequency: Frequency,
            req: &StationRequest,
        ) -> Result<usize, weather_data::Error>;
        async fn daily(
            &self,
            req: &StationRequest,
        ) -> Result<Vec<DailyObservation>, weather_data::Error>;
        async fn hourly(
            &self,
            req: &StationRequest,
        ) -> Result<Vec<HourlyObservation>, weather_data::Error>;
    }
}

pub struct TestApp {
    pub app: Router,
}

pub async fn spawn_app(weather_db: Arc<dyn WeatherData>) -> TestApp {
    let app_state = AppState { weather_db };
    TestApp {
        app: app(app_state),
    }
}

impl TestApp {
    /// GET `uri`, returning the status and raw body
    pub async fn get(&self, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap();

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request.");
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let (status, body) = self.get(uri).await;
        let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }
}

/// Mock that fails the test if the data source is touched
pub fn untouched() -> MockWeatherAccess {
    let mut weather_data = MockWeatherAccess::new();
    weather_data.expect_count().times(0);
    weather_data.expect_daily().times(0);
    weather_data.expect_hourly().times(0);
    weather_data
}

pub fn daily_row(date: &str) -> DailyObservation {
    DailyObservation {
        date: date.to_string(),
        tavg: Some(1.2),
        tmin: Some(-0.6),
        tmax: Some(3.4),
        prcp: Some(0.3),
        snow: None,
        wdir: Some(250.0),
        wspd: Some(11.5),
        wpgt: None,
        pres: Some(1018.1),
        tsun: None,
    }
}

pub fn hourly_row(date: &str, coco: Option<i64>) -> HourlyObservation {
    HourlyObservation {
        date: date.to_string(),
        temp: Some(2.0),
        dwpt: Some(-1.0),
        rhum: Some(81.0),
        prcp: None,
        snow: None,
        wdir: Some(240.0),
        wspd: Some(9.4),
        wpgt: None,
        pres: Some(1021.0),
        tsun: None,
        coco,
    }
}
