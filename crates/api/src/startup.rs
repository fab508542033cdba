use crate::{
    envelope, routes, stations_daily, stations_hourly, DailyObservation, HourlyObservation,
    MeteostatAccess, MeteostatConfig, WeatherData,
};
use anyhow::anyhow;
use axum::{
    body::Body,
    extract::Request,
    middleware::{self, Next},
    response::IntoResponse,
    routing::get,
    Router,
};
use hyper::{
    header::{ACCEPT, CONTENT_TYPE},
    Method,
};
use log::info;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

#[derive(Clone)]
pub struct AppState {
    pub weather_db: Arc<dyn WeatherData>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::stations::daily::stations_daily,
        routes::stations::hourly::stations_hourly,
    ),
    components(
        schemas(
            envelope::Meta,
            DailyObservation,
            HourlyObservation,
        )
    ),
    tags(
        (name = "meteostat json api", description = "daily and hourly Meteostat station observations as JSON")
    )
)]
struct ApiDoc;

pub fn build_app_state(config: MeteostatConfig) -> Result<AppState, anyhow::Error> {
    let weather_db = Arc::new(
        MeteostatAccess::new(config).map_err(|e| anyhow!("error setting up weather data: {}", e))?,
    );
    Ok(AppState { weather_db })
}

pub fn app(app_state: AppState) -> Router {
    let api_docs = ApiDoc::openapi();
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE])
        .allow_origin(Any);

    Router::new()
        .route("/stations/daily", get(stations_daily))
        .route("/stations/hourly", get(stations_hourly))
        .with_state(Arc::new(app_state))
        .layer(middleware::from_fn(log_request))
        .merge(Scalar::with_url("/docs", api_docs))
        .layer(cors)
}

async fn log_request(request: Request<Body>, next: Next) -> impl IntoResponse {
    let now = time::OffsetDateTime::now_utc();
    let method = request.method().clone();
    let path = request
        .uri()
        .path_and_query()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_default();
    info!(target: "http_request", "new request, {} {}", method.as_str(), path);

    let response = next.run(request).await;
    let response_time = time::OffsetDateTime::now_utc() - now;
    info!(
        target: "http_response",
        "response, {} {}, code: {}, time: {}",
        method.as_str(),
        path,
        response.status().as_str(),
        response_time
    );

    response
}
