use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use super::{server_error, station_request};
use crate::{params::ParamSpec, AppState, DailyObservation, Envelope, Frequency};

/// Longest accepted daily range
pub const DAILY_MAX_DAYS: i64 = 365 * 10;

pub const DAILY_PARAMETERS: &[ParamSpec] = &[
    ParamSpec::string("station"),
    ParamSpec::string("start"),
    ParamSpec::string("end"),
    ParamSpec::boolean("model", true),
    ParamSpec::string("freq"),
    ParamSpec::string("units"),
];

#[utoipa::path(
    get,
    path = "/stations/daily",
    params(
        ("station" = String, Query, description = "Meteostat station id"),
        ("start" = String, Query, description = "First day, YYYY-MM-DD"),
        ("end" = String, Query, description = "Last day, YYYY-MM-DD"),
        ("model" = Option<bool>, Query, description = "Include model data, defaults to true"),
        ("freq" = Option<String>, Query, description = "Time frequency, passed to the data source"),
        ("units" = Option<String>, Query, description = "metric, imperial or scientific"),
    ),
    responses(
        (status = OK, description = "Daily observations for the station", content_type = "application/json", body = Envelope<DailyObservation>),
        (status = BAD_REQUEST, description = "Missing or invalid parameters"),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to retrieve station data")
    ))]
pub async fn stations_daily(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Envelope<DailyObservation>>, (StatusCode, String)> {
    let req = station_request(DAILY_PARAMETERS, &pairs, DAILY_MAX_DAYS)?;

    let count = state
        .weather_db
        .count(Frequency::Daily, &req)
        .await
        .map_err(server_error)?;
    if count == 0 {
        return Ok(Json(Envelope::new(vec![])));
    }

    let data = state.weather_db.daily(&req).await.map_err(server_error)?;
    Ok(Json(Envelope::new(data)))
}
