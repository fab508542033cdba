use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};

use super::{server_error, station_request};
use crate::{params::ParamSpec, AppState, Envelope, Frequency, HourlyObservation};

pub const HOURLY_MAX_DAYS: i64 = 30;

pub const HOURLY_PARAMETERS: &[ParamSpec] = &[
    ParamSpec::string("station"),
    ParamSpec::string("start"),
    ParamSpec::string("end"),
    ParamSpec::string("tz"),
    ParamSpec::boolean("model", true),
    ParamSpec::string("freq"),
    ParamSpec::string("units"),
];

#[utoipa::path(
    get,
    path = "/stations/hourly",
    params(
        ("station" = String, Query, description = "Meteostat station id"),
        ("start" = String, Query, description = "First day, YYYY-MM-DD"),
        ("end" = String, Query, description = "Last day, YYYY-MM-DD"),
        ("tz" = Option<String>, Query, description = "IANA timezone for the range and returned times"),
        ("model" = Option<bool>, Query, description = "Include model data, defaults to true"),
        ("freq" = Option<String>, Query, description = "Time frequency, passed to the data source"),
        ("units" = Option<String>, Query, description = "metric, imperial or scientific"),
    ),
    responses(
        (status = OK, description = "Hourly observations for the station", content_type = "application/json", body = Envelope<HourlyObservation>),
        (status = BAD_REQUEST, description = "Missing or invalid parameters"),
        (status = INTERNAL_SERVER_ERROR, description = "Failed to retrieve station data")
    ))]
pub async fn stations_hourly(
    State(state): State<Arc<AppState>>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<Envelope<HourlyObservation>>, (StatusCode, String)> {
    let req = station_request(HOURLY_PARAMETERS, &pairs, HOURLY_MAX_DAYS)?;

    let count = state
        .weather_db
        .count(Frequency::Hourly, &req)
        .await
        .map_err(server_error)?;
    if count == 0 {
        return Ok(Json(Envelope::new(vec![])));
    }

    let data = state.weather_db.hourly(&req).await.map_err(server_error)?;
    Ok(Json(Envelope::new(data)))
}
