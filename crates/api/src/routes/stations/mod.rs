pub mod daily;
pub mod hourly;

pub use daily::*;
pub use hourly::*;

use std::fmt::Display;

use axum::http::StatusCode;
use log::{debug, error};

use crate::{
    params::{extract, ParamSpec},
    validate::{timezone, validate},
    weather_data, StationRequest,
};

/// Resolve and validate the query of a station endpoint
fn station_request(
    specs: &[ParamSpec],
    pairs: &[(String, String)],
    max_days: i64,
) -> Result<StationRequest, (StatusCode, String)> {
    let params = extract(specs, pairs).map_err(bad_request)?;
    let valid = validate(&params, max_days).map_err(bad_request)?;
    let timezone = timezone(params.string("tz")).map_err(bad_request)?;

    Ok(StationRequest {
        station: valid.station,
        start: valid.range.start,
        end: valid.range.end,
        timezone,
        model: params.boolean("model").unwrap_or(true),
        units: params.string("units").map(str::to_owned),
        freq: params.string("freq").map(str::to_owned),
    })
}

fn bad_request(err: impl Display) -> (StatusCode, String) {
    debug!("rejecting request: {}", err);
    (StatusCode::BAD_REQUEST, format!("Bad request: {}", err))
}

fn server_error(err: weather_data::Error) -> (StatusCode, String) {
    error!("error retrieving station data: {}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        String::from("Failed to retrieve station data"),
    )
}
