use chrono::{NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use duckdb::arrow::array::{Array, Float64Array, RecordBatch, StringArray};
use log::warn;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::weather_data::Error;
use crate::envelope::TIMESTAMP_FORMAT;

/// One day of station observations. Missing values serialize as `null`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct DailyObservation {
    /// Day the observations were recorded, `YYYY-MM-DD HH:MM:SS`
    pub date: String,
    /// Average air temperature
    pub tavg: Option<f64>,
    pub tmin: Option<f64>,
    pub tmax: Option<f64>,
    /// Total precipitation
    pub prcp: Option<f64>,
    /// Snow depth
    pub snow: Option<f64>,
    /// Average wind direction in degrees
    pub wdir: Option<f64>,
    /// Average wind speed
    pub wspd: Option<f64>,
    /// Peak wind gust
    pub wpgt: Option<f64>,
    /// Average sea-level air pressure in hPa
    pub pres: Option<f64>,
    /// Sunshine duration in minutes
    pub tsun: Option<f64>,
}

/// One hour of station observations
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct HourlyObservation {
    /// Observation time, UTC unless a timezone was requested
    pub date: String,
    pub temp: Option<f64>,
    /// Dew point
    pub dwpt: Option<f64>,
    /// Relative humidity in percent
    pub rhum: Option<f64>,
    pub prcp: Option<f64>,
    pub snow: Option<f64>,
    pub wdir: Option<f64>,
    pub wspd: Option<f64>,
    pub wpgt: Option<f64>,
    pub pres: Option<f64>,
    pub tsun: Option<f64>,
    /// Weather condition code
    pub coco: Option<i64>,
}

impl HourlyObservation {
    /// Rewrite `date` from UTC wall time into `tz`
    pub fn localize(&mut self, tz: Tz) -> Result<(), Error> {
        let utc = NaiveDateTime::parse_from_str(&self.date, TIMESTAMP_FORMAT)
            .map_err(|_| Error::Timestamp(self.date.clone()))?;
        self.date = Utc
            .from_utc_datetime(&utc)
            .with_timezone(&tz)
            .format(TIMESTAMP_FORMAT)
            .to_string();
        Ok(())
    }
}

/// Coerce a raw condition code to an integer.
///
/// Missing and NaN values are `None`. A fractional value is not a valid code
/// and is dropped with a warning.
pub fn condition_code(raw: Option<f64>) -> Option<i64> {
    let value = raw.filter(|v| !v.is_nan())?;
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        warn!("dropping non-integral condition code {}", value);
        None
    }
}

pub fn daily_from_batches(batches: &[RecordBatch]) -> Result<Vec<DailyObservation>, Error> {
    let mut observations = Vec::new();
    for batch in batches {
        let date = string_column(batch, "observed_at")?;
        let tavg = float_column(batch, "tavg")?;
        let tmin = float_column(batch, "tmin")?;
        let tmax = float_column(batch, "tmax")?;
        let prcp = float_column(batch, "prcp")?;
        let snow = float_column(batch, "snow")?;
        let wdir = float_column(batch, "wdir")?;
        let wspd = float_column(batch, "wspd")?;
        let wpgt = float_column(batch, "wpgt")?;
        let pres = float_column(batch, "pres")?;
        let tsun = float_column(batch, "tsun")?;

        for row in 0..batch.num_rows() {
            observations.push(DailyObservation {
                date: date.value(row).to_owned(),
                tavg: value(tavg, row),
                tmin: value(tmin, row),
                tmax: value(tmax, row),
                prcp: value(prcp, row),
                snow: value(snow, row),
                wdir: value(wdir, row),
                wspd: value(wspd, row),
                wpgt: value(wpgt, row),
                pres: value(pres, row),
                tsun: value(tsun, row),
            });
        }
    }
    Ok(observations)
}

pub fn hourly_from_batches(batches: &[RecordBatch]) -> Result<Vec<HourlyObservation>, Error> {
    let mut observations = Vec::new();
    for batch in batches {
        let date = string_column(batch, "observed_at")?;
        let temp = float_column(batch, "temp")?;
        let dwpt = float_column(batch, "dwpt")?;
        let rhum = float_column(batch, "rhum")?;
        let prcp = float_column(batch, "prcp")?;
        let snow = float_column(batch, "snow")?;
        let wdir = float_column(batch, "wdir")?;
        let wspd = float_column(batch, "wspd")?;
        let wpgt = float_column(batch, "wpgt")?;
        let pres = float_column(batch, "pres")?;
        let tsun = float_column(batch, "tsun")?;
        let coco = float_column(batch, "coco")?;

        for row in 0..batch.num_rows() {
            observations.push(HourlyObservation {
                date: date.value(row).to_owned(),
                temp: value(temp, row),
                dwpt: value(dwpt, row),
                rhum: value(rhum, row),
                prcp: value(prcp, row),
                snow: value(snow, row),
                wdir: value(wdir, row),
                wspd: value(wspd, row),
                wpgt: value(wpgt, row),
                pres: value(pres, row),
                tsun: value(tsun, row),
                coco: condition_code(value(coco, row)),
            });
        }
    }
    Ok(observations)
}

fn string_column<'a>(batch: &'a RecordBatch, name: &'static str) -> Result<&'a StringArray, Error> {
    batch
        .column_by_name(name)
        .and_then(|column| column.as_any().downcast_ref::<StringArray>())
        .ok_or(Error::MissingColumn(name))
}

fn float_column<'a>(batch: &'a RecordBatch, name: &'static str) -> Result<&'a Float64Array, Error> {
    batch
        .column_by_name(name)
        .and_then(|column| column.as_any().downcast_ref::<Float64Array>())
        .ok_or(Error::MissingColumn(name))
}

fn value(array: &Float64Array, row: usize) -> Option<f64> {
    if array.is_null(row) {
        None
    } else {
        Some(array.value(row)).filter(|v| !v.is_nan())
    }
}
