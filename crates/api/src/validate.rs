//! Request validation shared by the station endpoints.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;

use crate::params::QueryParams;

/// Length of a `YYYY-MM-DD` date string
pub const DATE_LENGTH: usize = 10;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("missing required parameter '{0}'")]
    Missing(&'static str),
    #[error("parameter '{name}' must be 10 characters (YYYY-MM-DD), got {length}")]
    Length { name: &'static str, length: usize },
    #[error("parameter '{name}' is not a valid calendar date: '{value}'")]
    InvalidDate { name: &'static str, value: String },
    #[error("end date precedes start date")]
    EndBeforeStart,
    #[error("date range of {days} days exceeds the maximum of {max_days} days")]
    RangeTooLarge { days: i64, max_days: i64 },
    #[error("unknown timezone '{0}'")]
    UnknownTimezone(String),
}

/// Inclusive range from the start of the first day to the last second of the
/// final day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    /// Parse and bound a range. `max_days` caps the whole-day difference
    /// between the end and start dates; equal dates give zero.
    pub fn parse(start: &str, end: &str, max_days: i64) -> Result<Self, Error> {
        let start_date = parse_date("start", start)?;
        let end_date = parse_date("end", end)?;

        let range = Self {
            start: start_date.and_time(NaiveTime::MIN),
            end: end_date.and_time(end_of_day()),
        };
        let days = range.days();
        if days < 0 {
            return Err(Error::EndBeforeStart);
        }
        if days > max_days {
            return Err(Error::RangeTooLarge { days, max_days });
        }
        Ok(range)
    }

    /// Whole days between end and start
    pub fn days(&self) -> i64 {
        // Comparing dates floors the 23:59:59 remainder in both directions
        (self.end.date() - self.start.date()).num_days()
    }
}

/// A request that passed validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRequest {
    pub station: String,
    pub range: DateRange,
}

/// Check the required `station`, `start` and `end` parameters.
///
/// Presence and length are checked for all three before any date parsing.
pub fn validate(params: &QueryParams, max_days: i64) -> Result<ValidRequest, Error> {
    let station = params.string("station").ok_or(Error::Missing("station"))?;
    let start = required_date(params, "start")?;
    let end = required_date(params, "end")?;

    Ok(ValidRequest {
        station: station.to_owned(),
        range: DateRange::parse(start, end, max_days)?,
    })
}

/// Resolve an optional IANA timezone name
pub fn timezone(name: Option<&str>) -> Result<Option<Tz>, Error> {
    name.map(|name| {
        name.parse::<Tz>()
            .map_err(|_| Error::UnknownTimezone(name.to_owned()))
    })
    .transpose()
}

fn required_date<'a>(params: &'a QueryParams, name: &'static str) -> Result<&'a str, Error> {
    let value = params.string(name).ok_or(Error::Missing(name))?;
    let length = value.chars().count();
    if length != DATE_LENGTH {
        return Err(Error::Length { name, length });
    }
    Ok(value)
}

fn parse_date(name: &'static str, value: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| Error::InvalidDate {
        name,
        value: value.to_owned(),
    })
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}
