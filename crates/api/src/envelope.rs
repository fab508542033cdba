use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Timestamp format used for `meta.generated` and record dates
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Meta {
    /// Server local time the response was built, `YYYY-MM-DD HH:MM:SS`
    pub generated: String,
}

/// JSON body of every successful station response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Envelope<T> {
    pub meta: Meta,
    pub data: Vec<T>,
}

impl<T> Envelope<T> {
    /// Wrap `data`, stamped with the current local time
    pub fn new(data: Vec<T>) -> Self {
        Self::generated_at(Local::now().naive_local(), data)
    }

    pub fn generated_at(generated: NaiveDateTime, data: Vec<T>) -> Self {
        Self {
            meta: Meta {
                generated: generated.format(TIMESTAMP_FORMAT).to_string(),
            },
            data,
        }
    }
}
