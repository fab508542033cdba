use std::fmt;

use async_trait::async_trait;
use chrono::{Datelike, Duration, NaiveDateTime, TimeZone, Timelike};
use chrono_tz::Tz;
use duckdb::{
    arrow::array::{Array, Int64Array, RecordBatch},
    params_from_iter, Connection,
};
use log::{debug, warn};
use tokio::task;

use super::{
    bulk_loader::{self, is_valid_station, BulkFile, BulkLoader, MeteostatConfig},
    observations::{daily_from_batches, hourly_from_batches},
    units::Units,
};
use crate::{envelope::TIMESTAMP_FORMAT, DailyObservation, HourlyObservation};

/// Upper bound when searching for the end of a DST gap
const MAX_GAP_MINUTES: i64 = 48 * 60;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to query duckdb: {0}")]
    Query(#[from] duckdb::Error),
    #[error("Failed to load bulk data: {0}")]
    Loader(#[from] bulk_loader::Error),
    #[error("Query task failed: {0}")]
    TaskJoin(#[from] task::JoinError),
    #[error("Query result is missing column '{0}'")]
    MissingColumn(&'static str),
    #[error("Failed to parse timestamp '{0}'")]
    Timestamp(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Hourly,
}

impl Frequency {
    pub fn path_segment(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Hourly => "hourly",
        }
    }

    /// Bulk CSV columns in file order
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Frequency::Daily => &[
                "date", "tavg", "tmin", "tmax", "prcp", "snow", "wdir", "wspd", "wpgt", "pres",
                "tsun",
            ],
            Frequency::Hourly => &[
                "date", "hour", "temp", "dwpt", "rhum", "prcp", "snow", "wdir", "wspd", "wpgt",
                "pres", "tsun", "coco",
            ],
        }
    }

    fn timestamp_expr(self) -> &'static str {
        match self {
            Frequency::Daily => r#"CAST("date" AS TIMESTAMP)"#,
            Frequency::Hourly => r#"CAST("date" AS TIMESTAMP) + to_hours("hour")"#,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path_segment())
    }
}

/// Station query handed to a [`WeatherData`] source.
///
/// `start` and `end` are naive wall times, local to `timezone` when set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationRequest {
    pub station: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub timezone: Option<Tz>,
    pub model: bool,
    pub units: Option<String>,
    pub freq: Option<String>,
}

#[async_trait]
pub trait WeatherData: Sync + Send {
    /// Number of records matching the request
    async fn count(&self, frequency: Frequency, req: &StationRequest) -> Result<usize, Error>;
    async fn daily(&self, req: &StationRequest) -> Result<Vec<DailyObservation>, Error>;
    async fn hourly(&self, req: &StationRequest) -> Result<Vec<HourlyObservation>, Error>;
}

/// [`WeatherData`] backed by the Meteostat bulk service
pub struct MeteostatAccess {
    config: MeteostatConfig,
    loader: BulkLoader,
}

impl MeteostatAccess {
    /// Stale files of granularities with autoclean enabled are removed here
    pub fn new(config: MeteostatConfig) -> Result<Self, Error> {
        let loader = BulkLoader::new(&config.cache_dir, &config.bulk_url);
        for frequency in [Frequency::Daily, Frequency::Hourly] {
            let policy = config.policy(frequency);
            if policy.autoclean {
                loader.clean(frequency, policy)?;
            }
        }
        Ok(Self { config, loader })
    }

    /// Creates new in-memory connection, so every query starts from a clean slate
    fn open_connection() -> Result<Connection, duckdb::Error> {
        Connection::open_in_memory()
    }

    pub async fn query(&self, sql: String, params: Vec<String>) -> Result<Vec<RecordBatch>, Error> {
        task::spawn_blocking(move || {
            let conn = Self::open_connection()?;
            let mut stmt = conn.prepare(&sql)?;
            let batches: Vec<RecordBatch> =
                stmt.query_arrow(params_from_iter(params.iter()))?.collect();
            Ok::<_, Error>(batches)
        })
        .await?
    }

    /// Cached bulk files covering the request, downloading as needed
    async fn files(&self, frequency: Frequency, req: &StationRequest) -> Result<Vec<String>, Error> {
        if !is_valid_station(&req.station) {
            warn!("Rejecting malformed station id {:?}", req.station);
            return Ok(vec![]);
        }

        let wanted = match frequency {
            Frequency::Daily => vec![BulkFile::daily(&req.station, req.model)],
            Frequency::Hourly => {
                let (start, end) = utc_range(req);
                (start.year()..=end.year())
                    .map(|year| BulkFile::hourly(&req.station, req.model, year))
                    .collect()
            }
        };

        let policy = self.config.policy(frequency);
        let mut paths = Vec::with_capacity(wanted.len());
        for file in &wanted {
            if let Some(path) = self.loader.get_file(file, policy).await? {
                paths.push(path.to_string_lossy().into_owned());
            }
        }
        Ok(paths)
    }

    async fn select(
        &self,
        frequency: Frequency,
        req: &StationRequest,
    ) -> Result<Option<(String, Vec<String>)>, Error> {
        if let Some(freq) = &req.freq {
            debug!("Passing through freq={} without resampling", freq);
        }
        let files = self.files(frequency, req).await?;
        if files.is_empty() {
            return Ok(None);
        }
        let (start, end) = utc_range(req);
        let params = vec![
            start.format(TIMESTAMP_FORMAT).to_string(),
            end.format(TIMESTAMP_FORMAT).to_string(),
        ];
        Ok(Some((build_select(frequency, &files), params)))
    }
}

#[async_trait]
impl WeatherData for MeteostatAccess {
    async fn count(&self, frequency: Frequency, req: &StationRequest) -> Result<usize, Error> {
        let Some((select, params)) = self.select(frequency, req).await? else {
            return Ok(0);
        };
        let sql = format!("SELECT COUNT(*) AS row_count FROM ({})", select);
        let batches = self.query(sql, params).await?;

        let mut total = 0;
        for batch in &batches {
            let counts = batch
                .column_by_name("row_count")
                .and_then(|column| column.as_any().downcast_ref::<Int64Array>())
                .ok_or(Error::MissingColumn("row_count"))?;
            for row in 0..counts.len() {
                total += usize::try_from(counts.value(row)).unwrap_or_default();
            }
        }
        Ok(total)
    }

    async fn daily(&self, req: &StationRequest) -> Result<Vec<DailyObservation>, Error> {
        let Some((sql, params)) = self.select(Frequency::Daily, req).await? else {
            return Ok(vec![]);
        };
        let batches = self.query(sql, params).await?;
        let mut observations = daily_from_batches(&batches)?;

        let units = resolve_units(req.units.as_deref());
        for obs in &mut observations {
            units.convert_daily(obs);
        }
        Ok(observations)
    }

    async fn hourly(&self, req: &StationRequest) -> Result<Vec<HourlyObservation>, Error> {
        let Some((sql, params)) = self.select(Frequency::Hourly, req).await? else {
            return Ok(vec![]);
        };
        let batches = self.query(sql, params).await?;
        let mut observations = hourly_from_batches(&batches)?;

        let units = resolve_units(req.units.as_deref());
        for obs in &mut observations {
            if let Some(tz) = req.timezone {
                obs.localize(tz)?;
            }
            units.convert_hourly(obs);
        }
        Ok(observations)
    }
}

fn resolve_units(raw: Option<&str>) -> Units {
    match raw.map(str::parse::<Units>) {
        None => Units::Metric,
        Some(Ok(units)) => units,
        Some(Err(e)) => {
            warn!("{}, falling back to metric", e);
            Units::Metric
        }
    }
}

/// Request bounds as UTC wall times
fn utc_range(req: &StationRequest) -> (NaiveDateTime, NaiveDateTime) {
    match req.timezone {
        Some(tz) => (local_to_utc(req.start, tz), local_to_utc(req.end, tz)),
        None => (req.start, req.end),
    }
}

/// Convert a wall time in `tz` to UTC. Ambiguous times take the earlier
/// instant, times inside a gap move forward to the first valid minute.
pub fn local_to_utc(local: NaiveDateTime, tz: Tz) -> NaiveDateTime {
    if let Some(instant) = tz.from_local_datetime(&local).earliest() {
        return instant.naive_utc();
    }
    let floor = local
        .with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(local);
    (1..=MAX_GAP_MINUTES)
        .map(|minutes| floor + Duration::minutes(minutes))
        .find_map(|candidate| tz.from_local_datetime(&candidate).earliest())
        .map(|instant| instant.naive_utc())
        .unwrap_or(local)
}

fn build_select(frequency: Frequency, files: &[String]) -> String {
    let columns = frequency.columns();
    let schema = columns
        .iter()
        .map(|name| {
            let kind = match *name {
                "date" => "DATE",
                "hour" => "BIGINT",
                _ => "DOUBLE",
            };
            format!("'{}': '{}'", name, kind)
        })
        .collect::<Vec<_>>()
        .join(", ");
    let outputs = columns
        .iter()
        .filter(|name| !matches!(**name, "date" | "hour"))
        .map(|name| format!(r#""{}""#, name))
        .collect::<Vec<_>>()
        .join(", ");
    let file_list = files
        .iter()
        .map(|file| format!("'{}'", file.replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"SELECT strftime(ts, '%Y-%m-%d %H:%M:%S') AS observed_at, {outputs}
        FROM (
            SELECT {timestamp} AS ts, *
            FROM read_csv([{file_list}], header = false, delim = ',', dateformat = '%Y-%m-%d', columns = {{{schema}}})
        )
        WHERE ts BETWEEN CAST(? AS TIMESTAMP) AND CAST(? AS TIMESTAMP)
        ORDER BY ts"#,
        timestamp = frequency.timestamp_expr(),
    )
}
