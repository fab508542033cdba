//! Download and cache Meteostat bulk CSV files.
//!
//! Files are fetched gzipped from the bulk endpoint and stored decompressed
//! under the cache directory, mirroring the remote layout:
//! `{granularity}/{full|obs}/[{year}/]{station}.csv`.

use std::{
    io,
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
    time::{Duration, SystemTime},
};

use async_compression::tokio::bufread::GzipDecoder;
use futures::TryStreamExt;
use log::{debug, info, warn};
use meteostat_api_core::{
    remove_stale_files, DEFAULT_BULK_URL, DEFAULT_DAILY_MAX_AGE, DEFAULT_HOURLY_MAX_AGE,
};
use reqwest::{Client, StatusCode};
use tokio::{fs, io::AsyncWriteExt};
use tokio_util::io::StreamReader;

use super::weather_data::Frequency;

const CSV_EXTENSION: &str = "csv";

static PART_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Bulk service returned {status} for {url}")]
    HttpStatus { url: String, status: StatusCode },
    #[error("Cache IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// How long cached files of one granularity stay valid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub max_age: Duration,
    /// Remove stale files when the adapter is constructed
    pub autoclean: bool,
}

/// Adapter configuration, built once at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeteostatConfig {
    pub cache_dir: PathBuf,
    pub bulk_url: String,
    pub daily: CachePolicy,
    pub hourly: CachePolicy,
}

impl MeteostatConfig {
    /// Default bulk endpoint with 48h daily and 3h hourly caching, autoclean off
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            bulk_url: DEFAULT_BULK_URL.to_owned(),
            daily: CachePolicy {
                max_age: Duration::from_secs(DEFAULT_DAILY_MAX_AGE),
                autoclean: false,
            },
            hourly: CachePolicy {
                max_age: Duration::from_secs(DEFAULT_HOURLY_MAX_AGE),
                autoclean: false,
            },
        }
    }

    pub fn policy(&self, frequency: Frequency) -> &CachePolicy {
        match frequency {
            Frequency::Daily => &self.daily,
            Frequency::Hourly => &self.hourly,
        }
    }
}

/// A single remote bulk file and its cache location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkFile {
    frequency: Frequency,
    model: bool,
    year: Option<i32>,
    station: String,
}

impl BulkFile {
    pub fn daily(station: &str, model: bool) -> Self {
        Self {
            frequency: Frequency::Daily,
            model,
            year: None,
            station: station.to_owned(),
        }
    }

    pub fn hourly(station: &str, model: bool, year: i32) -> Self {
        Self {
            frequency: Frequency::Hourly,
            model,
            year: Some(year),
            station: station.to_owned(),
        }
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    fn directory(&self) -> PathBuf {
        let mut dir = PathBuf::from(self.frequency.path_segment());
        dir.push(if self.model { "full" } else { "obs" });
        if let Some(year) = self.year {
            dir.push(year.to_string());
        }
        dir
    }

    /// Path relative to the bulk endpoint
    pub fn url_path(&self) -> String {
        let dir = self.directory();
        let segments: Vec<_> = dir.iter().filter_map(|s| s.to_str()).collect();
        format!("{}/{}.csv.gz", segments.join("/"), self.station)
    }

    /// Path relative to the cache directory
    pub fn cache_path(&self) -> PathBuf {
        self.directory()
            .join(format!("{}.{}", self.station, CSV_EXTENSION))
    }
}

/// Station ids end up in URLs and paths, so only a conservative set of
/// characters is allowed.
pub fn is_valid_station(station: &str) -> bool {
    !station.is_empty()
        && station
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Whether a file last modified at `modified` is still within `max_age`.
/// Modification times in the future count as fresh.
pub fn is_fresh(modified: SystemTime, now: SystemTime, max_age: Duration) -> bool {
    match now.duration_since(modified) {
        Ok(age) => age < max_age,
        Err(_) => true,
    }
}

pub struct BulkLoader {
    cache_dir: PathBuf,
    bulk_url: String,
    download_client: Client,
}

impl BulkLoader {
    pub fn new(cache_dir: &Path, bulk_url: &str) -> Self {
        Self {
            cache_dir: cache_dir.to_path_buf(),
            bulk_url: bulk_url.trim_end_matches('/').to_owned(),
            download_client: Client::new(),
        }
    }

    pub fn url(&self, file: &BulkFile) -> String {
        format!("{}/{}", self.bulk_url, file.url_path())
    }

    pub fn cache_path(&self, file: &BulkFile) -> PathBuf {
        self.cache_dir.join(file.cache_path())
    }

    /// Local path of `file`, downloading it when missing or stale.
    ///
    /// `None` means the bulk service has no data for the file. An empty
    /// body counts as no data and an empty cached file is never returned.
    pub async fn get_file(
        &self,
        file: &BulkFile,
        policy: &CachePolicy,
    ) -> Result<Option<PathBuf>, Error> {
        let path = self.cache_path(file);
        if let Ok(metadata) = fs::metadata(&path).await {
            let modified = metadata.modified().map_err(|source| Error::Io {
                path: path.clone(),
                source,
            })?;
            if is_fresh(modified, SystemTime::now(), policy.max_age) {
                debug!("Cache hit for {:?}", path);
                if metadata.len() == 0 {
                    return Ok(None);
                }
                return Ok(Some(path));
            }
            info!("Cached file {:?} is stale, refreshing", path);
        }

        self.download(file, &path).await
    }

    /// Download `file` into `path` through a temporary sibling file that is
    /// renamed into place once complete.
    async fn download(&self, file: &BulkFile, path: &Path) -> Result<Option<PathBuf>, Error> {
        let url = self.url(file);
        info!("Downloading data from {}", url);

        let response = self
            .download_client
            .get(&url)
            .send()
            .await
            .map_err(|source| Error::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            warn!("No bulk data at {}", url);
            return Ok(None);
        }
        if !status.is_success() {
            return Err(Error::HttpStatus { url, status });
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| Error::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let part = part_path(path);
        let stream = response.bytes_stream().map_err(io::Error::other);
        let mut decoder = GzipDecoder::new(StreamReader::new(stream));

        let written = match write_part(&mut decoder, &part).await {
            Ok(written) => written,
            Err(source) => {
                let _ = fs::remove_file(&part).await;
                return Err(Error::Io { path: part, source });
            }
        };
        if written == 0 {
            warn!("Empty bulk file at {}", url);
            let _ = fs::remove_file(&part).await;
            return Ok(None);
        }
        fs::rename(&part, path).await.map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Cached {} bytes from {} at {:?}", written, url, path);
        Ok(Some(path.to_path_buf()))
    }

    /// Remove stale cached files of one granularity
    pub fn clean(&self, frequency: Frequency, policy: &CachePolicy) -> Result<usize, Error> {
        let dir = self.cache_dir.join(frequency.path_segment());
        let removed = remove_stale_files(&dir, CSV_EXTENSION, policy.max_age)
            .map_err(|source| Error::Io { path: dir, source })?;
        info!("Removed {} stale {} files", removed, frequency);
        Ok(removed)
    }
}

async fn write_part<R>(reader: &mut R, part: &Path) -> io::Result<u64>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut out = fs::File::create(part).await?;
    let written = tokio::io::copy(reader, &mut out).await?;
    out.flush().await?;
    Ok(written)
}

fn part_path(path: &Path) -> PathBuf {
    let id = PART_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.{}.part", std::process::id(), id));
    path.with_file_name(name)
}
