use clap::Parser;
use fern::{
    colors::{Color, ColoredLevelConfig},
    Dispatch,
};
use log::LevelFilter;
use meteostat_api_core::{
    find_config_file, get_xdg_cache_dir, load_config, ConfigSource, DEFAULT_PORT,
};
use std::{env, path::PathBuf, time::Duration};
use time::{format_description::well_known::Iso8601, OffsetDateTime};

use crate::MeteostatConfig;

#[derive(Parser, Clone, Debug, serde::Deserialize, Default)]
#[command(
    author,
    version,
    about = "Meteostat JSON API - daily and hourly weather station data"
)]
pub struct Cli {
    /// Path to config file (TOML format)
    /// Searched in order: this flag, $METEOSTAT_API_CONFIG, ./meteostat-api.toml,
    /// $XDG_CONFIG_HOME/meteostat-api/meteostat-api.toml, /etc/meteostat-api/meteostat-api.toml
    #[arg(short, long)]
    #[serde(skip)]
    pub config: Option<String>,

    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, env = "METEOSTAT_API_LEVEL")]
    pub level: Option<String>,

    /// Host to listen on (use 0.0.0.0 for all interfaces)
    #[arg(short, long, env = "METEOSTAT_API_HOST")]
    #[serde(alias = "host")]
    pub domain: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "METEOSTAT_API_PORT")]
    pub port: Option<String>,

    /// Directory for cached bulk CSV files
    #[arg(long, env = "METEOSTAT_API_CACHE_DIR")]
    pub cache_dir: Option<String>,

    /// Base URL of the Meteostat bulk data service
    #[arg(long, env = "METEOSTAT_API_BULK_URL")]
    pub bulk_url: Option<String>,

    /// Seconds a cached daily file stays fresh
    #[arg(long, env = "METEOSTAT_API_DAILY_MAX_AGE")]
    pub daily_max_age: Option<u64>,

    /// Seconds a cached hourly file stays fresh
    #[arg(long, env = "METEOSTAT_API_HOURLY_MAX_AGE")]
    pub hourly_max_age: Option<u64>,

    /// Remove stale cache files at startup
    #[arg(long, env = "METEOSTAT_API_AUTOCLEAN")]
    pub autoclean: Option<bool>,
}

impl Cli {
    /// Get the effective configuration value with defaults
    pub fn host(&self) -> String {
        self.domain
            .clone()
            .unwrap_or_else(|| "127.0.0.1".to_string())
    }

    pub fn port(&self) -> String {
        self.port.clone().unwrap_or_else(|| DEFAULT_PORT.to_string())
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(get_xdg_cache_dir)
    }

    /// Adapter configuration, starting from the defaults
    pub fn meteostat_config(&self) -> MeteostatConfig {
        let mut config = MeteostatConfig::new(self.cache_dir());
        if let Some(bulk_url) = &self.bulk_url {
            config.bulk_url = bulk_url.clone();
        }
        if let Some(secs) = self.daily_max_age {
            config.daily.max_age = Duration::from_secs(secs);
        }
        if let Some(secs) = self.hourly_max_age {
            config.hourly.max_age = Duration::from_secs(secs);
        }
        if let Some(autoclean) = self.autoclean {
            config.daily.autoclean = autoclean;
            config.hourly.autoclean = autoclean;
        }
        config
    }

    /// Values set here win over `other`
    fn merge(self, other: Cli) -> Cli {
        Cli {
            config: self.config,
            level: self.level.or(other.level),
            domain: self.domain.or(other.domain),
            port: self.port.or(other.port),
            cache_dir: self.cache_dir.or(other.cache_dir),
            bulk_url: self.bulk_url.or(other.bulk_url),
            daily_max_age: self.daily_max_age.or(other.daily_max_age),
            hourly_max_age: self.hourly_max_age.or(other.hourly_max_age),
            autoclean: self.autoclean.or(other.autoclean),
        }
    }
}

/// Load configuration from CLI args, config file, and environment
pub fn get_config_info() -> Cli {
    let cli_args = Cli::parse();

    let source = if let Some(ref path) = cli_args.config {
        ConfigSource::Explicit(path.into())
    } else {
        find_config_file("METEOSTAT_API_CONFIG", "meteostat-api.toml")
    };

    if let Some(path) = source.path() {
        log::info!("Loading config from: {}", path.display());
    }

    let file_config: Cli = load_config(&source).unwrap_or_default();

    // CLI args override file config (env vars are handled by clap)
    cli_args.merge(file_config)
}

pub fn get_log_level(cli: &Cli) -> LevelFilter {
    let level_str = cli
        .level
        .clone()
        .or_else(|| env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string());

    match level_str.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}

pub fn setup_logger() -> Dispatch {
    let colors = ColoredLevelConfig::new()
        .trace(Color::White)
        .debug(Color::Cyan)
        .info(Color::Blue)
        .warn(Color::Yellow)
        .error(Color::Magenta);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            let timestamp = OffsetDateTime::now_utc()
                .format(&Iso8601::DEFAULT)
                .unwrap_or_default();
            out.finish(format_args!(
                "[{} {}] {}: {}",
                timestamp,
                colors.color(record.level()),
                record.target(),
                message
            ));
        })
        .chain(std::io::stdout())
}
