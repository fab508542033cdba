//! Meteostat API Core Library
//!
//! Shared utilities for the API server:
//! - Configuration discovery and loading (XDG-compliant)
//! - Cache directory helpers
//! - Service-wide defaults

mod config;
pub mod fs;

pub use config::{find_config_file, get_xdg_cache_dir, load_config, ConfigSource};
pub use fs::{ensure_dir_exists, remove_stale_files};

/// Application name used for XDG paths
pub const APP_NAME: &str = "meteostat-api";

/// Default listen port
pub const DEFAULT_PORT: u16 = 9810;

/// Meteostat bulk data endpoint
pub const DEFAULT_BULK_URL: &str = "https://bulk.meteostat.net/v2";

/// Maximum age of cached daily files (48 hours)
pub const DEFAULT_DAILY_MAX_AGE: u64 = 60 * 60 * 48;

/// Maximum age of cached hourly files (3 hours)
pub const DEFAULT_HOURLY_MAX_AGE: u64 = 60 * 60 * 3;
