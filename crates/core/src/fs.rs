//! Filesystem utilities

use std::fs;
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};

use log::{debug, error, info};

/// Ensure a directory exists, creating it if necessary
///
/// Returns true if the directory exists (either already existed or was created).
pub fn ensure_dir_exists(path: &Path) -> bool {
    if path.is_dir() {
        return true;
    }

    match fs::create_dir_all(path) {
        Ok(_) => {
            info!("Created directory: {}", path.display());
            true
        }
        Err(e) => {
            error!("Failed to create directory {}: {}", path.display(), e);
            false
        }
    }
}

/// Recursively delete files under `dir` whose modification time is at least
/// `max_age` in the past.
///
/// Only files with the given extension are considered. A missing `dir` is not
/// an error. Returns the number of files removed.
pub fn remove_stale_files(dir: &Path, extension: &str, max_age: Duration) -> io::Result<usize> {
    if !dir.is_dir() {
        return Ok(0);
    }

    let now = SystemTime::now();
    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            removed += remove_stale_files(&path, extension, max_age)?;
            continue;
        }
        if path.extension().and_then(|e| e.to_str()) != Some(extension) {
            continue;
        }

        let modified = fs::metadata(&path)?.modified()?;
        let age = now.duration_since(modified).unwrap_or_default();
        if age >= max_age {
            fs::remove_file(&path)?;
            debug!("Removed stale file: {}", path.display());
            removed += 1;
        }
    }
    Ok(removed)
}
