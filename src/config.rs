//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;

use crate::autosave::DEFAULT_AUTOSAVE_DELAY;

/// Configuration for opening a notes session.
#[derive(Clone, Debug)]
pub struct Config {
    /// SQLite database location (from PAGENOTES_DB).
    pub db_path: PathBuf,
    /// Debounce window for autosave (from PAGENOTES_AUTOSAVE_MS).
    pub autosave_delay: Duration,
}

impl Config {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let db_path = match std::env::var_os("PAGENOTES_DB") {
            Some(path) => PathBuf::from(path),
            None => crate::db::default_path()?,
        };

        let autosave_delay = std::env::var("PAGENOTES_AUTOSAVE_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_AUTOSAVE_DELAY);

        Ok(Self {
            db_path,
            autosave_delay,
        })
    }
}
