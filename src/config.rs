//! Session settings
//!
//! Optional TOML file merged with command line flags. Flags win over the
//! file, the file wins over built-in defaults.
//!
//! ```toml
//! port = "COM3"
//! log_file = "Berechnung.txt"
//! read_timeout_ms = 2000
//! log_timestamps = false
//! ```

use crate::session::DEFAULT_LOG_FILE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Contents of a settings file; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Port identifier (e.g., COM3, ttyUSB0)
    pub port: Option<String>,
    /// Exchange log path
    pub log_file: Option<PathBuf>,
    /// Read timeout in milliseconds; absent or 0 blocks
    pub read_timeout_ms: Option<u64>,
    /// Prefix log lines with a timestamp
    pub log_timestamps: bool,
}

impl Settings {
    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Invalid settings file: {}", path.display()))
    }

    /// Parse settings from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub port: Option<String>,
    pub log_file: Option<PathBuf>,
    pub read_timeout_ms: Option<u64>,
    pub log_timestamps: bool,
}

/// Effective options for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// `None` means the operator is asked for the port
    pub port: Option<String>,
    pub log_file: PathBuf,
    pub read_timeout: Option<Duration>,
    pub log_timestamps: bool,
}

impl SessionOptions {
    pub fn resolve(settings: Settings, overrides: Overrides) -> Self {
        let port = overrides
            .port
            .or(settings.port)
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        let log_file = overrides
            .log_file
            .or(settings.log_file)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));

        let read_timeout = overrides
            .read_timeout_ms
            .or(settings.read_timeout_ms)
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);

        Self {
            port,
            log_file,
            read_timeout,
            log_timestamps: overrides.log_timestamps || settings.log_timestamps,
        }
    }
}
