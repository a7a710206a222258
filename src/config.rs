//! Runtime settings.
//!
//! Settings are stored in the database `config` table, which is seeded with
//! defaults on first open. The database location itself can be overridden
//! with the `KEYCAT_DB` environment variable.

use crate::database::Database;
use crate::error::{KeycatError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Environment variable overriding the database path.
pub const DB_PATH_ENV: &str = "KEYCAT_DB";

pub const CAPTURE_MODE_KEY: &str = "capture_mode";
pub const RECORD_BUTTONS_KEY: &str = "record_buttons";

/// Which mouse event creator is wired in at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// Clicks are recorded without a screenshot.
    None,
    /// Every qualifying click captures the whole screen.
    #[default]
    Fullscreen,
}

impl FromStr for CaptureMode {
    type Err = KeycatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(CaptureMode::None),
            "fullscreen" | "full" => Ok(CaptureMode::Fullscreen),
            other => Err(KeycatError::Config {
                key: CAPTURE_MODE_KEY.to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureMode::None => write!(f, "none"),
            CaptureMode::Fullscreen => write!(f, "fullscreen"),
        }
    }
}

/// Settings read at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub capture_mode: CaptureMode,

    /// Whether clicks are persisted as `Button` records.
    pub record_buttons: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            capture_mode: CaptureMode::Fullscreen,
            record_buttons: true,
        }
    }
}

impl Settings {
    /// Reads settings from the config table, falling back to defaults for
    /// missing keys.
    pub fn load(db: &Database) -> Result<Self> {
        let defaults = Self::default();

        let capture_mode = match db.get_config(CAPTURE_MODE_KEY)? {
            Some(value) => value.parse()?,
            None => defaults.capture_mode,
        };

        let record_buttons = match db.get_config(RECORD_BUTTONS_KEY)? {
            Some(value) => parse_bool(RECORD_BUTTONS_KEY, &value)?,
            None => defaults.record_buttons,
        };

        let settings = Self {
            capture_mode,
            record_buttons,
        };
        tracing::debug!(?settings, "Loaded settings");
        Ok(settings)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(KeycatError::Config {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Resolves the database path: `KEYCAT_DB` if set, otherwise the platform
/// data directory.
pub fn database_path() -> PathBuf {
    match std::env::var_os(DB_PATH_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keycat")
            .join("buttons.db"),
    }
}
