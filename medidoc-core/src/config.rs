//! User settings at `<home>/.medidoc/config.yaml`.
//!
//! Every field is optional; a missing file yields [`Settings::default`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::store::{home, root_at};

pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";
pub const DEFAULT_DATETIME_FORMAT: &str = "%d/%m/%Y %I:%M %p";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Hospital used when a command omits `--hospital`.
    pub default_hospital: Option<String>,
    /// chrono format string used by the `format_date` helper.
    pub date_format: String,
    /// chrono format string used by the `format_datetime` helper.
    pub datetime_format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            default_hospital: None,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
        }
    }
}

/// `<home>/.medidoc/config.yaml`: pure, no I/O.
pub fn settings_path_at(home: &Path) -> PathBuf {
    root_at(home).join("config.yaml")
}

/// Load settings, falling back to defaults when the file is absent.
pub fn load_settings_at(home: &Path) -> Result<Settings, StoreError> {
    let path = settings_path_at(home);
    if !path.exists() {
        return Ok(Settings::default());
    }
    let contents = std::fs::read_to_string(&path)?;
    serde_yaml::from_str(&contents).map_err(|e| StoreError::Parse { path, source: e })
}

/// `load_settings_at` convenience wrapper.
pub fn load_settings() -> Result<Settings, StoreError> {
    load_settings_at(&home()?)
}
