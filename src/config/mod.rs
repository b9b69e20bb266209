//! Updater configuration (config.yaml)
//!
//! All fields are optional in the file; anything left out keeps its built-in
//! default. The file is looked up from `--config`/`WIFICOM_UPDATE_CONFIG`
//! first, then from the user's config directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, UpdaterError};

/// Directory name under the platform config dir
const CONFIG_DIR_NAME: &str = "wificom-update";

/// Config file name inside [`CONFIG_DIR_NAME`]
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Settings for one updater run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Source repository as `owner/name`
    pub repository: String,

    /// Base URL of the releases/commits REST API
    pub api_base: String,

    /// Base URL for raw file contents at a git ref
    pub raw_base: String,

    /// Base URL of prebuilt per-commit archives
    pub archive_base: String,

    /// File name prefix of per-commit archives
    pub archive_prefix: String,

    /// Base URL of CircuitPython UF2 images
    pub uf2_base: String,

    /// Volume label of the device drive
    pub drive_label: String,

    /// Oldest release tag offered for installation
    pub minimum_version: String,

    /// Timeout applied to every HTTP request, in seconds
    pub timeout_secs: u64,

    /// File written to the drive after a successful install
    pub marker_file: String,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            repository: "mechawrench/wificom-lib".to_string(),
            api_base: "https://api.github.com".to_string(),
            raw_base: "https://raw.githubusercontent.com".to_string(),
            archive_base: "https://wificom-lib.s3.amazonaws.com/archives".to_string(),
            archive_prefix: "wificom-lib".to_string(),
            uf2_base: "https://adafruit-circuit-python.s3.amazonaws.com/bin".to_string(),
            drive_label: "CIRCUITPY".to_string(),
            minimum_version: "1.0.0".to_string(),
            timeout_secs: 30,
            marker_file: "wificom_installed_version.txt".to_string(),
        }
    }
}

impl UpdaterConfig {
    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Load configuration from an explicit path, the default location, or defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.is_file() => path,
                _ => {
                    debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        debug!("Loading config from {}", path.display());
        let content = std::fs::read_to_string(&path).map_err(|e| UpdaterError::FileReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_yaml(&content).map_err(|e| match e {
            UpdaterError::ConfigParseFailed { reason, .. } => UpdaterError::ConfigParseFailed {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// HTTP timeout as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Default config file location (`<config dir>/wificom-update/config.yaml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}
