//! Error types and handling for wificom-update
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`device`]: Drive discovery and status file errors
//! - [`remote`]: Release API and download errors
//! - [`bundle`]: Bundle archive errors
//! - [`fs`]: File system errors

pub mod bundle;
pub mod device;
pub mod fs;
pub mod remote;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for wificom-update operations
#[derive(Error, Diagnostic, Debug)]
pub enum UpdaterError {
    // Device errors
    #[error("{label} drive not found")]
    #[diagnostic(
        code(wificom_update::device::not_found),
        help("Connect the WiFiCom in Drive mode, or pass --drive <path>")
    )]
    DeviceNotFound { label: String, searched: Vec<String> },

    #[error("{label} drive at '{path}' is read-only")]
    #[diagnostic(
        code(wificom_update::device::read_only),
        help("Please use Drive mode on the WiFiCom")
    )]
    DeviceReadOnly { label: String, path: String },

    #[error("Status file not found: {path}")]
    #[diagnostic(
        code(wificom_update::device::status_missing),
        help("The drive does not look like a CircuitPython device")
    )]
    StatusFileMissing { path: String },

    #[error("Board ID not found in {path}")]
    #[diagnostic(code(wificom_update::device::board_id_missing))]
    BoardIdMissing { path: String },

    // Remote errors
    #[error("Request to {url} failed: {reason}")]
    #[diagnostic(
        code(wificom_update::remote::unavailable),
        help("Check your internet connection and try again")
    )]
    RemoteUnavailable { url: String, reason: String },

    #[error("No releases at or above {minimum} are available")]
    #[diagnostic(code(wificom_update::remote::no_releases))]
    NoSupportedReleases { minimum: String },

    #[error("No download found for '{reference}' and device type ({board_id})")]
    #[diagnostic(
        code(wificom_update::remote::bundle_unresolved),
        help("Please try another version next time")
    )]
    BundleUrlUnresolved { reference: String, board_id: String },

    // Decisions
    #[error("Installation cancelled: runtime {installed} differs from recommended {recommended}")]
    #[diagnostic(code(wificom_update::guard::blocked))]
    VersionMismatchBlocked {
        installed: String,
        recommended: String,
    },

    #[error("Exited without changes")]
    #[diagnostic(code(wificom_update::aborted))]
    Aborted,

    // Bundle errors
    #[error("Bundle is corrupt: {reason}")]
    #[diagnostic(code(wificom_update::bundle::corrupt))]
    BundleCorrupt { reason: String },

    #[error("Failed to update '{path}': {reason}")]
    #[diagnostic(code(wificom_update::reconcile::io))]
    ReconciliationIo { path: String, reason: String },

    #[error("{failed} file(s) could not be updated")]
    #[diagnostic(
        code(wificom_update::reconcile::incomplete),
        help("Run the updater again; files that are already up to date will be skipped")
    )]
    ReconciliationIncomplete { failed: usize },

    // Configuration errors
    #[error("Failed to parse configuration file: {path}")]
    #[diagnostic(code(wificom_update::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    // File system errors
    #[error("Failed to read file: {path}")]
    #[diagnostic(code(wificom_update::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}")]
    #[diagnostic(code(wificom_update::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(wificom_update::fs::io_error))]
    IoError { message: String },
}

impl UpdaterError {
    /// Whether the run stopped because the user chose to, rather than a failure
    pub fn is_user_abort(&self) -> bool {
        matches!(
            self,
            UpdaterError::Aborted | UpdaterError::VersionMismatchBlocked { .. }
        )
    }
}

impl From<std::io::Error> for UpdaterError {
    fn from(err: std::io::Error) -> Self {
        UpdaterError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for UpdaterError {
    fn from(err: serde_yaml::Error) -> Self {
        UpdaterError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for UpdaterError {
    fn from(err: serde_json::Error) -> Self {
        UpdaterError::BundleCorrupt {
            reason: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for UpdaterError {
    fn from(err: reqwest::Error) -> Self {
        UpdaterError::RemoteUnavailable {
            url: err
                .url()
                .map_or_else(|| "unknown".to_string(), ToString::to_string),
            reason: err.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for UpdaterError {
    fn from(err: zip::result::ZipError) -> Self {
        UpdaterError::BundleCorrupt {
            reason: err.to_string(),
        }
    }
}

impl From<inquire::InquireError> for UpdaterError {
    fn from(err: inquire::InquireError) -> Self {
        UpdaterError::IoError {
            message: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, UpdaterError>;
