//! Drive discovery and status file errors

use std::path::{Path, PathBuf};

use super::UpdaterError;

/// Creates a drive not found error listing the probed locations
pub fn not_found(label: impl Into<String>, searched: &[PathBuf]) -> UpdaterError {
    UpdaterError::DeviceNotFound {
        label: label.into(),
        searched: searched.iter().map(|p| p.display().to_string()).collect(),
    }
}

/// Creates a read-only drive error
pub fn read_only(label: impl Into<String>, path: &Path) -> UpdaterError {
    UpdaterError::DeviceReadOnly {
        label: label.into(),
        path: path.display().to_string(),
    }
}

/// Creates a missing status file error
pub fn status_missing(path: &Path) -> UpdaterError {
    UpdaterError::StatusFileMissing {
        path: path.display().to_string(),
    }
}

/// Creates a missing board id error
pub fn board_id_missing(path: &Path) -> UpdaterError {
    UpdaterError::BoardIdMissing {
        path: path.display().to_string(),
    }
}
