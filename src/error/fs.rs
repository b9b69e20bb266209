//! File system errors

use std::path::Path;

use super::UpdaterError;

/// Creates a file read failed error
pub fn read_failed(path: &Path, err: &std::io::Error) -> UpdaterError {
    UpdaterError::FileReadFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Creates a file write failed error
pub fn write_failed(path: &Path, err: &std::io::Error) -> UpdaterError {
    UpdaterError::FileWriteFailed {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}

/// Creates a per-file reconciliation error
pub fn reconcile_failed(relative_path: &str, reason: impl ToString) -> UpdaterError {
    UpdaterError::ReconciliationIo {
        path: relative_path.to_string(),
        reason: reason.to_string(),
    }
}
