//! Release API and download errors

use super::UpdaterError;

/// Creates a remote unavailable error
pub fn unavailable(url: impl Into<String>, reason: impl ToString) -> UpdaterError {
    UpdaterError::RemoteUnavailable {
        url: url.into(),
        reason: reason.to_string(),
    }
}

/// Creates a no supported releases error
pub fn no_releases(minimum: impl Into<String>) -> UpdaterError {
    UpdaterError::NoSupportedReleases {
        minimum: minimum.into(),
    }
}

/// Creates an unresolvable bundle URL error
pub fn bundle_unresolved(reference: impl Into<String>, board_id: impl Into<String>) -> UpdaterError {
    UpdaterError::BundleUrlUnresolved {
        reference: reference.into(),
        board_id: board_id.into(),
    }
}
