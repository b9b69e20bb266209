//! Bundle archive errors

use super::UpdaterError;

/// Creates a corrupt bundle error
pub fn corrupt(reason: impl Into<String>) -> UpdaterError {
    UpdaterError::BundleCorrupt {
        reason: reason.into(),
    }
}
