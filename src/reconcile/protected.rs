//! User-owned files that reconciliation must not replace or delete

use std::collections::BTreeSet;

/// Wi-Fi credentials, user settings, pin configuration and saved DigiROMs
pub const DEFAULT_PROTECTED: [&str; 4] = [
    "secrets.py",
    "config.py",
    "board_config.py",
    "digiroms.txt",
];

/// File names matched by name alone, wherever they appear
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedPathSet {
    names: BTreeSet<String>,
}

impl ProtectedPathSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.names.contains(file_name)
    }

    /// Whether the last segment of a `/`-separated relative path is protected
    pub fn covers(&self, relative_path: &str) -> bool {
        relative_path
            .rsplit('/')
            .next()
            .is_some_and(|name| self.contains(name))
    }
}

impl Default for ProtectedPathSet {
    fn default() -> Self {
        Self::new(DEFAULT_PROTECTED)
    }
}
