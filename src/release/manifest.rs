//! Recommended CircuitPython versions (`sources.json`)
//!
//! Two layouts exist in the wild:
//!
//! ```json
//! { "circuitpython": { "picow": "8.2.6", "nina": "8.2.6" } }
//! ```
//!
//! and the nested one, which maps board ids to a build and builds to their
//! runtime version:
//!
//! ```json
//! {
//!   "boards": { "raspberry_pi_pico_w": "picow" },
//!   "builds": { "picow": { "circuitpython": "9.0.0" } }
//! }
//! ```
//!
//! A document carrying both is read as the nested layout.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::device::status::board_variant;
use crate::error::{Result, bundle as bundle_error};

/// Manifest file name, at the bundle root and at the repository root
pub const MANIFEST_FILE: &str = "sources.json";

/// Flat layout keyed by bundle variant
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestV1 {
    pub circuitpython: BTreeMap<String, String>,
}

/// Nested layout with explicit board-to-build mapping
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestV2 {
    #[serde(default)]
    pub boards: BTreeMap<String, String>,
    #[serde(default)]
    pub builds: BTreeMap<String, BuildEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BuildEntry {
    pub circuitpython: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeManifest {
    V1(ManifestV1),
    V2(ManifestV2),
}

impl RuntimeManifest {
    /// Decide the layout once. `Ok(None)` means the document carries no
    /// runtime recommendation at all.
    pub fn from_value(value: Value) -> Result<Option<Self>> {
        let Some(object) = value.as_object() else {
            return Err(bundle_error::corrupt(format!(
                "{MANIFEST_FILE} is not a JSON object"
            )));
        };

        if object.contains_key("boards") || object.contains_key("builds") {
            let manifest: ManifestV2 = serde_json::from_value(value)?;
            return Ok(Some(RuntimeManifest::V2(manifest)));
        }
        if object.contains_key("circuitpython") {
            let manifest: ManifestV1 = serde_json::from_value(value)?;
            return Ok(Some(RuntimeManifest::V1(manifest)));
        }
        Ok(None)
    }

    /// Read a manifest file, `Ok(None)` if the file does not exist
    pub fn from_file(path: &Path) -> Result<Option<Self>> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(bundle_error::corrupt(format!("{}: {e}", path.display()))),
        };
        let value: Value = serde_json::from_str(&content)?;
        Self::from_value(value)
    }

    /// Recommended runtime version for `board_id`
    pub fn recommended_for(&self, board_id: &str) -> Option<String> {
        match self {
            RuntimeManifest::V1(manifest) => {
                manifest.circuitpython.get(board_variant(board_id)).cloned()
            }
            RuntimeManifest::V2(manifest) => {
                let build = manifest
                    .boards
                    .get(board_id)
                    .map_or_else(|| board_variant(board_id), String::as_str);
                manifest
                    .builds
                    .get(build)
                    .and_then(|entry| entry.circuitpython.clone())
            }
        }
    }
}
