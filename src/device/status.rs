//! Runtime version and board identifier from the drive's `boot_out.txt`

#![allow(clippy::expect_used)]

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, UpdaterError, device as device_error};

/// Status file written by CircuitPython on every boot
pub const STATUS_FILE: &str = "boot_out.txt";

/// Board id of the Raspberry Pi Pico W, the only board using the `picow` bundle
const PICO_W_BOARD_ID: &str = "raspberry_pi_pico_w";

static RUNTIME_VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Adafruit CircuitPython ([0-9a-z\-\.]+) on").expect("runtime version pattern")
});

static BOARD_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Board ID:(.+)").expect("board id pattern"));

/// What the device reports about itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    /// `None` when the status file does not name a version
    pub runtime_version: Option<String>,
    pub board_id: String,
}

impl VersionInfo {
    /// Bundle variant built for this board
    pub fn variant(&self) -> &'static str {
        board_variant(&self.board_id)
    }
}

/// Bundle variant for a board id: `picow` or `nina`
pub fn board_variant(board_id: &str) -> &'static str {
    if board_id == PICO_W_BOARD_ID {
        "picow"
    } else {
        "nina"
    }
}

/// Extract the runtime version from status file text
pub fn parse_runtime_version(content: &str) -> Option<String> {
    RUNTIME_VERSION_RE
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

/// Extract the board id from status file text
pub fn parse_board_id(content: &str) -> Option<String> {
    BOARD_ID_RE
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|id| !id.is_empty())
}

/// Read [`VersionInfo`] from the drive. A missing board id is fatal because
/// the bundle variant depends on it; a missing version is not.
pub fn read_version_info(drive: &Path) -> Result<VersionInfo> {
    let path = drive.join(STATUS_FILE);
    let content = match std::fs::read(&path) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(device_error::status_missing(&path));
        }
        Err(e) => {
            return Err(UpdaterError::FileReadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            });
        }
    };

    let board_id = parse_board_id(&content).ok_or_else(|| device_error::board_id_missing(&path))?;

    Ok(VersionInfo {
        runtime_version: parse_runtime_version(&content),
        board_id,
    })
}
