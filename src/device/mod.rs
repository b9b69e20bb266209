//! Drive discovery
//!
//! Finds the mounted CIRCUITPY volume and checks that it can be written to.
//! Probing is read-only apart from the short-lived writability test file.

pub mod board_config;
pub mod marker;
pub mod status;

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, device as device_error};

pub use status::{STATUS_FILE, VersionInfo, read_version_info};

/// Locates the device drive by volume label
#[derive(Debug, Clone)]
pub struct DriveLocator {
    label: String,
    override_path: Option<PathBuf>,
}

impl DriveLocator {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            override_path: None,
        }
    }

    /// Use `path` instead of probing mount points
    pub fn with_override(mut self, path: Option<PathBuf>) -> Self {
        self.override_path = path;
        self
    }

    /// Mount points to probe, in order
    pub fn candidates(&self) -> Vec<PathBuf> {
        if let Some(ref path) = self.override_path {
            return vec![path.clone()];
        }
        platform_candidates(&self.label)
    }

    /// Find the drive, or fail with the list of probed locations
    pub fn locate(&self) -> Result<PathBuf> {
        let candidates = self.candidates();
        for candidate in &candidates {
            debug!("Probing {}", candidate.display());
            if candidate.is_dir() {
                return Ok(dunce::canonicalize(candidate).unwrap_or_else(|_| candidate.clone()));
            }
        }
        Err(device_error::not_found(&self.label, &candidates))
    }

    /// Find the drive and make sure it is usable for an install
    pub fn locate_writable(&self) -> Result<PathBuf> {
        let drive = self.locate()?;
        if !check_writable(&drive) {
            return Err(device_error::read_only(&self.label, &drive));
        }
        let status_path = drive.join(STATUS_FILE);
        if !status_path.is_file() {
            return Err(device_error::status_missing(&status_path));
        }
        Ok(drive)
    }
}

#[cfg(windows)]
fn platform_candidates(label: &str) -> Vec<PathBuf> {
    let disks = sysinfo::Disks::new_with_refreshed_list();
    disks
        .list()
        .iter()
        .filter(|disk| disk.name() == std::ffi::OsStr::new(label))
        .map(|disk| disk.mount_point().to_path_buf())
        .collect()
}

#[cfg(not(windows))]
fn platform_candidates(label: &str) -> Vec<PathBuf> {
    posix_candidates(label, current_user().as_deref())
}

/// Well-known removable-media mount points for `label`
#[cfg_attr(windows, allow(dead_code))]
pub fn posix_candidates(label: &str, user: Option<&str>) -> Vec<PathBuf> {
    let mut candidates = vec![Path::new("/Volumes").join(label)];
    if let Some(user) = user.filter(|u| !u.is_empty()) {
        candidates.push(Path::new("/media").join(user).join(label));
        candidates.push(Path::new("/run/media").join(user).join(label));
    }
    candidates
}

#[cfg_attr(windows, allow(dead_code))]
fn current_user() -> Option<String> {
    ["USER", "LOGNAME", "USERNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
        .or_else(|| {
            dirs::home_dir()
                .and_then(|home| home.file_name().map(|n| n.to_string_lossy().into_owned()))
        })
}

/// Whether files can be created on the drive. Never fails; any I/O error
/// counts as not writable.
///
/// FAT volumes on Windows report permission bits unreliably, so a throwaway
/// file is created and removed. POSIX systems check the permission bits
/// first.
pub fn check_writable(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    if !metadata.is_dir() {
        return false;
    }
    #[cfg(unix)]
    if metadata.permissions().readonly() {
        return false;
    }
    probe_write(path)
}

fn probe_write(path: &Path) -> bool {
    tempfile::Builder::new()
        .prefix(".wificom_updater_test")
        .suffix(".txt")
        .tempfile_in(path)
        .and_then(|mut file| {
            file.write_all(b"test")?;
            file.flush()?;
            file.close()
        })
        .is_ok()
}
