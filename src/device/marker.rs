//! Installed-version marker file on the drive
//!
//! Records which tag or commit was last applied. It is written only after a
//! complete reconciliation and is only ever displayed; every run compares
//! the bundle against the live drive regardless of what it says.

use std::io::Write;
use std::path::Path;

use crate::error::{Result, fs as fs_error};
use crate::reconcile::{STAGING_PREFIX, STAGING_SUFFIX};

/// Read the recorded version, if any
pub fn read_marker(drive: &Path, file_name: &str) -> Option<String> {
    std::fs::read_to_string(drive.join(file_name))
        .ok()
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
}

/// Record `version_ref` as installed, replacing the file in one rename
pub fn write_marker(drive: &Path, file_name: &str, version_ref: &str) -> Result<()> {
    let path = drive.join(file_name);
    let mut staged = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(STAGING_SUFFIX)
        .tempfile_in(drive)
        .map_err(|e| fs_error::write_failed(&path, &e))?;
    staged
        .write_all(version_ref.as_bytes())
        .map_err(|e| fs_error::write_failed(&path, &e))?;
    staged
        .persist(&path)
        .map_err(|e| fs_error::write_failed(&path, &e.error))?;
    Ok(())
}
