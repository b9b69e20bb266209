//! Scratch space for downloads and unpacked bundles, kept off the device
//! drive and never relative to the current working directory.

use std::env;
use std::io;
use std::path::PathBuf;

use tempfile::{Builder, NamedTempFile, TempDir};

/// Prefix for every scratch file and directory this tool creates
const SCRATCH_PREFIX: &str = "wificom-update-";

/// Returns a directory path suitable for creating temporary files.
/// Never returns a relative path (e.g. when TMPDIR=tmp).
pub fn temp_dir_base() -> PathBuf {
    let t = env::temp_dir();
    if t.is_absolute() {
        t
    } else {
        #[cfg(windows)]
        {
            env::var("TEMP")
                .or_else(|_| env::var("TMP"))
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("C:\\Windows\\Temp"))
        }
        #[cfg(not(windows))]
        {
            PathBuf::from("/tmp")
        }
    }
}

/// Create a scratch directory that is removed when dropped
pub fn scratch_dir(purpose: &str) -> io::Result<TempDir> {
    Builder::new()
        .prefix(&format!("{SCRATCH_PREFIX}{purpose}-"))
        .tempdir_in(temp_dir_base())
}

/// Create a scratch file that is removed when dropped
pub fn scratch_file(suffix: &str) -> io::Result<NamedTempFile> {
    Builder::new()
        .prefix(SCRATCH_PREFIX)
        .suffix(suffix)
        .tempfile_in(temp_dir_base())
}
