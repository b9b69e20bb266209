//! Reconciliation of an unpacked bundle onto the device drive
//!
//! The drive is always compared against the bundle file by file; nothing
//! from earlier runs is trusted. The rules are:
//!
//! - `lib/` files are added when missing, rewritten only when their BLAKE3
//!   digest differs, and left alone otherwise.
//! - Root-level files follow the same rule, except protected user files,
//!   which are only ever created and never replaced.
//! - A compiled `.mpy` module replaces a stale `.py` of the same name in `lib/`,
//!   unless that name is protected.
//! - Files in `lib/` that the bundle does not ship are deleted, unless their
//!   name is protected. Root-level files are never deleted.
//! - Directories left empty under `lib/` are removed, `lib/` itself is kept.
//!
//! Every write goes to a hidden staging file next to its destination and is
//! renamed into place, so an interrupted run leaves each file either old or
//! new. A failure on one file is logged and reported without stopping the
//! rest of the run.

pub mod manifest;
pub mod protected;

use std::fs::{self, File};
use std::io;
use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::bundle::LIBRARY_DIR;
use crate::error::{Result, UpdaterError, fs as fs_error};
use crate::hash;
use crate::ui::ProgressReporter;

pub use manifest::{BundleManifest, is_hidden_name, relative_key};
pub use protected::ProtectedPathSet;

/// Prefix of in-flight staging files
pub const STAGING_PREFIX: &str = ".wificom-";
/// Suffix of in-flight staging files
pub const STAGING_SUFFIX: &str = ".part";

/// What happened to each file, by `/`-separated path relative to the drive root
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub added: Vec<String>,
    pub modified: Vec<String>,
    pub skipped: Vec<String>,
    pub removed: Vec<String>,
    /// Per-file errors that did not stop the run
    pub failures: Vec<UpdaterError>,
}

impl ReconcileReport {
    /// True when the drive already matched the bundle
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.removed.is_empty()
    }

    fn record_failure(&mut self, error: UpdaterError) {
        warn!("{error}");
        self.failures.push(error);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileAction {
    Added,
    Modified,
    Skipped,
}

#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    protected: ProtectedPathSet,
}

impl Reconciler {
    /// Bring `target_dir` in line with `bundle_dir`
    ///
    /// Only a bundle that cannot be listed is an error; per-file problems
    /// end up in [`ReconcileReport::failures`].
    pub fn apply(
        &self,
        bundle_dir: &Path,
        target_dir: &Path,
        progress: &mut dyn ProgressReporter,
    ) -> Result<ReconcileReport> {
        let manifest = BundleManifest::scan(bundle_dir)?;
        info!(
            "Reconciling {} library and {} root file(s) onto {}",
            manifest.library.len(),
            manifest.root.len(),
            target_dir.display()
        );

        let mut report = ReconcileReport::default();
        progress.init_file_progress(manifest.file_count() as u64);

        for key in &manifest.library {
            progress.update_file(key);
            self.clear_blockers(target_dir, key, &manifest, &mut report);
            self.sync_entry(bundle_dir, target_dir, key, &mut report);
            self.elide_source_companion(target_dir, key, &manifest, &mut report);
        }

        for key in &manifest.root {
            progress.update_file(key);
            if self.protected.covers(key) && target_dir.join(key).exists() {
                debug!("Keeping user file {key}");
                report.skipped.push(key.clone());
                continue;
            }
            self.sync_entry(bundle_dir, target_dir, key, &mut report);
        }

        remove_root_leftovers(target_dir);
        let target_lib = target_dir.join(LIBRARY_DIR);
        if target_lib.is_dir() {
            self.remove_stale(target_dir, &target_lib, &manifest, &mut report);
            prune_empty_dirs(&target_lib, &mut report);
        }

        progress.finish_files();
        info!(
            "{} added, {} updated, {} unchanged, {} removed, {} failed",
            report.added.len(),
            report.modified.len(),
            report.skipped.len(),
            report.removed.len(),
            report.failures.len()
        );
        Ok(report)
    }

    fn sync_entry(&self, bundle_dir: &Path, target_dir: &Path, key: &str, report: &mut ReconcileReport) {
        match sync_file(&bundle_dir.join(key), &target_dir.join(key)) {
            Ok(FileAction::Added) => report.added.push(key.to_string()),
            Ok(FileAction::Modified) => report.modified.push(key.to_string()),
            Ok(FileAction::Skipped) => report.skipped.push(key.to_string()),
            Err(e) => report.record_failure(fs_error::reconcile_failed(key, e)),
        }
    }

    /// Remove files the bundle does not ship that sit where `key` needs a
    /// directory, such as a stale `lib/pkg` file before `lib/pkg/mod.mpy`
    fn clear_blockers(
        &self,
        target_dir: &Path,
        key: &str,
        manifest: &BundleManifest,
        report: &mut ReconcileReport,
    ) {
        let mut prefix = String::new();
        let mut segments = key.split('/').peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                break;
            }
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(segment);

            let path = target_dir.join(&prefix);
            let is_file = fs::symlink_metadata(&path).is_ok_and(|m| !m.is_dir());
            if !is_file
                || prefix == LIBRARY_DIR
                || manifest.library.contains(&prefix)
                || self.protected.covers(&prefix)
            {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => {
                    debug!("Removed {prefix} to make room for {key}");
                    report.removed.push(prefix.clone());
                }
                Err(e) => report.record_failure(fs_error::reconcile_failed(&prefix, e)),
            }
        }
    }

    /// Remove `lib/.../name.py` once `lib/.../name.mpy` has been installed
    fn elide_source_companion(
        &self,
        target_dir: &Path,
        key: &str,
        manifest: &BundleManifest,
        report: &mut ReconcileReport,
    ) {
        let Some(stem) = key.strip_suffix(".mpy") else {
            return;
        };
        let source_key = format!("{stem}.py");
        if manifest.library.contains(&source_key) || self.protected.covers(&source_key) {
            return;
        }
        let source_path = target_dir.join(&source_key);
        if !source_path.is_file() || !target_dir.join(key).is_file() {
            return;
        }
        match fs::remove_file(&source_path) {
            Ok(()) => {
                debug!("Replaced {source_key} with compiled {key}");
                report.removed.push(source_key);
            }
            Err(e) => report.record_failure(fs_error::reconcile_failed(&source_key, e)),
        }
    }

    /// Delete files under `lib/` on the drive that the bundle does not ship
    fn remove_stale(
        &self,
        target_dir: &Path,
        target_lib: &Path,
        manifest: &BundleManifest,
        report: &mut ReconcileReport,
    ) {
        let walker = WalkDir::new(target_lib)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0 || e.file_type().is_file() || !is_hidden_name(&e.file_name().to_string_lossy())
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    report.record_failure(fs_error::reconcile_failed(LIBRARY_DIR, e));
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if is_staging_leftover(&name) {
                debug!("Removing interrupted copy {}", entry.path().display());
                if let Err(e) = fs::remove_file(entry.path()) {
                    warn!("Could not remove {}: {e}", entry.path().display());
                }
                continue;
            }

            let Some(key) = relative_key(target_dir, entry.path()) else {
                continue;
            };
            if manifest.library.contains(&key) || self.protected.covers(&key) {
                continue;
            }
            match fs::remove_file(entry.path()) {
                Ok(()) => {
                    debug!("Removed {key}");
                    report.removed.push(key);
                }
                Err(e) => report.record_failure(fs_error::reconcile_failed(&key, e)),
            }
        }
    }
}

/// Copy `source` to `dest` unless `dest` already has the same content
///
/// Both files are read in full; sizes and timestamps are not trusted on
/// FAT-formatted device storage.
fn sync_file(source: &Path, dest: &Path) -> io::Result<FileAction> {
    if !dest.is_file() {
        copy_atomic(source, dest)?;
        return Ok(FileAction::Added);
    }

    let wanted = hash::digest_file(source)?;
    let current = hash::digest_file(dest)?;
    if wanted == current {
        return Ok(FileAction::Skipped);
    }
    debug!(
        "{} is {}, bundle has {}",
        dest.display(),
        hash::display_digest(&current),
        hash::display_digest(&wanted)
    );
    copy_atomic(source, dest)?;
    Ok(FileAction::Modified)
}

/// Write `source` to a staging file beside `dest`, then rename it over `dest`
pub fn copy_atomic(source: &Path, dest: &Path) -> io::Result<()> {
    let parent = dest
        .parent()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "destination has no parent"))?;
    fs::create_dir_all(parent)?;

    let mut staged = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(STAGING_SUFFIX)
        .tempfile_in(parent)?;
    let mut input = File::open(source)?;
    io::copy(&mut input, staged.as_file_mut())?;
    staged.as_file().sync_all()?;
    staged.persist(dest).map_err(|e| e.error)?;
    Ok(())
}

pub fn is_staging_leftover(file_name: &str) -> bool {
    file_name.starts_with(STAGING_PREFIX) && file_name.ends_with(STAGING_SUFFIX)
}

/// Remove interrupted copies directly in the drive root, such as a marker
/// write that never completed
fn remove_root_leftovers(target_dir: &Path) {
    let Ok(entries) = fs::read_dir(target_dir) else {
        return;
    };
    for entry in entries.filter_map(std::result::Result::ok) {
        let is_file = entry.file_type().is_ok_and(|t| t.is_file());
        if !is_file || !is_staging_leftover(&entry.file_name().to_string_lossy()) {
            continue;
        }
        debug!("Removing interrupted copy {}", entry.path().display());
        if let Err(e) = fs::remove_file(entry.path()) {
            warn!("Could not remove {}: {e}", entry.path().display());
        }
    }
}

/// Host metadata files that do not keep a directory alive
fn is_metadata_artifact(file_name: &str) -> bool {
    file_name == ".DS_Store" || file_name.starts_with("._")
}

/// Remove directories under `lib` that hold nothing but metadata artifacts
fn prune_empty_dirs(lib: &Path, report: &mut ReconcileReport) {
    let dirs: Vec<_> = WalkDir::new(lib)
        .follow_links(false)
        .min_depth(1)
        .contents_first(true)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_dir())
        .map(|e| e.into_path())
        .collect();

    for dir in dirs {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        let names: Vec<_> = entries
            .filter_map(std::result::Result::ok)
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        if !names.iter().all(|name| is_metadata_artifact(name)) {
            continue;
        }

        let removal = names
            .iter()
            .try_for_each(|name| fs::remove_file(dir.join(name)))
            .and_then(|()| fs::remove_dir(&dir));
        match removal {
            Ok(()) => debug!("Removed empty directory {}", dir.display()),
            Err(e) => {
                let key = dir.display().to_string();
                report.record_failure(fs_error::reconcile_failed(&key, e));
            }
        }
    }
}
