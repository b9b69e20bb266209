//! Bundle download and unpacking
//!
//! A bundle is a zip archive holding a `lib/` tree, optional root-level files
//! and a `sources.json` manifest. It is downloaded to a scratch file, unpacked
//! into a scratch directory, and the archive is deleted before returning.
//! The unpacked directory lives as long as the returned [`StagedBundle`].

use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::error::{Result, bundle as bundle_error, fs as fs_error};
use crate::http::HttpClient;
use crate::release::manifest::{MANIFEST_FILE, RuntimeManifest};
use crate::temp::{scratch_dir, scratch_file};
use crate::ui::ProgressReporter;

/// Name of the library subtree inside a bundle and on the drive
pub const LIBRARY_DIR: &str = "lib";

const DOWNLOAD_CHUNK: usize = 64 * 1024;

/// Unix file type bits for a symbolic link
const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// An unpacked bundle; the directory is removed on drop
#[derive(Debug)]
pub struct StagedBundle {
    _dir: TempDir,
    root: PathBuf,
}

impl StagedBundle {
    /// Directory containing `lib/` and the root-level files
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The bundle's own `sources.json`, if it ships one
    pub fn runtime_manifest(&self) -> Result<Option<RuntimeManifest>> {
        RuntimeManifest::from_file(&self.root.join(MANIFEST_FILE))
    }
}

/// Produces a staged bundle from a URL
pub trait BundleFetcher {
    fn fetch(&self, url: &str, progress: &mut dyn ProgressReporter) -> Result<StagedBundle>;
}

/// Downloads bundles over HTTP
pub struct HttpBundleFetcher<'a> {
    http: &'a HttpClient,
}

impl<'a> HttpBundleFetcher<'a> {
    pub fn new(http: &'a HttpClient) -> Self {
        Self { http }
    }
}

impl BundleFetcher for HttpBundleFetcher<'_> {
    fn fetch(&self, url: &str, progress: &mut dyn ProgressReporter) -> Result<StagedBundle> {
        info!("Downloading {url}");
        let archive = scratch_file(".zip")?;
        let response = match self.http.download(url) {
            Ok(response) => response,
            Err(e) => {
                progress.abandon();
                return Err(e);
            }
        };
        let length = response.content_length();
        stage_download(response, length, archive, url, progress)
    }
}

/// Copy a download into `archive`, unpack it, then delete the archive
fn stage_download<R: Read>(
    mut body: R,
    length: Option<u64>,
    mut archive: NamedTempFile,
    url: &str,
    progress: &mut dyn ProgressReporter,
) -> Result<StagedBundle> {
    progress.start_download(length);
    if let Err(e) = copy_download(&mut body, archive.as_file_mut(), url, progress) {
        progress.abandon();
        return Err(e);
    }
    progress.finish_download();

    let staged = stage_archive(archive.path());
    if let Err(e) = archive.close() {
        warn!("Could not remove downloaded archive: {e}");
    }
    staged
}

fn copy_download(
    body: &mut dyn Read,
    out: &mut File,
    url: &str,
    progress: &mut dyn ProgressReporter,
) -> Result<()> {
    let mut buffer = vec![0u8; DOWNLOAD_CHUNK];
    let mut total = 0u64;
    loop {
        let read = body
            .read(&mut buffer)
            .map_err(|e| crate::error::remote::unavailable(url, e))?;
        if read == 0 {
            break;
        }
        out.write_all(&buffer[..read])?;
        progress.advance_download(read as u64);
        total += read as u64;
    }
    out.flush()?;
    debug!("Downloaded {total} bytes");
    Ok(())
}

/// Unpack `archive` into a new scratch directory and locate the bundle root
pub fn stage_archive(archive: &Path) -> Result<StagedBundle> {
    let dir = scratch_dir("bundle")?;
    unpack(archive, dir.path())?;
    let root = bundle_root(dir.path())?;
    debug!("Bundle staged at {}", root.display());
    Ok(StagedBundle { _dir: dir, root })
}

/// Extract every regular file and directory of `archive` into `dest`
///
/// Entries whose path would leave `dest` make the whole archive corrupt.
/// Symbolic links are skipped.
pub fn unpack(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive).map_err(|e| fs_error::read_failed(archive, &e))?;
    let mut zip = ZipArchive::new(BufReader::new(file))?;

    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(bundle_error::corrupt(format!(
                "entry '{}' points outside the bundle",
                entry.name()
            )));
        };
        if entry
            .unix_mode()
            .is_some_and(|mode| mode & S_IFMT == S_IFLNK)
        {
            debug!("Skipping symlink {}", entry.name());
            continue;
        }

        let target = dest.join(&relative);
        if entry.is_dir() {
            fs::create_dir_all(&target).map_err(|e| fs_error::write_failed(&target, &e))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| fs_error::write_failed(parent, &e))?;
        }
        let mut out = File::create(&target).map_err(|e| fs_error::write_failed(&target, &e))?;
        io::copy(&mut entry, &mut out).map_err(|e| {
            bundle_error::corrupt(format!("failed to extract '{}': {e}", entry.name()))
        })?;
    }
    Ok(())
}

/// The directory holding `lib/`: `dir` itself, or its only subdirectory when
/// the archive wraps everything in one top-level folder
pub fn bundle_root(dir: &Path) -> Result<PathBuf> {
    if dir.join(LIBRARY_DIR).is_dir() {
        return Ok(dir.to_path_buf());
    }

    let entries: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| fs_error::read_failed(dir, &e))?
        .filter_map(|entry| entry.ok())
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .map(|entry| entry.path())
        .collect();

    match entries.as_slice() {
        [only] if only.join(LIBRARY_DIR).is_dir() => Ok(only.clone()),
        _ => Err(bundle_error::corrupt(format!(
            "no {LIBRARY_DIR}/ directory in bundle"
        ))),
    }
}
