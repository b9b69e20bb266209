//! File listing of an unpacked bundle
//!
//! Paths are stored relative to the bundle root with `/` separators, so the
//! same key addresses a file in the bundle and on the drive. Hidden entries
//! and symbolic links are never listed.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Component, Path};

use walkdir::WalkDir;

use crate::bundle::LIBRARY_DIR;
use crate::error::{Result, bundle as bundle_error, fs as fs_error};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleManifest {
    /// Files under `lib/`, each key starting with `lib/`
    pub library: BTreeSet<String>,
    /// Regular files directly in the bundle root
    pub root: BTreeSet<String>,
}

impl BundleManifest {
    pub fn scan(bundle_dir: &Path) -> Result<Self> {
        let mut manifest = BundleManifest::default();

        let lib_dir = bundle_dir.join(LIBRARY_DIR);
        if lib_dir.is_dir() {
            for entry in WalkDir::new(&lib_dir)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !is_hidden_name(&e.file_name().to_string_lossy()))
            {
                let entry = entry.map_err(|e| bundle_error::corrupt(e.to_string()))?;
                if !entry.file_type().is_file() {
                    continue;
                }
                if let Some(key) = relative_key(bundle_dir, entry.path()) {
                    manifest.library.insert(key);
                }
            }
        }

        for entry in fs::read_dir(bundle_dir).map_err(|e| fs_error::read_failed(bundle_dir, &e))? {
            let entry = entry.map_err(|e| fs_error::read_failed(bundle_dir, &e))?;
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(key) = relative_key(bundle_dir, &entry.path()) {
                manifest.root.insert(key);
            }
        }

        Ok(manifest)
    }

    pub fn file_count(&self) -> usize {
        self.library.len() + self.root.len()
    }
}

/// Leading-dot names, including macOS `._*` and `.DS_Store` artifacts
pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}

/// `/`-joined path of `path` below `base`, or `None` if it is outside `base`,
/// not valid UTF-8, or has a hidden component
pub fn relative_key(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                let part = part.to_str()?;
                if is_hidden_name(part) {
                    return None;
                }
                parts.push(part);
            }
            Component::CurDir => {}
            _ => return None,
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, relative).unwrap();
    }

    #[test]
    fn test_scan_partitions_library_and_root() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "lib/foo.mpy");
        write(temp.path(), "lib/wificom/hardware/io.mpy");
        write(temp.path(), "code.py");
        write(temp.path(), "config.py");
        write(temp.path(), "docs/readme.txt");

        let manifest = BundleManifest::scan(temp.path()).unwrap();
        assert_eq!(
            manifest.library.iter().cloned().collect::<Vec<_>>(),
            vec!["lib/foo.mpy", "lib/wificom/hardware/io.mpy"]
        );
        assert_eq!(
            manifest.root.iter().cloned().collect::<Vec<_>>(),
            vec!["code.py", "config.py"]
        );
        assert_eq!(manifest.file_count(), 4);
    }

    #[test]
    fn test_scan_excludes_hidden_entries() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "lib/foo.mpy");
        write(temp.path(), "lib/._foo.mpy");
        write(temp.path(), "lib/.cache/bar.mpy");
        write(temp.path(), ".DS_Store");
        write(temp.path(), "boot.py");

        let manifest = BundleManifest::scan(temp.path()).unwrap();
        assert_eq!(manifest.library.len(), 1);
        assert!(manifest.library.contains("lib/foo.mpy"));
        assert_eq!(manifest.root.len(), 1);
        assert!(manifest.root.contains("boot.py"));
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_excludes_symlinks() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "lib/real.mpy");
        std::os::unix::fs::symlink(temp.path().join("lib/real.mpy"), temp.path().join("lib/link.mpy"))
            .unwrap();
        std::os::unix::fs::symlink(temp.path().join("lib/real.mpy"), temp.path().join("root_link.py"))
            .unwrap();

        let manifest = BundleManifest::scan(temp.path()).unwrap();
        assert_eq!(manifest.library.len(), 1);
        assert!(manifest.root.is_empty());
    }

    #[test]
    fn test_scan_without_lib() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "boot.py");
        let manifest = BundleManifest::scan(temp.path()).unwrap();
        assert!(manifest.library.is_empty());
        assert_eq!(manifest.file_count(), 1);
    }

    #[test]
    fn test_relative_key() {
        let base = Path::new("/bundle");
        assert_eq!(
            relative_key(base, Path::new("/bundle/lib/a/b.mpy")).as_deref(),
            Some("lib/a/b.mpy")
        );
        assert_eq!(relative_key(base, Path::new("/elsewhere/b.mpy")), None);
        assert_eq!(relative_key(base, Path::new("/bundle/lib/.hidden/b.mpy")), None);
        assert_eq!(relative_key(base, Path::new("/bundle")), None);
    }
}
