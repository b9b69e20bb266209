//! Release tag parsing and ordering
//!
//! A tag like `v1.2.0-rc1` becomes `[1, 2, 0]`: one leading `v` is dropped,
//! everything after the first hyphen is ignored and the rest is split on
//! dots.

#![allow(clippy::expect_used)]

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;

static RELEASE_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v?\d+(\.\d+)*(-[a-zA-Z0-9]+)?$").expect("release tag pattern")
});

/// Whether `tag` looks like a numbered release (`v1.2.3`, `1.2`, `v2.0.0-rc1`)
pub fn is_release_tag(tag: &str) -> bool {
    RELEASE_TAG_RE.is_match(tag)
}

/// Numeric components of a version string, or `None` if any is not a number
pub fn version_tuple(version: &str) -> Option<Vec<u64>> {
    let version = version.strip_prefix('v').unwrap_or(version);
    let numeric = version.split('-').next().unwrap_or_default();
    numeric
        .split('.')
        .map(|part| part.parse::<u64>().ok())
        .collect()
}

/// Compare two version strings component by component.
///
/// Only the components both versions have are compared, so `1.2` and
/// `1.2.5` are equal. Returns `None` if either string is not numeric.
pub fn compare_versions(a: &str, b: &str) -> Option<Ordering> {
    let a = version_tuple(a)?;
    let b = version_tuple(b)?;
    let ordering = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| x.cmp(y))
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal);
    Some(ordering)
}

/// Whether `version` is at or above `minimum`
pub fn is_at_least(version: &str, minimum: &str) -> bool {
    matches!(
        compare_versions(version, minimum),
        Some(Ordering::Greater | Ordering::Equal)
    )
}
