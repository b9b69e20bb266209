//! Release resolution
//!
//! Turns the user's choice of version into a download URL for the board's
//! bundle variant, plus the CircuitPython version that bundle was built for.
//!
//! Four ways to pick a version are supported:
//! - the latest stable release
//! - a specific release from the supported list
//! - the latest commit on the default branch
//! - a specific commit, branch or tag
//!
//! Releases ship their bundles as release assets. Commits are served from
//! prebuilt archives named `<prefix>_<sha>_<variant>.zip`, which may not
//! exist for every commit.

pub mod api;
pub mod manifest;
pub mod version;

use tracing::{debug, info};

use crate::config::UpdaterConfig;
use crate::device::status::board_variant;
use crate::error::{Result, UpdaterError, remote as remote_error};
use crate::ui::selector::{SelectionRequest, SelectionResponse, Selector};

use api::{Release, ReleaseApi};
use manifest::RuntimeManifest;

/// Which version to install
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    LatestRelease,
    Release(String),
    LatestCommit,
    Commit(String),
}

/// Menu entries for [`ReleaseSource::choose`], in [`Selection`] order
const MODE_OPTIONS: [&str; 4] = [
    "Install/Update to the latest release",
    "Install/Update to a specific release",
    "Install/Update from the latest commit hash",
    "Install/Update from a specific commit hash",
];

/// A version ready to download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedBundle {
    /// Tag or commit SHA, recorded on the drive after installing
    pub version_ref: String,
    pub bundle_url: String,
    /// `None` when the version does not publish a recommendation
    pub recommended_runtime: Option<String>,
    pub release_notes: Option<String>,
}

pub struct ReleaseSource<'a> {
    api: &'a dyn ReleaseApi,
    config: &'a UpdaterConfig,
}

impl<'a> ReleaseSource<'a> {
    pub fn new(api: &'a dyn ReleaseApi, config: &'a UpdaterConfig) -> Self {
        Self { api, config }
    }

    /// Releases with a numeric tag at or above the configured minimum, in
    /// API order (newest first)
    pub fn supported_releases(&self) -> Result<Vec<Release>> {
        let releases: Vec<Release> = self
            .api
            .releases()?
            .into_iter()
            .filter(|release| {
                version::is_release_tag(&release.tag_name)
                    && version::is_at_least(&release.tag_name, &self.config.minimum_version)
            })
            .collect();
        debug!("{} supported release(s)", releases.len());
        if releases.is_empty() {
            return Err(remote_error::no_releases(&self.config.minimum_version));
        }
        Ok(releases)
    }

    /// Ask the user what to install
    pub fn choose(&self, selector: &mut dyn Selector) -> Result<Selection> {
        let options = MODE_OPTIONS.iter().map(ToString::to_string).collect();
        match selector.select(SelectionRequest::menu("What would you like to do?", options))? {
            SelectionResponse::Choice(0) => Ok(Selection::LatestRelease),
            SelectionResponse::Choice(1) => self.choose_release(selector),
            SelectionResponse::Choice(2) => Ok(Selection::LatestCommit),
            SelectionResponse::Choice(3) => {
                match selector.select(SelectionRequest::text("Enter the commit hash:"))? {
                    SelectionResponse::Text(reference) => Ok(Selection::Commit(reference)),
                    _ => Err(UpdaterError::Aborted),
                }
            }
            _ => Err(UpdaterError::Aborted),
        }
    }

    fn choose_release(&self, selector: &mut dyn Selector) -> Result<Selection> {
        let releases = self.supported_releases()?;
        let options = releases
            .iter()
            .map(|release| {
                let mut label = format!("{} ({})", release.title(), release.tag_name);
                if release.prerelease {
                    label.push_str(" [pre-release]");
                }
                label
            })
            .collect();

        match selector.select(SelectionRequest::menu("Available releases:", options))? {
            SelectionResponse::Choice(index) => releases
                .get(index)
                .map(|release| Selection::Release(release.tag_name.clone()))
                .ok_or(UpdaterError::Aborted),
            _ => Err(UpdaterError::Aborted),
        }
    }

    /// Resolve `selection` to a bundle URL for `board_id`
    pub fn resolve(&self, selection: &Selection, board_id: &str) -> Result<ResolvedBundle> {
        let variant = board_variant(board_id);
        let (version_ref, bundle_url, release_notes) = match selection {
            Selection::LatestRelease => {
                let releases = self.supported_releases()?;
                let release = releases
                    .iter()
                    .find(|release| !release.prerelease)
                    .ok_or_else(|| remote_error::no_releases(&self.config.minimum_version))?;
                release_bundle(release, variant, board_id)?
            }
            Selection::Release(tag) => {
                let releases = self.supported_releases()?;
                let release = releases
                    .iter()
                    .find(|release| &release.tag_name == tag)
                    .ok_or_else(|| remote_error::bundle_unresolved(tag, board_id))?;
                release_bundle(release, variant, board_id)?
            }
            Selection::LatestCommit => {
                let commit = self.api.latest_commit()?;
                let url = self.commit_bundle(&commit.sha, variant, board_id)?;
                (commit.sha, url, None)
            }
            Selection::Commit(reference) => {
                let commit = self.api.commit(reference.trim())?;
                let url = self.commit_bundle(&commit.sha, variant, board_id)?;
                (commit.sha, url, None)
            }
        };

        let recommended_runtime = match self.api.runtime_manifest(&version_ref)? {
            Some(value) => RuntimeManifest::from_value(value)?
                .and_then(|manifest| manifest.recommended_for(board_id)),
            None => None,
        };

        info!("Resolved {version_ref} to {bundle_url}");
        Ok(ResolvedBundle {
            version_ref,
            bundle_url,
            recommended_runtime,
            release_notes,
        })
    }

    /// URL of the prebuilt archive for a commit
    pub fn commit_archive_url(&self, sha: &str, variant: &str) -> String {
        format!(
            "{}/{}_{}_{}.zip",
            self.config.archive_base.trim_end_matches('/'),
            self.config.archive_prefix,
            sha,
            variant
        )
    }

    fn commit_bundle(&self, sha: &str, variant: &str, board_id: &str) -> Result<String> {
        let url = self.commit_archive_url(sha, variant);
        if self.api.archive_exists(&url)? {
            Ok(url)
        } else {
            Err(remote_error::bundle_unresolved(sha, board_id))
        }
    }
}

fn release_bundle(
    release: &Release,
    variant: &str,
    board_id: &str,
) -> Result<(String, String, Option<String>)> {
    let asset = release
        .find_asset(variant)
        .ok_or_else(|| remote_error::bundle_unresolved(&release.tag_name, board_id))?;
    Ok((
        release.tag_name.clone(),
        asset.browser_download_url.clone(),
        release.body.clone(),
    ))
}
