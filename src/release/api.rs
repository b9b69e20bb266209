//! Read-only access to the wificom-lib releases, commits and archives

use serde::Deserialize;
use serde_json::Value;

use crate::config::UpdaterConfig;
use crate::error::Result;
use crate::http::HttpClient;

use super::manifest::MANIFEST_FILE;

/// A published release
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub assets: Vec<Asset>,
}

impl Release {
    /// Display name, falling back to the tag
    pub fn title(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.tag_name)
    }

    /// First asset whose file name contains `pattern`
    pub fn find_asset(&self, pattern: &str) -> Option<&Asset> {
        self.assets.iter().find(|asset| asset.name.contains(pattern))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Asset {
    pub name: String,
    pub browser_download_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Commit {
    pub sha: String,
}

/// Queries the release source needs; implemented over HTTP and by test fakes
pub trait ReleaseApi {
    /// All releases, newest first
    fn releases(&self) -> Result<Vec<Release>>;

    /// Head of the default branch
    fn latest_commit(&self) -> Result<Commit>;

    /// Commit for a SHA, short SHA, branch or tag
    fn commit(&self, reference: &str) -> Result<Commit>;

    /// `sources.json` at `reference`, `None` if the file does not exist there
    fn runtime_manifest(&self, reference: &str) -> Result<Option<Value>>;

    /// Whether a prebuilt archive exists at `url`
    fn archive_exists(&self, url: &str) -> Result<bool>;
}

/// [`ReleaseApi`] over the GitHub REST API and raw content host
pub struct GitHubApi<'a> {
    http: &'a HttpClient,
    config: &'a UpdaterConfig,
}

impl<'a> GitHubApi<'a> {
    pub fn new(http: &'a HttpClient, config: &'a UpdaterConfig) -> Self {
        Self { http, config }
    }

    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.repository,
            path
        )
    }
}

impl ReleaseApi for GitHubApi<'_> {
    fn releases(&self) -> Result<Vec<Release>> {
        self.http.get_json(&self.repo_url("releases"))
    }

    fn latest_commit(&self) -> Result<Commit> {
        let url = self.repo_url("commits?per_page=1");
        let commits: Vec<Commit> = self.http.get_json(&url)?;
        commits.into_iter().next().ok_or_else(|| {
            crate::error::remote::unavailable(url, "repository has no commits")
        })
    }

    fn commit(&self, reference: &str) -> Result<Commit> {
        self.http.get_json(&self.repo_url(&format!("commits/{reference}")))
    }

    fn runtime_manifest(&self, reference: &str) -> Result<Option<Value>> {
        let url = format!(
            "{}/{}/{}/{}",
            self.config.raw_base.trim_end_matches('/'),
            self.config.repository,
            reference,
            MANIFEST_FILE
        );
        self.http.get_json_optional(&url)
    }

    fn archive_exists(&self, url: &str) -> Result<bool> {
        self.http.exists(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_deserialize() {
        let json = r#"[{
            "tag_name": "v1.2.0",
            "name": "WiFiCom 1.2.0",
            "prerelease": false,
            "body": "Fixes",
            "assets": [
                {"name": "wificom-lib_v1.2.0_nina.zip", "browser_download_url": "https://example.invalid/nina.zip", "size": 10},
                {"name": "wificom-lib_v1.2.0_picow.zip", "browser_download_url": "https://example.invalid/picow.zip", "size": 10}
            ],
            "id": 42
        }]"#;
        let releases: Vec<Release> = serde_json::from_str(json).unwrap();
        assert_eq!(releases.len(), 1);
        let release = &releases[0];
        assert_eq!(release.title(), "WiFiCom 1.2.0");
        assert_eq!(
            release.find_asset("picow").map(|a| a.browser_download_url.as_str()),
            Some("https://example.invalid/picow.zip")
        );
    }

    #[test]
    fn test_release_title_falls_back_to_tag() {
        let release: Release =
            serde_json::from_str(r#"{"tag_name": "v1.0.0", "name": ""}"#).unwrap();
        assert_eq!(release.title(), "v1.0.0");
        assert!(!release.prerelease);
        assert!(release.assets.is_empty());
    }

    #[test]
    fn test_repo_url() {
        let config = UpdaterConfig {
            api_base: "https://api.example.invalid/".to_string(),
            ..UpdaterConfig::default()
        };
        let http = HttpClient::new(config.timeout()).unwrap();
        let api = GitHubApi::new(&http, &config);
        assert_eq!(
            api.repo_url("releases"),
            "https://api.example.invalid/repos/mechawrench/wificom-lib/releases"
        );
    }
}
