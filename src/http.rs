//! Blocking HTTP client shared by the release API and the bundle download
//!
//! Every request carries a timeout so an unreachable host fails the run
//! instead of hanging it.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{Result, remote as remote_error};

/// Downloads may run this many times longer than API calls
const DOWNLOAD_TIMEOUT_FACTOR: u32 = 10;

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    timeout: Duration,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(format!("wificom-update/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| remote_error::unavailable("(client setup)", e))?;
        Ok(Self { client, timeout })
    }

    /// GET a JSON document, failing on any non-success status
    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.send_json_request(url)?;
        if !response.status().is_success() {
            return Err(remote_error::unavailable(
                url,
                format!("server returned {}", response.status()),
            ));
        }
        response
            .json()
            .map_err(|e| remote_error::unavailable(url, format!("invalid JSON: {e}")))
    }

    /// GET a JSON document that may legitimately not exist (404)
    pub fn get_json_optional<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let response = self.send_json_request(url)?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("{url} not found");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(remote_error::unavailable(
                url,
                format!("server returned {}", response.status()),
            ));
        }
        response
            .json()
            .map(Some)
            .map_err(|e| remote_error::unavailable(url, format!("invalid JSON: {e}")))
    }

    /// HEAD `url`: `true` on success, `false` on a client error (storage
    /// buckets answer 403 for missing keys)
    pub fn exists(&self, url: &str) -> Result<bool> {
        debug!("HEAD {url}");
        let response = self
            .client
            .head(url)
            .send()
            .map_err(|e| remote_error::unavailable(url, e))?;
        let status = response.status();
        if status.is_success() {
            Ok(true)
        } else if status.is_client_error() {
            Ok(false)
        } else {
            Err(remote_error::unavailable(
                url,
                format!("server returned {status}"),
            ))
        }
    }

    /// Start a download, failing on any non-success status
    pub fn download(&self, url: &str) -> Result<Response> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .timeout(self.timeout * DOWNLOAD_TIMEOUT_FACTOR)
            .send()
            .map_err(|e| remote_error::unavailable(url, e))?;
        if !response.status().is_success() {
            return Err(remote_error::unavailable(
                url,
                format!("server returned {}", response.status()),
            ));
        }
        Ok(response)
    }

    fn send_json_request(&self, url: &str) -> Result<Response> {
        debug!("GET {url}");
        self.client
            .get(url)
            .header("Accept", "application/vnd.github.v3+json")
            .send()
            .map_err(|e| remote_error::unavailable(url, e))
    }
}
