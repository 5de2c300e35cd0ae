//! HTTP client for the sync daemon's REST API
//!
//! Two calls are needed: the repository list at startup and one rescan
//! request per reported path. Any non-2xx answer is an error.

pub mod credentials;
pub mod remote;


pub use credentials::Credentials;
pub use remote::{RemoteConfiguration, RepositoryConfiguration};

use crate::error::ApiError;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, info};

/// Client bound to one daemon address and one set of credentials
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    credentials: Credentials,
}

impl ApiClient {
    /// `target` is `host:port` or a full base URL
    pub fn new(
        target: &str,
        credentials: Credentials,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let base_url = if target.contains("://") {
            target.trim_end_matches('/').to_string()
        } else {
            format!("http://{}", target.trim_end_matches('/'))
        };

        Ok(Self { http: builder.build()?, base_url, credentials })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the daemon's configuration
    pub async fn configuration(&self) -> Result<RemoteConfiguration, ApiError> {
        let url = format!("{}/rest/config", self.base_url);
        debug!("Fetching configuration from {}", url);

        let response = self.credentials.apply(self.http.get(&url)).send().await?;
        check_status("GET", &url, &response)?;

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Ask the daemon to rescan `sub` (relative; empty means the whole repository)
    pub async fn scan(&self, repo: &str, sub: &str) -> Result<(), ApiError> {
        let url = format!("{}/rest/scan", self.base_url);
        let request = self.http.post(&url).query(&[("repo", repo), ("sub", sub)]);

        let response = self.credentials.apply(request).send().await?;
        check_status("POST", &url, &response)?;

        info!("Syncthing is indexing change in {}: {}", repo, sub);
        Ok(())
    }
}

fn check_status(method: &'static str, url: &str, response: &Response) -> Result<(), ApiError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(ApiError::Status { method, url: url.to_string(), status: status.as_u16() })
    }
}
