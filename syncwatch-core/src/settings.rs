//! Relay settings loaded from a TOML file
//!
//! Every field has a default, so an empty file (or no file at all) gives the
//! stock behaviour: 300 ms window, threshold 10, abort on the first failure.

use crate::api::Credentials;
use crate::debounce::DebouncerConfig;
use crate::error::ConfigError;
use crate::pipeline::SupervisorConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_TARGET: &str = "localhost:8080";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Address of the sync daemon, `host:port` or a base URL
    pub target: String,
    pub debounce: DebouncerConfig,
    pub supervisor: SupervisorConfig,
    pub watch: WatchConfig,
    pub http: HttpConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            debounce: DebouncerConfig::default(),
            supervisor: SupervisorConfig::default(),
            watch: WatchConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Only watch these repository IDs (all when empty)
    pub repos: Vec<String>,
    /// Gitignore-style patterns dropped before debouncing
    pub ignore_patterns: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
    /// File whose last line is the CSRF token
    pub csrf_file: Option<PathBuf>,
    /// Per-request timeout; requests are unbounded when unset
    pub request_timeout_secs: Option<u64>,
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Collect credentials, reading the CSRF token file if configured
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let csrf_token = match &self.csrf_file {
            Some(path) => Some(Credentials::read_csrf_token(path)?),
            None => None,
        };
        Ok(Credentials {
            user: self.user.clone(),
            password: self.password.clone(),
            api_key: self.api_key.clone(),
            csrf_token,
        })
    }
}

impl Settings {
    /// Load settings from file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&content)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Load from `path` when given, defaults otherwise
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target.trim().is_empty() {
            return Err(ConfigError::Invalid("target must not be empty".to_string()));
        }
        if self.debounce.window_ms == 0 {
            return Err(ConfigError::Invalid("debounce.window_ms must be positive".to_string()));
        }
        if self.debounce.dir_vs_files == 0 {
            return Err(ConfigError::Invalid("debounce.dir_vs_files must be positive".to_string()));
        }
        if self.http.request_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid(
                "http.request_timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether repository `id` passes the `watch.repos` filter
    pub fn watches(&self, id: &str) -> bool {
        self.watch.repos.is_empty() || self.watch.repos.iter().any(|repo| repo == id)
    }
}
