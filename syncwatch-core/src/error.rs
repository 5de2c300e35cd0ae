//! Error types for the relay
//!
//! Every error is terminal for the pipeline that raised it; the supervisor
//! decides whether that ends the process or only restarts one root.

use std::path::PathBuf;
use thiserror::Error;

/// Settings and startup configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid setting: {0}")]
    Invalid(String),
}

/// Errors talking to the remote sync daemon
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Status {status} for {method} {url}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
    },

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The debounce actor is no longer accepting paths
#[derive(Debug, Error)]
#[error("Debouncer has stopped")]
pub struct DebounceError;

/// Event source failures
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("Failed to watch {path}: {source}")]
    Subscribe {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("Event source error: {0}")]
    Backend(#[from] notify::Error),

    #[error("Invalid ignore pattern: {0}")]
    IgnorePattern(#[from] ignore::Error),

    #[error("Event source failed: {0}")]
    Source(String),

    #[error("Event channel closed")]
    Closed,

    #[error(transparent)]
    Debounce(#[from] DebounceError),
}

/// Failure of one root's pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Watching {repo} failed: {source}")]
    Watch {
        repo: String,
        #[source]
        source: WatchError,
    },

    #[error("Rescan request for {repo} failed: {source}")]
    Notify {
        repo: String,
        #[source]
        source: ApiError,
    },

    #[error("Pipeline task for {repo} died: {source}")]
    Task {
        repo: String,
        #[source]
        source: tokio::task::JoinError,
    },
}

impl PipelineError {
    /// Identifier of the root whose pipeline failed
    pub fn repo(&self) -> &str {
        match self {
            Self::Watch { repo, .. } | Self::Notify { repo, .. } | Self::Task { repo, .. } => repo,
        }
    }
}
