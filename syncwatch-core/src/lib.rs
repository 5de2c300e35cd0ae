//! Core of syncwatch
//!
//! Watches directory trees, collapses bursts of file events into a minimal
//! set of rescan requests, and reports them to a sync daemon once the tree
//! has been quiet for a debounce window.

pub mod aggregate;
pub mod api;
pub mod debounce;
pub mod error;
pub mod notifier;
pub mod paths;
pub mod pipeline;
pub mod settings;
pub mod watch;

pub use aggregate::{AncestorMatch, Aggregator, PathScore, ReportSet};
pub use api::{ApiClient, Credentials, RemoteConfiguration, RepositoryConfiguration};
pub use debounce::{Debouncer, DebouncerConfig, DebouncerHandle};
pub use error::{ApiError, ConfigError, DebounceError, PipelineError, WatchError};
pub use notifier::{LogNotifier, Notifier};
pub use pipeline::{FailurePolicy, Pipeline, Supervisor, SupervisorConfig};
pub use settings::Settings;
pub use watch::{ChannelSource, EventSource, NotifySource, WatchLoop};

use std::path::PathBuf;

/// A watched directory and the repository ID it is reported under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRoot {
    pub id: String,
    pub directory: PathBuf,
}

impl WatchRoot {
    pub fn new(id: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self { id: id.into(), directory: directory.into() }
    }

    /// Root for a repository from the daemon's configuration, with `~` expanded
    pub fn from_repository(repository: &RepositoryConfiguration) -> Self {
        Self::new(repository.id.clone(), paths::expand_tilde(&repository.directory))
    }
}
