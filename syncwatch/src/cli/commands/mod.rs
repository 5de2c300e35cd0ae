//! Command implementations

pub mod collapse;
pub mod repos;
pub mod watch;

use crate::cli::app::DaemonArgs;
use anyhow::{Context, Result};
use std::path::Path;
use syncwatch_core::{ApiClient, Settings};
use tracing::debug;

/// Load settings from `path` (or defaults) with daemon flags layered on top
pub fn load_settings(path: Option<&Path>, daemon: &DaemonArgs) -> Result<Settings> {
    let mut settings = Settings::load(path).with_context(|| match path {
        Some(path) => format!("failed to load settings from {}", path.display()),
        None => "failed to load default settings".to_string(),
    })?;

    if let Some(target) = &daemon.target {
        settings.target = target.clone();
    }
    if let Some(user) = &daemon.user {
        settings.http.user = Some(user.clone());
    }
    if let Some(pass) = &daemon.pass {
        settings.http.password = Some(pass.clone());
    }
    if let Some(csrf) = &daemon.csrf {
        settings.http.csrf_file = Some(csrf.clone());
    }
    if let Some(api_key) = &daemon.api_key {
        settings.http.api_key = Some(api_key.clone());
    }

    debug!("Daemon target: {}", settings.target);
    Ok(settings)
}

/// Client for the daemon named in `settings`
pub fn connect(settings: &Settings) -> Result<ApiClient> {
    let credentials = settings.http.credentials()?;
    let client = ApiClient::new(&settings.target, credentials, settings.http.request_timeout())
        .context("failed to build HTTP client")?;
    Ok(client)
}
