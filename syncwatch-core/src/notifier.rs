//! Delivery of report sets as rescan requests

use crate::aggregate::ReportSet;
use crate::api::ApiClient;
use crate::error::ApiError;
use async_trait::async_trait;
use tracing::info;

/// Receiver of rescan requests, one call per reported path
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Request a rescan of `sub` in repository `repo`; empty `sub` means the whole root
    async fn rescan(&self, repo: &str, sub: &str) -> Result<(), ApiError>;
}

#[async_trait]
impl Notifier for ApiClient {
    async fn rescan(&self, repo: &str, sub: &str) -> Result<(), ApiError> {
        self.scan(repo, sub).await
    }
}

/// Logs rescans instead of sending them (`--dry-run`)
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn rescan(&self, repo: &str, sub: &str) -> Result<(), ApiError> {
        info!("Would rescan {}: {}", repo, sub);
        Ok(())
    }
}

/// Send one rescan per entry, stopping at the first failure
pub async fn deliver(notifier: &dyn Notifier, repo: &str, report: &ReportSet) -> Result<(), ApiError> {
    for sub in report {
        notifier.rescan(repo, sub).await?;
    }
    Ok(())
}
