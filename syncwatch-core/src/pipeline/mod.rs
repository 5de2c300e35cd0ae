//! One watch pipeline per root, and the supervisor that owns them
//!
//! A pipeline wires `EventSource -> WatchLoop -> Debouncer -> Notifier` for a
//! single root. It never retries on its own; it ends with a typed error that
//! the [`Supervisor`] turns into a process-wide abort or a restart of that
//! root alone.

pub mod supervisor;

#[cfg(test)]
mod tests;

pub use supervisor::{FailurePolicy, Supervisor, SupervisorConfig};

use crate::WatchRoot;
use crate::debounce::{Debouncer, DebouncerConfig};
use crate::error::{ApiError, PipelineError};
use crate::notifier::{Notifier, deliver};
use crate::watch::{EventSource, WatchLoop};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Watch, debounce and notify for one root
pub struct Pipeline {
    root: WatchRoot,
    config: DebouncerConfig,
    notifier: Arc<dyn Notifier>,
}

impl Pipeline {
    pub fn new(root: WatchRoot, config: DebouncerConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self { root, config, notifier }
    }

    /// Run until the source or the notifier fails
    ///
    /// Rescan requests go out on their own task so a slow daemon never holds
    /// up accumulation of the next batch. Reports are delivered in flush order.
    pub async fn run(self, source: Box<dyn EventSource>) -> Result<(), PipelineError> {
        let repo = self.root.id.clone();
        let (report_tx, mut report_rx) = mpsc::unbounded_channel();
        let debouncer = Debouncer::from_config(&self.config, &self.root.directory).spawn(report_tx);

        let notifier = self.notifier.clone();
        let delivery_repo = repo.clone();
        let mut delivery = AbortOnDrop(tokio::spawn(async move {
            while let Some(report) = report_rx.recv().await {
                deliver(notifier.as_ref(), &delivery_repo, &report).await?;
            }
            Ok::<(), ApiError>(())
        }));

        let watch = WatchLoop::new(self.root, source);
        let result = tokio::select! {
            watched = watch.run(&debouncer) => {
                watched.map_err(|source| PipelineError::Watch { repo: repo.clone(), source })
            }
            delivered = &mut delivery.0 => match delivered {
                Ok(Ok(())) => Ok(()),
                Ok(Err(source)) => Err(PipelineError::Notify { repo: repo.clone(), source }),
                Err(source) => Err(PipelineError::Task { repo: repo.clone(), source }),
            },
        };

        debug!("Pipeline for {} stopping", repo);
        result
    }
}

/// Aborts the wrapped task when dropped
///
/// The debouncer and delivery tasks must not outlive their pipeline, also
/// when the pipeline future itself is cancelled by the supervisor.
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}
