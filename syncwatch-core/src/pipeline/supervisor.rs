//! Supervision of all per-root pipelines

use super::Pipeline;
use crate::WatchRoot;
use crate::debounce::DebouncerConfig;
use crate::error::{PipelineError, WatchError};
use crate::notifier::Notifier;
use crate::watch::EventSource;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{Id, JoinSet};
use tokio::time::Instant;
use tracing::{error, info, warn};

/// What to do when one root's pipeline fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop every pipeline and report the error
    #[default]
    AbortAll,
    /// Restart only the failed root, up to `max_restarts` times
    RestartRoot,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    pub policy: FailurePolicy,
    /// Restarts allowed per root under `restart_root`
    pub max_restarts: u32,
    /// Delay before a failed root is started again
    pub restart_delay_ms: u64,
    /// A pipeline that ran this long before failing gets its restart budget back
    pub stable_after_secs: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            policy: FailurePolicy::AbortAll,
            max_restarts: 3,
            restart_delay_ms: 1000,
            stable_after_secs: 600,
        }
    }
}

/// Runs one pipeline per root and applies the failure policy
pub struct Supervisor<F> {
    config: SupervisorConfig,
    debounce: DebouncerConfig,
    notifier: Arc<dyn Notifier>,
    open: F,
}

impl<F> Supervisor<F>
where
    F: Fn(&WatchRoot) -> Result<Box<dyn EventSource>, WatchError>,
{
    /// `open` subscribes an event source for a root; it is called again on restart
    pub fn new(
        config: SupervisorConfig,
        debounce: DebouncerConfig,
        notifier: Arc<dyn Notifier>,
        open: F,
    ) -> Self {
        Self { config, debounce, notifier, open }
    }

    /// Run until every pipeline has stopped or a failure ends supervision
    pub async fn run(&self, roots: Vec<WatchRoot>) -> Result<(), PipelineError> {
        let mut tasks = JoinSet::new();
        let mut running: HashMap<Id, Started> = HashMap::new();
        let mut restarts: HashMap<String, u32> = HashMap::new();

        for root in roots {
            self.start(&mut tasks, &mut running, root, Duration::ZERO)?;
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            let (started, result) = match joined {
                Ok((id, result)) => (running.remove(&id), result),
                Err(err) => {
                    let started = running.remove(&err.id());
                    let repo = started.as_ref().map(|s| s.root.id.clone()).unwrap_or_default();
                    (started, Err(PipelineError::Task { repo, source: err }))
                }
            };

            let error = match result {
                Ok(()) => {
                    if let Some(started) = started {
                        info!("Pipeline for {} finished", started.root.id);
                    }
                    continue;
                }
                Err(error) => error,
            };

            let Some(Started { root, at }) =
                started.filter(|_| self.config.policy == FailurePolicy::RestartRoot)
            else {
                error!("{}", error);
                tasks.abort_all();
                return Err(error);
            };

            let attempts = restarts.entry(root.id.clone()).or_default();
            if at.elapsed() >= Duration::from_secs(self.config.stable_after_secs) {
                *attempts = 0;
            }
            if *attempts >= self.config.max_restarts {
                error!("{} (giving up after {} restarts)", error, attempts);
                tasks.abort_all();
                return Err(error);
            }
            *attempts += 1;

            warn!("{}; restarting {} ({}/{})", error, root.id, attempts, self.config.max_restarts);
            let delay = Duration::from_millis(self.config.restart_delay_ms);
            self.start(&mut tasks, &mut running, root, delay)?;
        }

        Ok(())
    }

    fn start(
        &self,
        tasks: &mut JoinSet<Result<(), PipelineError>>,
        running: &mut HashMap<Id, Started>,
        root: WatchRoot,
        delay: Duration,
    ) -> Result<(), PipelineError> {
        let source = (self.open)(&root)
            .map_err(|source| PipelineError::Watch { repo: root.id.clone(), source })?;
        let pipeline = Pipeline::new(root.clone(), self.debounce.clone(), self.notifier.clone());

        let handle = tasks.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            pipeline.run(source).await
        });
        running.insert(handle.id(), Started { root, at: Instant::now() + delay });
        Ok(())
    }
}

/// A running pipeline's root and when its watch began
struct Started {
    root: WatchRoot,
    at: Instant,
}
