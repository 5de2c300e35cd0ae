//! Debounce actor that turns a stream of changed paths into flushes
//!
//! One actor runs per watched root. It owns the pending batch and a single
//! resettable deadline; every path pushes the deadline out by the full window
//! and the batch is collapsed once the window passes without new paths.

use crate::aggregate::{AncestorMatch, Aggregator, DEFAULT_DIR_VS_FILES, ReportSet};
use crate::error::DebounceError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, trace, warn};

/// Configuration for the debouncer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebouncerConfig {
    /// Quiet period in milliseconds before a batch is flushed
    pub window_ms: u64,
    /// Weight above which a directory is reported instead of its entries
    pub dir_vs_files: u64,
    /// How parent directories are matched while scoring
    pub ancestor_match: AncestorMatch,
}

impl Default for DebouncerConfig {
    fn default() -> Self {
        Self {
            window_ms: 300,
            dir_vs_files: DEFAULT_DIR_VS_FILES,
            ancestor_match: AncestorMatch::Segment,
        }
    }
}

impl DebouncerConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

enum State {
    Idle,
    Accumulating { batch: Vec<String>, deadline: Instant },
}

/// Per-root debounce state machine
pub struct Debouncer {
    window: Duration,
    aggregator: Aggregator,
    state: State,
}

impl Debouncer {
    pub fn new(window: Duration, aggregator: Aggregator) -> Self {
        Self { window, aggregator, state: State::Idle }
    }

    /// Build a debouncer for `root` from configuration
    pub fn from_config(config: &DebouncerConfig, root: impl AsRef<std::path::Path>) -> Self {
        let aggregator = Aggregator::new(root)
            .with_threshold(config.dir_vs_files)
            .with_ancestor_match(config.ancestor_match);
        Self::new(config.window(), aggregator)
    }

    /// Start the actor; every flush is sent to `reports`
    pub fn spawn(self, reports: mpsc::UnboundedSender<ReportSet>) -> DebouncerHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(self.run(rx, reports));
        DebouncerHandle { tx: Some(tx), task }
    }

    async fn run(
        mut self,
        mut input: mpsc::UnboundedReceiver<String>,
        reports: mpsc::UnboundedSender<ReportSet>,
    ) {
        loop {
            let armed = match self.state {
                State::Idle => None,
                State::Accumulating { deadline, .. } => Some(deadline),
            };

            let Some(deadline) = armed else {
                match input.recv().await {
                    Some(path) => self.ingest(path),
                    None => break,
                }
                continue;
            };

            tokio::select! {
                biased;
                received = input.recv() => match received {
                    Some(path) => {
                        // Input and expiry can be ready in the same poll; the
                        // deadline still closes the batch it was armed for
                        if Instant::now() >= deadline && !self.flush(&reports) {
                            debug!("Report receiver dropped, stopping debouncer");
                            break;
                        }
                        self.ingest(path);
                    }
                    None => {
                        // No more input: let the armed timer run out once
                        sleep_until(deadline).await;
                        self.flush(&reports);
                        break;
                    }
                },
                _ = sleep_until(deadline) => {
                    if !self.flush(&reports) {
                        debug!("Report receiver dropped, stopping debouncer");
                        break;
                    }
                }
            }
        }
    }

    fn ingest(&mut self, path: String) {
        let deadline = Instant::now() + self.window;
        trace!("Pending change {}", path);
        if let State::Accumulating { batch, deadline: armed } = &mut self.state {
            batch.push(path);
            *armed = deadline;
        } else {
            self.state = State::Accumulating { batch: vec![path], deadline };
        }
    }

    /// Collapse the pending batch and hand it on; false once nobody listens
    fn flush(&mut self, reports: &mpsc::UnboundedSender<ReportSet>) -> bool {
        let State::Accumulating { batch, .. } = std::mem::replace(&mut self.state, State::Idle)
        else {
            return true;
        };
        let report = self.aggregator.collapse(&batch);
        info!(
            "Flushing {} change(s) under {} as {} rescan(s)",
            batch.len(),
            self.aggregator.root().display(),
            report.len()
        );
        reports.send(report).is_ok()
    }
}

/// Input side of a running debouncer
///
/// Dropping the handle aborts the actor along with any pending batch.
#[derive(Debug)]
pub struct DebouncerHandle {
    tx: Option<mpsc::UnboundedSender<String>>,
    task: JoinHandle<()>,
}

impl DebouncerHandle {
    /// Queue a changed path; re-arms the quiet-period timer
    pub fn ingest(&self, path: impl Into<String>) -> Result<(), DebounceError> {
        let tx = self.tx.as_ref().ok_or(DebounceError)?;
        tx.send(path.into()).map_err(|_| DebounceError)
    }

    /// Stop accepting paths and wait for the last flush
    pub async fn close(mut self) {
        self.tx.take();
        match (&mut self.task).await {
            Ok(()) => {}
            Err(err) if err.is_cancelled() => debug!("Debouncer was aborted before closing"),
            Err(err) => warn!("Debouncer task failed: {}", err),
        }
    }

    /// Stop the actor immediately, dropping any pending batch
    pub fn abort(&self) {
        self.task.abort();
    }
}

impl Drop for DebouncerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
