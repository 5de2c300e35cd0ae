//! Event sources and the per-root loop feeding them into a debouncer

pub mod notify_source;

pub use notify_source::NotifySource;

use crate::debounce::DebouncerHandle;
use crate::error::WatchError;
use crate::WatchRoot;
use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Stream of changed paths for one watched root
///
/// Paths ending in a separator denote a directory that changed itself.
#[async_trait]
pub trait EventSource: Send {
    /// The next changed path or failure; `None` once the source has shut down
    async fn next_event(&mut self) -> Option<Result<String, WatchError>>;
}

/// Event source fed through a channel, for embedding and tests
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::UnboundedReceiver<Result<String, WatchError>>,
}

impl ChannelSource {
    pub fn new() -> (Self, mpsc::UnboundedSender<Result<String, WatchError>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, tx)
    }
}

#[async_trait]
impl EventSource for ChannelSource {
    async fn next_event(&mut self) -> Option<Result<String, WatchError>> {
        self.rx.recv().await
    }
}

/// Pulls events for one root and forwards them to its debouncer
pub struct WatchLoop {
    root: WatchRoot,
    source: Box<dyn EventSource>,
}

impl WatchLoop {
    pub fn new(root: WatchRoot, source: Box<dyn EventSource>) -> Self {
        Self { root, source }
    }

    /// Run until the source fails or closes; never returns `Ok`
    pub async fn run(mut self, debouncer: &DebouncerHandle) -> Result<(), WatchError> {
        info!("Watching {}: {}", self.root.id, self.root.directory.display());
        loop {
            match self.source.next_event().await {
                Some(Ok(path)) => {
                    debug!("Event: {}", path);
                    debouncer.ingest(path)?;
                }
                Some(Err(err)) => return Err(err),
                None => return Err(WatchError::Closed),
            }
        }
    }
}
