//! Event source backed by the platform's recommended `notify` watcher

use super::EventSource;
use crate::error::WatchError;
use async_trait::async_trait;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::VecDeque;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use tokio::sync::mpsc;
use tracing::trace;

/// Recursive watch of one directory tree
pub struct NotifySource {
    /// Dropping the watcher stops the OS watch
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    root: PathBuf,
    ignore: Gitignore,
    pending: VecDeque<String>,
}

impl NotifySource {
    /// Start watching `root` recursively, skipping paths matched by `ignore_patterns`
    pub fn watch(root: &Path, ignore_patterns: &[String]) -> Result<Self, WatchError> {
        let mut builder = GitignoreBuilder::new(root);
        for pattern in ignore_patterns {
            builder.add_line(None, pattern)?;
        }
        let ignore = builder.build()?;

        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            // Receiver gone means the source was dropped
            let _ = tx.send(res);
        })?;
        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(|source| WatchError::Subscribe { path: root.to_path_buf(), source })?;

        Ok(Self {
            _watcher: watcher,
            rx,
            root: root.to_path_buf(),
            ignore,
            pending: VecDeque::new(),
        })
    }

    fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        path.starts_with(&self.root)
            && self.ignore.matched_path_or_any_parents(path, is_dir).is_ignore()
    }

    fn queue(&mut self, event: Event) {
        if matches!(event.kind, EventKind::Access(_)) {
            return;
        }
        for path in event.paths {
            let is_dir = path.is_dir();
            if self.is_ignored(&path, is_dir) {
                trace!("Ignoring {:?}", path);
                continue;
            }
            self.pending.push_back(render(&path, is_dir));
        }
    }
}

#[async_trait]
impl EventSource for NotifySource {
    async fn next_event(&mut self) -> Option<Result<String, WatchError>> {
        loop {
            if let Some(path) = self.pending.pop_front() {
                return Some(Ok(path));
            }
            match self.rx.recv().await? {
                Ok(event) => self.queue(event),
                Err(err) => return Some(Err(WatchError::Backend(err))),
            }
        }
    }
}

/// Directories get a trailing separator so they score as "changed itself"
fn render(path: &Path, is_dir: bool) -> String {
    let mut rendered = path.to_string_lossy().into_owned();
    if is_dir && !rendered.ends_with(MAIN_SEPARATOR) {
        rendered.push(MAIN_SEPARATOR);
    }
    rendered
}
