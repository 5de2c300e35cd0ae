//! Watch command - relay filesystem changes to the daemon

use super::{connect, load_settings};
use crate::cli::app::WatchArgs;
use anyhow::{Context, Result, bail};
use std::path::Path;
use std::sync::Arc;
use syncwatch_core::{
    EventSource, LogNotifier, Notifier, NotifySource, Supervisor, WatchError, WatchRoot,
};
use tracing::{info, warn};

pub async fn execute(args: WatchArgs, config: Option<&Path>) -> Result<()> {
    let mut settings = load_settings(config, &args.daemon)?;
    if !args.repos.is_empty() {
        settings.watch.repos = args.repos;
    }
    if let Some(window_ms) = args.debounce_ms {
        settings.debounce.window_ms = window_ms;
    }
    if let Some(dir_vs_files) = args.dir_vs_files {
        settings.debounce.dir_vs_files = dir_vs_files;
    }
    settings.validate()?;

    let client = connect(&settings)?;
    let remote = client
        .configuration()
        .await
        .with_context(|| format!("failed to fetch configuration from {}", client.base_url()))?;

    let roots: Vec<WatchRoot> = remote
        .repositories
        .iter()
        .filter(|repository| settings.watches(&repository.id))
        .map(WatchRoot::from_repository)
        .collect();

    for wanted in &settings.watch.repos {
        if !roots.iter().any(|root| &root.id == wanted) {
            warn!("Repository {} is not configured in the daemon", wanted);
        }
    }
    if roots.is_empty() {
        bail!("no repositories to watch");
    }

    let notifier: Arc<dyn Notifier> = if args.dry_run {
        info!("Dry run: rescans will be logged, not sent");
        Arc::new(LogNotifier)
    } else {
        Arc::new(client)
    };

    let ignore_patterns = settings.watch.ignore_patterns.clone();
    let supervisor = Supervisor::new(
        settings.supervisor.clone(),
        settings.debounce.clone(),
        notifier,
        move |root: &WatchRoot| -> Result<Box<dyn EventSource>, WatchError> {
            let source: Box<dyn EventSource> =
                Box::new(NotifySource::watch(&root.directory, &ignore_patterns)?);
            Ok(source)
        },
    );

    supervisor.run(roots).await?;
    Ok(())
}
