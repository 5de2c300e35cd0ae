//! Repos command - show what the daemon would have us watch

use super::{connect, load_settings};
use crate::cli::app::ReposArgs;
use anyhow::Result;
use std::path::Path;
use syncwatch_core::WatchRoot;

pub async fn execute(args: ReposArgs, config: Option<&Path>) -> Result<()> {
    let settings = load_settings(config, &args.daemon)?;
    settings.validate()?;

    let client = connect(&settings)?;
    let remote = client.configuration().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&remote.repositories)?);
        return Ok(());
    }

    if remote.repositories.is_empty() {
        println!("No repositories configured at {}", client.base_url());
        return Ok(());
    }

    println!("Repositories at {} (config version {}):", client.base_url(), remote.version);
    for repository in &remote.repositories {
        let root = WatchRoot::from_repository(repository);
        let marker = if settings.watches(&repository.id) { "*" } else { " " };
        let mode = if repository.read_only { " (read-only)" } else { "" };
        println!("  {} {}: {}{}", marker, root.id, root.directory.display(), mode);
    }
    Ok(())
}
