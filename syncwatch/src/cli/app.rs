use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "syncwatch",
    version,
    about = "Syncwatch - report filesystem changes to a sync daemon",
    long_about = "Syncwatch watches the directories of every repository configured in a sync daemon, collapses bursts of file events into a few rescan requests, and sends them once the tree has been quiet for a short window."
)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch every configured repository and report changes (default)
    #[command(about = "Watch repositories and send rescan requests")]
    Watch(WatchArgs),

    /// List the repositories configured in the daemon
    #[command(about = "Fetch and print the daemon's repository list")]
    Repos(ReposArgs),

    /// Show what a flush of the given paths would report
    #[command(about = "Collapse changed paths into the rescan requests they would cause")]
    Collapse(CollapseArgs),
}

/// Connection to the sync daemon
#[derive(Args, Debug, Default, Clone)]
pub struct DaemonArgs {
    /// Daemon address (host:port or base URL) [default: localhost:8080]
    #[arg(long)]
    pub target: Option<String>,

    /// Username for basic auth
    #[arg(long)]
    pub user: Option<String>,

    /// Password for basic auth
    #[arg(long)]
    pub pass: Option<String>,

    /// File containing the CSRF token (last line is used)
    #[arg(long)]
    pub csrf: Option<PathBuf>,

    /// API key
    #[arg(long = "api")]
    pub api_key: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct WatchArgs {
    #[command(flatten)]
    pub daemon: DaemonArgs,

    /// Only watch this repository ID (repeatable)
    #[arg(long = "repo")]
    pub repos: Vec<String>,

    /// Quiet period in milliseconds before changes are reported
    #[arg(long)]
    pub debounce_ms: Option<u64>,

    /// Changes needed before a whole directory is rescanned
    #[arg(long)]
    pub dir_vs_files: Option<u64>,

    /// Log rescans instead of sending them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args, Debug)]
pub struct ReposArgs {
    #[command(flatten)]
    pub daemon: DaemonArgs,

    /// Print the repository list as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct CollapseArgs {
    /// Changed paths; read from stdin (one per line) when none are given
    pub paths: Vec<String>,

    /// Watched root the paths belong to
    #[arg(long, default_value = "")]
    pub root: String,

    /// Changes needed before a whole directory is reported
    #[arg(long)]
    pub dir_vs_files: Option<u64>,

    /// Match parent directories by substring, like older relays
    #[arg(long)]
    pub legacy_substring: bool,

    /// Print the report set as JSON
    #[arg(long)]
    pub json: bool,
}
