use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
use cli::{Cli, Commands};

fn main() {
    // Parse CLI arguments first to get verbosity level
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    if let Err(err) = run(cli) {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.config.as_deref();

    match cli.command.unwrap_or_else(|| Commands::Watch(Default::default())) {
        Commands::Watch(args) => {
            info!("Watch command: repos {:?}, dry run {}", args.repos, args.dry_run);
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(cli::commands::watch::execute(args, config))?;
        }
        Commands::Repos(args) => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(cli::commands::repos::execute(args, config))?;
        }
        Commands::Collapse(args) => {
            cli::commands::collapse::execute(args, config)?;
        }
    }

    Ok(())
}
