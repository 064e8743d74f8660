//! Disttag CLI - run the dist-tag registry and administer it locally.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "disttag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(args) => commands::serve::run(&cli.store, args).await,
        Commands::Tags(args) => commands::tags::run(&cli.store, args).await,
        Commands::Publish(args) => commands::publish::run(&cli.store, &args).await,
        Commands::Packages(args) => commands::packages::run(&cli.store, &args).await,
        Commands::Version => {
            println!("disttag {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
