//! Serve command implementation.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use disttag_server::{HttpServer, ServerConfig};
use tracing::info;

use super::StoreArgs;

/// Arguments for the serve command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to a YAML configuration file
    #[arg(short, long, env = "DISTTAG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on (overrides the configuration file)
    #[arg(short, long, env = "DISTTAG_LISTEN")]
    pub listen: Option<SocketAddr>,
}

/// Runs the serve command.
pub async fn run(store: &StoreArgs, args: ServeArgs) -> Result<()> {
    let config = load_config(store, &args)?;

    info!(
        listen = %config.listen,
        data_dir = %config.data_dir.display(),
        "Loaded server configuration"
    );

    HttpServer::from_config(config)
        .context("Failed to initialise server")?
        .run_until_shutdown()
        .await
        .context("Server failed")
}

fn load_config(store: &StoreArgs, args: &ServeArgs) -> Result<ServerConfig> {
    let mut config = match &args.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ServerConfig::default(),
    };

    if let Some(listen) = args.listen {
        config = config.with_listen(listen);
    }
    if let Some(dir) = &store.data_dir {
        config = config.with_data_dir(dir);
    }
    Ok(config)
}
