//! CLI commands and argument parsing.

pub mod packages;
pub mod publish;
pub mod serve;
pub mod tags;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use disttag_audit::{AuditLogger, TracingBackend};
use disttag_core::TokenCapabilities;
use disttag_registry::{default_data_dir, FileStore, TagRegistry};

/// Disttag - distribution-tag registry
#[derive(Parser)]
#[command(name = "disttag")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub store: StoreArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve(serve::ServeArgs),

    /// Show and edit dist-tags in the local store
    Tags(tags::TagsArgs),

    /// Record a new version in the local store
    Publish(publish::PublishArgs),

    /// List packages in the local store
    Packages(packages::PackagesArgs),

    /// Print version information
    Version,
}

/// Location of the package store.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Data directory (defaults to the platform data dir)
    #[arg(long, global = true, env = "DISTTAG_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

impl StoreArgs {
    /// Resolved data directory.
    pub fn dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(default_data_dir)
    }

    /// Opens a tag registry over the file store, auditing through tracing.
    pub fn registry(&self) -> Result<TagRegistry> {
        let dir = self.dir();
        let store = FileStore::open(&dir)
            .with_context(|| format!("Failed to open store at {}", dir.display()))?;
        let audit = AuditLogger::builder()
            .with_backend(Arc::new(TracingBackend::new()))
            .build();

        Ok(TagRegistry::builder(Arc::new(store))
            .with_audit(Arc::new(audit))
            .build())
    }
}

/// Acting principal for local mutations.
#[derive(Args, Debug, Clone)]
pub struct ActorArgs {
    /// Principal to act as
    #[arg(short, long, env = "DISTTAG_USER")]
    pub user: String,

    /// Act with a read-only token
    #[arg(long)]
    pub readonly: bool,

    /// Act with an automation token
    #[arg(long)]
    pub automation: bool,
}

impl ActorArgs {
    /// Token capabilities for this actor.
    pub const fn capabilities(&self) -> TokenCapabilities {
        TokenCapabilities {
            readonly: self.readonly,
            automation: self.automation,
        }
    }
}

/// Output format for listing commands.
#[derive(Clone, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
