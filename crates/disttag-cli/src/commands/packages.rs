//! Packages command implementation.

use anyhow::Result;
use clap::Args;
use disttag_registry::PackageStore;

use super::{OutputFormat, StoreArgs};

/// Arguments for the packages command.
#[derive(Args, Debug)]
pub struct PackagesArgs {
    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Runs the packages command.
pub async fn run(store: &StoreArgs, args: &PackagesArgs) -> Result<()> {
    let registry = store.registry()?;
    let names: Vec<String> = registry
        .store()
        .list()
        .await?
        .iter()
        .map(ToString::to_string)
        .collect();

    match args.format {
        OutputFormat::Text => {
            if names.is_empty() {
                println!("No packages in {}", store.dir().display());
            }
            for name in &names {
                println!("{name}");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&names)?),
    }
    Ok(())
}
