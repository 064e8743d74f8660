//! Publish command implementation.

use anyhow::Result;
use clap::Args;
use disttag_core::{Principal, TagChange};
use tracing::info;

use super::tags::parse_name;
use super::{ActorArgs, StoreArgs};

/// Arguments for the publish command.
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Package name, e.g. `@cnpm/koa`
    pub package: String,

    /// Version to record
    pub version: String,

    #[command(flatten)]
    pub actor: ActorArgs,
}

/// Runs the publish command.
pub async fn run(store: &StoreArgs, args: &PublishArgs) -> Result<()> {
    let name = parse_name(&args.package)?;
    let registry = store.registry()?;

    info!(package = %name, version = %args.version, "Publishing version");

    let outcome = registry
        .publisher()
        .publish(
            &name,
            &args.version,
            &Principal::new(args.actor.user.as_str()),
            args.actor.capabilities(),
        )
        .await?;

    if outcome.created {
        println!("Created {name}");
    }
    println!("+ {name}@{}", args.version);
    if outcome.latest.is_modified() {
        if let TagChange::Updated { previous } = &outcome.latest {
            println!("latest: {previous} -> {}", args.version);
        } else {
            println!("latest: {}", args.version);
        }
    }
    Ok(())
}
