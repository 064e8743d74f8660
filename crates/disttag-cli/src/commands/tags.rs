//! Tags command implementation.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use disttag_core::{PackageName, Principal, TagChange, TagMap};
use disttag_registry::{TagRegistry, TagRemoval};

use super::{ActorArgs, OutputFormat, StoreArgs};

/// Arguments for the tags command.
#[derive(Args, Debug)]
pub struct TagsArgs {
    #[command(subcommand)]
    pub command: TagsCommand,
}

/// Tag operations.
#[derive(Subcommand, Debug)]
pub enum TagsCommand {
    /// Show the tags of a package
    Ls {
        /// Package name, e.g. `@cnpm/koa`
        package: String,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Point a tag at a published version
    Add {
        /// Package name
        package: String,
        /// Tag name
        tag: String,
        /// Version the tag should point at
        version: String,

        #[command(flatten)]
        actor: ActorArgs,
    },

    /// Remove a tag
    Rm {
        /// Package name
        package: String,
        /// Tag name
        tag: String,

        #[command(flatten)]
        actor: ActorArgs,
    },
}

/// Runs the tags command.
pub async fn run(store: &StoreArgs, args: TagsArgs) -> Result<()> {
    let registry = store.registry()?;

    match args.command {
        TagsCommand::Ls { package, format } => {
            let name = parse_name(&package)?;
            let tags = registry.show(&name).await?;
            print_tags(&tags, &format)
        }
        TagsCommand::Add {
            package,
            tag,
            version,
            actor,
        } => add(&registry, &package, &tag, &version, &actor).await,
        TagsCommand::Rm {
            package,
            tag,
            actor,
        } => rm(&registry, &package, &tag, &actor).await,
    }
}

async fn add(
    registry: &TagRegistry,
    package: &str,
    tag: &str,
    version: &str,
    actor: &ActorArgs,
) -> Result<()> {
    let name = parse_name(package)?;
    let update = registry
        .save(
            &name,
            tag,
            version,
            &Principal::new(actor.user.as_str()),
            actor.capabilities(),
        )
        .await?;

    let tag = tag.trim();
    match update.change {
        TagChange::Created => println!("+{tag}: {name}@{version}"),
        TagChange::Updated { previous } => {
            println!("{tag}: {name}@{previous} -> {name}@{version}");
        }
        TagChange::Unchanged => println!("{tag}: {name}@{version} (unchanged)"),
    }
    Ok(())
}

async fn rm(registry: &TagRegistry, package: &str, tag: &str, actor: &ActorArgs) -> Result<()> {
    let name = parse_name(package)?;
    let removal = registry
        .remove(
            &name,
            tag,
            &Principal::new(actor.user.as_str()),
            actor.capabilities(),
        )
        .await?;

    let tag = tag.trim();
    match removal {
        TagRemoval::Removed { version } => println!("-{tag}: {name}@{version}"),
        TagRemoval::Absent => println!("{tag} is not set on {name}"),
    }
    Ok(())
}

pub(crate) fn parse_name(package: &str) -> Result<PackageName> {
    package
        .parse()
        .with_context(|| format!("Invalid package name: {package}"))
}

fn print_tags(tags: &TagMap, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for (tag, version) in tags.iter() {
                println!("{tag}: {version}");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(tags)?),
    }
    Ok(())
}
