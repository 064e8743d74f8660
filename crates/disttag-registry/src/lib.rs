//! # Disttag Registry
//!
//! The dist-tag service of the disttag registry and the stores it persists
//! packages through.
//!
//! ## Features
//!
//! - **Tag service**: [`TagRegistry`] shows, saves and removes dist-tags,
//!   running validation and authorization before any write
//! - **Compare-and-swap persistence**: every commit names the [`Revision`] it
//!   read; concurrent writers are refused rather than overwritten
//! - **Stores**: [`InMemoryStore`] and the JSON-per-package [`FileStore`]
//! - **Publishing**: [`Publisher`] records versions and keeps `latest` on the
//!   highest one
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use disttag_core::{PackageName, Principal, TokenCapabilities};
//! use disttag_registry::{InMemoryStore, RegistryError, TagRegistry};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), RegistryError> {
//!     let registry = TagRegistry::new(Arc::new(InMemoryStore::new()));
//!     let name: PackageName = "koa".parse()?;
//!     let user = Principal::new("publisher");
//!     let caps = TokenCapabilities::default();
//!
//!     registry.publisher().publish(&name, "1.0.0", &user, caps).await?;
//!     registry.save(&name, "beta", "1.0.0", &user, caps).await?;
//!
//!     let err = registry.remove(&name, "latest", &user, caps).await.unwrap_err();
//!     assert_eq!(err.to_string(), "Can't remove the \"latest\" tag");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  TagRegistry                    │
//! │  ┌──────────────┐ ┌───────────────┐ ┌────────┐  │
//! │  │ Authorization│ │ VersionSyntax │ │ Audit  │  │
//! │  │   Policy     │ │   (SemVer)    │ │ Logger │  │
//! │  └──────────────┘ └───────────────┘ └────────┘  │
//! └─────────────────────────────────────────────────┘
//!                         │ load / compare_and_swap
//!                         ▼
//! ┌─────────────────────────────────────────────────┐
//! │      PackageStore (InMemoryStore, FileStore)    │
//! └─────────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file_store;
mod publish;
mod service;
mod store;

pub use error::{ErrorKind, RegistryError, Result, StoreError};
pub use file_store::{default_data_dir, FileStore};
pub use publish::{PublishOutcome, Publisher};
pub use service::{TagRegistry, TagRegistryBuilder, TagRemoval, TagUpdate};
pub use store::{InMemoryStore, PackageStore, Revision, Versioned};
