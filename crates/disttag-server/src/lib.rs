//! # Disttag Server
//!
//! HTTP API for the disttag registry, built on axum.
//!
//! The server authenticates callers against a static token table, hands
//! requests to the [`TagRegistry`](disttag_registry::TagRegistry) and maps
//! failures to status codes. Error bodies look like
//! `{ "error": "[NOT_FOUND] not-exists not found" }`.
//!
//! ## Example
//!
//! ```no_run
//! use disttag_server::{HttpServer, ServerConfig, StorageKind, TokenEntry};
//!
//! # async fn example() -> Result<(), disttag_server::ServerError> {
//! let config = ServerConfig::default()
//!     .with_storage(StorageKind::Memory)
//!     .with_token(TokenEntry::new("s3cr3t", "publisher"));
//!
//! HttpServer::from_config(config)?.run_until_shutdown().await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod auth;
mod config;
mod error;
mod routes;
mod server;

pub use auth::{bearer_token, Authenticated, Identity, TokenTable};
pub use config::{AuditConfig, ServerConfig, StorageKind, TokenEntry, DEFAULT_PORT};
pub use error::{ApiError, ServerError};
pub use routes::{router, AppState};
pub use server::{HttpServer, ServerHandle};
