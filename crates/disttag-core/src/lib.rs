//! # Disttag Core
//!
//! Core types for the disttag distribution-tag registry.
//!
//! This crate provides the data structures and pure rules shared by the
//! rest of the workspace:
//!
//! - [`PackageName`] - Fully-qualified (optionally scoped) package names
//! - [`Package`] - A package record: versions, dist-tags and maintainers
//! - [`TagMap`] - Insertion-ordered tag → version mapping
//! - [`Principal`] / [`TokenCapabilities`] - Authenticated caller and token flags
//! - [`authorize`] - The tag mutation authorization policy
//! - [`VersionSyntax`] - SemVer version and range detection
//!
//! ## Example
//!
//! ```rust
//! use disttag_core::{authorize, Package, PackageName, Principal, TokenCapabilities};
//!
//! let name: PackageName = "@cnpm/koa".parse().unwrap();
//! let mut package = Package::new(name, "publisher");
//! package.record_version("1.0.0").unwrap();
//! assert_eq!(package.tags.get("latest"), Some("1.0.0"));
//!
//! let decision = authorize(
//!     &Principal::new("publisher"),
//!     TokenCapabilities::default(),
//!     &package,
//! );
//! assert!(decision.is_allowed());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod decision;
pub mod error;
pub mod identity;
pub mod name;
pub mod package;
pub mod policy;
pub mod syntax;
pub mod tags;
pub mod validation;

#[cfg(test)]
mod proptest_tests;

// Re-export main types at crate root
pub use decision::{Decision, DenyReason};
pub use error::{Error, Result};
pub use identity::{Principal, TokenCapabilities, TokenKind};
pub use name::PackageName;
pub use package::Package;
pub use policy::{authorize, AuthorizationPolicy, MaintainerPolicy};
pub use syntax::{NpmSemver, VersionSyntax};
pub use tags::{TagChange, TagMap, LATEST_TAG};
pub use validation::{Validate, ValidationError, ValidationErrors};
