//! Error types for disttag core operations.
//!
//! This module defines the error types used throughout the `disttag-core` crate.

use thiserror::Error;

/// Result type alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in disttag core operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Package name could not be parsed.
    #[error("invalid package name \"{name}\": {reason}")]
    InvalidPackageName {
        /// The rejected name, verbatim.
        name: String,
        /// Reason the name was rejected.
        reason: String,
    },

    /// A version string is not a fully specified SemVer version.
    #[error("version(\"{version}\") format invalid")]
    InvalidVersion {
        /// The rejected version, verbatim.
        version: String,
    },

    /// The version is already part of the package.
    #[error("{package}@{version} already exists")]
    DuplicateVersion {
        /// Fully-qualified package name.
        package: String,
        /// Version that was already recorded.
        version: String,
    },
}
