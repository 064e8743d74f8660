//! Error types for registry operations.

use std::fmt;
use std::path::PathBuf;

use disttag_core::{DenyReason, ValidationErrors};
use thiserror::Error;

use crate::store::Revision;

/// Result type alias using [`RegistryError`].
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Coarse classification of a [`RegistryError`], shared with the HTTP layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The package or version does not exist.
    NotFound,
    /// The caller may not perform the mutation.
    Forbidden,
    /// The request is well-formed but semantically invalid.
    Unprocessable,
    /// The package changed between load and commit.
    Conflict,
    /// Storage failure.
    Internal,
}

impl ErrorKind {
    /// Returns the stable label used in error bodies.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::Unprocessable => "UNPROCESSABLE_ENTITY",
            Self::Conflict => "CONFLICT",
            Self::Internal => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Returns the HTTP status code for this kind.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Forbidden => 403,
            Self::Unprocessable => 422,
            Self::Conflict => 409,
            Self::Internal => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by the tag registry service and publisher.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Package does not exist.
    #[error("{name} not found")]
    PackageNotFound {
        /// Fully-qualified package name.
        name: String,
    },

    /// Version was never published.
    #[error("{name}@{version} not found")]
    VersionNotFound {
        /// Fully-qualified package name.
        name: String,
        /// Requested version, verbatim.
        version: String,
    },

    /// Authorization policy refused the mutation.
    #[error("{0}")]
    Forbidden(DenyReason),

    /// Publishing a version that already exists.
    #[error("Can't modify pre-existing version: {name}@{version}")]
    VersionExists {
        /// Fully-qualified package name.
        name: String,
        /// Version that was already published.
        version: String,
    },

    /// Tag name parses as a SemVer range.
    #[error("Tag name must not be a valid SemVer range: \"{tag}\"")]
    TagIsRange {
        /// Trimmed tag name.
        tag: String,
    },

    /// Version is not a fully specified SemVer version.
    #[error("version(\"{version}\") format invalid")]
    InvalidVersion {
        /// Rejected version, verbatim.
        version: String,
    },

    /// Attempt to delete the `latest` tag.
    #[error("Can't remove the \"latest\" tag")]
    CannotRemoveLatest,

    /// Package name could not be parsed.
    #[error("invalid package name \"{name}\": {reason}")]
    InvalidPackageName {
        /// Rejected name, verbatim.
        name: String,
        /// Reason the name was rejected.
        reason: String,
    },

    /// Package was modified by a concurrent writer.
    #[error("{name} was modified concurrently, please retry")]
    Conflict {
        /// Fully-qualified package name.
        name: String,
    },

    /// Persistence failure.
    #[error(transparent)]
    Store(StoreError),
}

impl RegistryError {
    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::PackageNotFound { .. } | Self::VersionNotFound { .. } => ErrorKind::NotFound,
            Self::Forbidden(_) | Self::VersionExists { .. } => ErrorKind::Forbidden,
            Self::TagIsRange { .. }
            | Self::InvalidVersion { .. }
            | Self::CannotRemoveLatest
            | Self::InvalidPackageName { .. } => ErrorKind::Unprocessable,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Store(_) => ErrorKind::Internal,
        }
    }
}

impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { name, .. } => Self::Conflict { name },
            other => Self::Store(other),
        }
    }
}

impl From<disttag_core::Error> for RegistryError {
    fn from(err: disttag_core::Error) -> Self {
        match err {
            disttag_core::Error::InvalidPackageName { name, reason } => {
                Self::InvalidPackageName { name, reason }
            }
            disttag_core::Error::InvalidVersion { version } => Self::InvalidVersion { version },
            disttag_core::Error::DuplicateVersion { package, version } => Self::VersionExists {
                name: package,
                version,
            },
        }
    }
}

/// Errors raised by [`PackageStore`](crate::PackageStore) implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The stored revision did not match the expected one.
    #[error(
        "revision conflict on {name}: expected {}, found {}",
        describe(.expected),
        describe(.actual)
    )]
    Conflict {
        /// Fully-qualified package name.
        name: String,
        /// Revision the writer loaded (`None` when it expected no record).
        expected: Option<Revision>,
        /// Revision currently stored.
        actual: Option<Revision>,
    },

    /// File I/O error.
    #[error("File I/O error at {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Stored document could not be (de)serialized.
    #[error("JSON error at {path}: {source}")]
    Json {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Stored package breaks a package invariant.
    #[error("Invalid package record at {path}: {source}")]
    Invalid {
        /// File path.
        path: PathBuf,
        /// Violated invariants.
        #[source]
        source: ValidationErrors,
    },
}

fn describe(revision: &Option<Revision>) -> String {
    revision.map_or_else(|| "no record".to_string(), |r| format!("revision {r}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_match_wire_format() {
        let err = RegistryError::PackageNotFound {
            name: "not-exists".to_string(),
        };
        assert_eq!(err.to_string(), "not-exists not found");

        let err = RegistryError::VersionNotFound {
            name: "@cnpm/koa".to_string(),
            version: "199.0.0".to_string(),
        };
        assert_eq!(err.to_string(), "@cnpm/koa@199.0.0 not found");

        let err = RegistryError::TagIsRange {
            tag: "111".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Tag name must not be a valid SemVer range: \"111\""
        );

        let err = RegistryError::InvalidVersion {
            version: String::new(),
        };
        assert_eq!(err.to_string(), "version(\"\") format invalid");

        assert_eq!(
            RegistryError::CannotRemoveLatest.to_string(),
            "Can't remove the \"latest\" tag"
        );
    }

    #[test]
    fn test_forbidden_uses_deny_reason() {
        let err = RegistryError::Forbidden(DenyReason::ReadonlyToken {
            package: "@cnpm/koa".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "Read-only Token can't modify dist-tags of @cnpm/koa"
        );
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn test_kinds_and_status_codes() {
        let cases = [
            (
                RegistryError::PackageNotFound { name: "a".into() },
                "NOT_FOUND",
                404,
            ),
            (
                RegistryError::VersionExists {
                    name: "a".into(),
                    version: "1.0.0".into(),
                },
                "FORBIDDEN",
                403,
            ),
            (RegistryError::CannotRemoveLatest, "UNPROCESSABLE_ENTITY", 422),
            (RegistryError::Conflict { name: "a".into() }, "CONFLICT", 409),
            (
                RegistryError::Store(StoreError::Io {
                    path: PathBuf::from("/tmp/a.json"),
                    source: std::io::Error::other("disk full"),
                }),
                "INTERNAL_SERVER_ERROR",
                500,
            ),
        ];

        for (err, label, status) in cases {
            assert_eq!(err.kind().as_str(), label);
            assert_eq!(err.kind().status_code(), status);
        }
    }

    #[test]
    fn test_store_conflict_becomes_conflict() {
        let err: RegistryError = StoreError::Conflict {
            name: "koa".to_string(),
            expected: Some(Revision::INITIAL),
            actual: Some(Revision::INITIAL.next()),
        }
        .into();
        assert!(matches!(err, RegistryError::Conflict { ref name } if name == "koa"));
    }

    #[test]
    fn test_store_conflict_display() {
        let err = StoreError::Conflict {
            name: "koa".to_string(),
            expected: None,
            actual: Some(Revision::INITIAL),
        };
        assert_eq!(
            err.to_string(),
            "revision conflict on koa: expected no record, found revision 1"
        );
    }

    #[test]
    fn test_core_errors_convert() {
        let err: RegistryError = disttag_core::Error::DuplicateVersion {
            package: "@cnpm/koa".to_string(),
            version: "1.0.0".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Can't modify pre-existing version: @cnpm/koa@1.0.0"
        );
    }
}
