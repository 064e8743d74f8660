//! Authorization decision types.
//!
//! This module defines the [`Decision`] returned by the tag authorization
//! policy and the [`DenyReason`] explaining a refusal.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The result of evaluating the authorization policy.
///
/// # Examples
///
/// ```rust
/// use disttag_core::{Decision, DenyReason};
///
/// assert!(Decision::Allow.is_allowed());
///
/// let denied = Decision::Deny(DenyReason::ReadonlyToken {
///     package: "@cnpm/koa".to_string(),
/// });
/// assert!(denied.is_denied());
/// assert_eq!(denied.reason().unwrap().code(), "READONLY_TOKEN");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "reason", rename_all = "snake_case")]
pub enum Decision {
    /// The mutation may proceed.
    Allow,
    /// The mutation is refused.
    Deny(DenyReason),
}

impl Decision {
    /// Returns true if the request was allowed.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Returns true if the request was denied.
    #[must_use]
    pub const fn is_denied(&self) -> bool {
        !self.is_allowed()
    }

    /// Returns the denial reason, if denied.
    #[must_use]
    pub const fn reason(&self) -> Option<&DenyReason> {
        match self {
            Self::Allow => None,
            Self::Deny(reason) => Some(reason),
        }
    }

    /// Converts into a `Result`, mapping a denial to `Err`.
    ///
    /// # Errors
    ///
    /// Returns the [`DenyReason`] if the decision is a denial.
    pub fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(reason),
        }
    }
}

/// Why a mutation was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenyReason {
    /// The request used a read-only token.
    ReadonlyToken {
        /// Fully-qualified package name.
        package: String,
    },

    /// The principal is not a maintainer of the package.
    NotMaintainer {
        /// Name of the refused principal.
        principal: String,
        /// Fully-qualified package name.
        package: String,
        /// Current maintainers, in package order.
        maintainers: Vec<String>,
    },
}

impl DenyReason {
    /// Returns a stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::ReadonlyToken { .. } => "READONLY_TOKEN",
            Self::NotMaintainer { .. } => "NOT_MAINTAINER",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadonlyToken { package } => {
                write!(f, "Read-only Token can't modify dist-tags of {package}")
            }
            Self::NotMaintainer {
                principal,
                package,
                maintainers,
            } => write!(
                f,
                "\"{principal}\" not authorized to modify {package}, please contact maintainers: \"{}\"",
                maintainers.join(", ")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_decision() {
        let decision = Decision::Allow;
        assert!(decision.is_allowed());
        assert!(!decision.is_denied());
        assert!(decision.reason().is_none());
        assert!(decision.into_result().is_ok());
    }

    #[test]
    fn test_readonly_message() {
        let reason = DenyReason::ReadonlyToken {
            package: "@cnpm/koa".to_string(),
        };
        assert!(reason.to_string().starts_with("Read-only Token"));
        assert_eq!(reason.code(), "READONLY_TOKEN");
    }

    #[test]
    fn test_not_maintainer_message() {
        let reason = DenyReason::NotMaintainer {
            principal: "other".to_string(),
            package: "@cnpm/koa".to_string(),
            maintainers: vec!["publisher".to_string(), "second".to_string()],
        };
        assert_eq!(
            reason.to_string(),
            "\"other\" not authorized to modify @cnpm/koa, please contact maintainers: \"publisher, second\""
        );
        assert_eq!(reason.code(), "NOT_MAINTAINER");
    }

    #[test]
    fn test_deny_into_result() {
        let decision = Decision::Deny(DenyReason::ReadonlyToken {
            package: "koa".to_string(),
        });
        let err = decision.into_result().unwrap_err();
        assert_eq!(err.code(), "READONLY_TOKEN");
    }

    #[test]
    fn test_decision_serialization() {
        let decision = Decision::Deny(DenyReason::NotMaintainer {
            principal: "other".to_string(),
            package: "koa".to_string(),
            maintainers: vec!["publisher".to_string()],
        });

        let json = serde_json::to_string(&decision).unwrap();
        assert!(json.contains(r#""decision":"deny""#));
        assert!(json.contains(r#""code":"NOT_MAINTAINER""#));

        let back: Decision = serde_json::from_str(&json).unwrap();
        assert_eq!(back, decision);
    }
}
