//! Caller identity types for authorization.
//!
//! Authentication happens outside this crate; by the time a request reaches
//! the tag rules it carries an authenticated [`Principal`] and the
//! [`TokenCapabilities`] of the credential it used.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An authenticated actor, identified by user name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal {
    name: String,
}

impl Principal {
    /// Creates a principal with the given user name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the user name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Capability flags carried by the token a request was made with.
///
/// # Examples
///
/// ```
/// use disttag_core::{TokenCapabilities, TokenKind};
///
/// assert_eq!(TokenCapabilities::default().kind(), TokenKind::Standard);
/// assert_eq!(TokenCapabilities::readonly().kind(), TokenKind::Readonly);
/// assert_eq!(TokenCapabilities::automation().kind(), TokenKind::Automation);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenCapabilities {
    /// Token may only read; every mutation is refused.
    #[serde(default)]
    pub readonly: bool,

    /// Token was issued for automated publishing (CI).
    #[serde(default)]
    pub automation: bool,
}

impl TokenCapabilities {
    /// Capabilities of a read-only token.
    #[must_use]
    pub const fn readonly() -> Self {
        Self {
            readonly: true,
            automation: false,
        }
    }

    /// Capabilities of an automation token.
    #[must_use]
    pub const fn automation() -> Self {
        Self {
            readonly: false,
            automation: true,
        }
    }

    /// Classifies the token for logging and auditing.
    ///
    /// A token flagged both readonly and automation is reported as readonly,
    /// since that flag governs what it may do.
    #[must_use]
    pub const fn kind(self) -> TokenKind {
        if self.readonly {
            TokenKind::Readonly
        } else if self.automation {
            TokenKind::Automation
        } else {
            TokenKind::Standard
        }
    }
}

/// Coarse token classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Regular publish token.
    Standard,
    /// Read-only token.
    Readonly,
    /// Automation (CI) token.
    Automation,
}

impl TokenKind {
    /// Returns a string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Readonly => "readonly",
            Self::Automation => "automation",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
