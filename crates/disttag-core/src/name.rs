//! Fully-qualified package names.
//!
//! A package is addressed either by a bare name (`koa`) or by a scoped name
//! (`@cnpm/koa`). The scope is kept with its leading `@`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// A fully-qualified package name.
///
/// # Examples
///
/// ```
/// use disttag_core::PackageName;
///
/// let name: PackageName = "@cnpm/koa".parse().unwrap();
/// assert_eq!(name.scope(), Some("@cnpm"));
/// assert_eq!(name.name(), "koa");
/// assert_eq!(name.to_string(), "@cnpm/koa");
///
/// let bare: PackageName = "koa".parse().unwrap();
/// assert_eq!(bare.scope(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageName {
    scope: Option<String>,
    name: String,
}

impl PackageName {
    /// Parses a fully-qualified package name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPackageName`] if the name is empty, contains
    /// more than one `/`, or has a scope without a leading `@`.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let invalid = |reason: &str| Error::InvalidPackageName {
            name: input.to_string(),
            reason: reason.to_string(),
        };

        if input.is_empty() {
            return Err(invalid("name must not be empty"));
        }
        if input.chars().any(char::is_whitespace) {
            return Err(invalid("name must not contain whitespace"));
        }

        match input.split_once('/') {
            None if input.starts_with('@') => Err(invalid("scoped name requires a '/'")),
            None => Ok(Self {
                scope: None,
                name: input.to_string(),
            }),
            Some((scope, name)) => {
                if !scope.starts_with('@') || scope.len() < 2 {
                    return Err(invalid("scope must start with '@'"));
                }
                if name.is_empty() || name.contains('/') {
                    return Err(invalid("name must be a single path segment"));
                }
                Ok(Self {
                    scope: Some(scope.to_string()),
                    name: name.to_string(),
                })
            }
        }
    }

    /// Returns the scope including its `@`, if any.
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Returns the bare name without scope.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns a single-segment form safe to use as a file stem.
    ///
    /// ```
    /// use disttag_core::PackageName;
    ///
    /// let name: PackageName = "@cnpm/koa".parse().unwrap();
    /// assert_eq!(name.file_stem(), "@cnpm%2fkoa");
    /// ```
    #[must_use]
    pub fn file_stem(&self) -> String {
        match &self.scope {
            Some(scope) => format!("{scope}%2f{}", self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            Some(scope) => write!(f, "{scope}/{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

impl FromStr for PackageName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for PackageName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PackageName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare() {
        let name = PackageName::parse("not-exists").unwrap();
        assert_eq!(name.scope(), None);
        assert_eq!(name.name(), "not-exists");
        assert_eq!(name.to_string(), "not-exists");
    }

    #[test]
    fn test_parse_scoped() {
        let name = PackageName::parse("@cnpm/koa").unwrap();
        assert_eq!(name.scope(), Some("@cnpm"));
        assert_eq!(name.name(), "koa");
        assert_eq!(name.to_string(), "@cnpm/koa");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["", "@cnpm", "cnpm/koa", "@/koa", "@cnpm/", "@a/b/c", "ko a"] {
            assert!(
                PackageName::parse(input).is_err(),
                "expected {input:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_file_stem_is_single_segment() {
        let name = PackageName::parse("@cnpm/koa").unwrap();
        assert!(!name.file_stem().contains('/'));
        assert_eq!(PackageName::parse("koa").unwrap().file_stem(), "koa");
    }

    #[test]
    fn test_serde_as_string() {
        let name = PackageName::parse("@cnpm/koa").unwrap();
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"@cnpm/koa\"");

        let back: PackageName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);

        assert!(serde_json::from_str::<PackageName>("\"@broken\"").is_err());
    }
}
