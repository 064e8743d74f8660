//! SemVer version and range detection.
//!
//! Tag names share a namespace with version ranges when clients resolve a
//! dependency specifier (`koa@beta` vs `koa@1.0`), so the registry must be
//! able to tell whether a string is a range. Parsing is delegated to the
//! `semver` crate; [`NpmSemver`] adapts npm range syntax (`||` alternatives,
//! hyphen ranges, space-separated comparators, a leading `v`) onto it.

use std::fmt::Debug;

use semver::{Version, VersionReq};

/// Capability that classifies version-like strings.
pub trait VersionSyntax: Send + Sync + Debug {
    /// Returns true if `version` is a single, fully specified version.
    fn is_valid_version(&self, version: &str) -> bool;

    /// Returns true if `range` is accepted as a version range.
    fn is_valid_range(&self, range: &str) -> bool;
}

/// npm-compatible SemVer syntax backed by the `semver` crate.
///
/// # Examples
///
/// ```
/// use disttag_core::{NpmSemver, VersionSyntax};
///
/// let syntax = NpmSemver;
/// assert!(syntax.is_valid_version("1.0.0"));
/// assert!(!syntax.is_valid_version("1.0"));
///
/// assert!(syntax.is_valid_range("1.0"));
/// assert!(syntax.is_valid_range("111"));
/// assert!(syntax.is_valid_range(">=1.2.3 <2 || 3.x"));
/// assert!(!syntax.is_valid_range("beta"));
/// assert!(!syntax.is_valid_range("latest-3"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct NpmSemver;

const OPERATOR_CHARS: &[char] = &['<', '>', '=', '~', '^'];

impl NpmSemver {
    /// Parses a fully specified version, tolerating one leading `v` or `=`.
    #[must_use]
    pub fn parse_version(version: &str) -> Option<Version> {
        let stripped = version
            .strip_prefix('v')
            .or_else(|| version.strip_prefix('='))
            .unwrap_or(version);
        Version::parse(stripped).ok()
    }

    fn is_valid_comparator_set(set: &str) -> bool {
        let set = set.trim();
        if set.is_empty() {
            // An empty set means "any version".
            return true;
        }

        if let Some((low, high)) = set.split_once(" - ") {
            return Self::is_partial_version(low.trim()) && Self::is_partial_version(high.trim());
        }

        let mut comparators = Vec::new();
        let mut pending_operator: Option<&str> = None;
        for token in set.split_whitespace() {
            if token.chars().all(|c| OPERATOR_CHARS.contains(&c)) {
                if pending_operator.is_some() {
                    return false;
                }
                pending_operator = Some(token);
                continue;
            }

            let comparator = match pending_operator.take() {
                Some(op) => format!("{op}{token}"),
                None => token.to_string(),
            };
            match Self::normalize_comparator(&comparator) {
                Some(normalized) => comparators.push(normalized),
                None => return false,
            }
        }

        if pending_operator.is_some() || comparators.is_empty() {
            return false;
        }

        VersionReq::parse(&comparators.join(", ")).is_ok()
    }

    /// Rewrites an npm comparator into the form `semver` accepts.
    fn normalize_comparator(comparator: &str) -> Option<String> {
        let split_at = comparator
            .find(|c: char| !OPERATOR_CHARS.contains(&c))
            .unwrap_or(comparator.len());
        let (op, rest) = comparator.split_at(split_at);

        let op = match op {
            "" | "=" | "<" | ">" | "<=" | ">=" | "~" | "^" => op,
            "~>" => "~",
            _ => return None,
        };
        let rest = rest.strip_prefix('v').unwrap_or(rest);
        if rest.is_empty() {
            return None;
        }

        Some(format!("{op}{rest}"))
    }

    fn is_partial_version(partial: &str) -> bool {
        let partial = partial.strip_prefix('v').unwrap_or(partial);
        !partial.is_empty()
            && !partial.starts_with(OPERATOR_CHARS)
            && VersionReq::parse(partial).is_ok()
    }
}

impl VersionSyntax for NpmSemver {
    fn is_valid_version(&self, version: &str) -> bool {
        Self::parse_version(version).is_some()
    }

    fn is_valid_range(&self, range: &str) -> bool {
        range.split("||").all(Self::is_valid_comparator_set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_versions() {
        let syntax = NpmSemver;
        for version in ["1.0.0", "199.0.0", "1.0.0-beta.1", "2.0.0+build.5", "v1.0.0"] {
            assert!(syntax.is_valid_version(version), "{version} should be valid");
        }
    }

    #[test]
    fn test_invalid_versions() {
        let syntax = NpmSemver;
        for version in ["", "wrong.ver.1", "1.0", "1", "^1.0.0", "latest", " 1.0.0", "01.0.0"] {
            assert!(!syntax.is_valid_version(version), "{version:?} should be invalid");
        }
    }

    #[test]
    fn test_plain_numbers_are_ranges() {
        let syntax = NpmSemver;
        assert!(syntax.is_valid_range("111"));
        assert!(syntax.is_valid_range("1.0"));
        assert!(syntax.is_valid_range("1.0.0"));
    }

    #[test]
    fn test_npm_range_forms() {
        let syntax = NpmSemver;
        for range in [
            "^1.0.0",
            "~1.2",
            "~>1.2.3",
            ">=1.0.0 <2.0.0",
            ">= 1.0.0",
            "1.0.0 - 2.0.0",
            "1.x || >=2.5.0",
            "*",
            "x",
            "1.2.*",
            "v1",
            "=1.0.0",
        ] {
            assert!(syntax.is_valid_range(range), "{range:?} should be a range");
        }
    }

    #[test]
    fn test_empty_is_any_range() {
        let syntax = NpmSemver;
        assert!(syntax.is_valid_range(""));
        assert!(syntax.is_valid_range("   "));
    }

    #[test]
    fn test_tag_names_are_not_ranges() {
        let syntax = NpmSemver;
        for tag in [
            "latest",
            "beta",
            "beta2",
            "latest-3",
            "automation",
            "next",
            "release-1.x",
            "canary-2024",
            ">=",
        ] {
            assert!(!syntax.is_valid_range(tag), "{tag:?} should not be a range");
        }
    }

    #[test]
    fn test_parse_version_strips_prefix() {
        assert_eq!(
            NpmSemver::parse_version("v2.0.0"),
            Some(Version::new(2, 0, 0))
        );
        assert_eq!(
            NpmSemver::parse_version("=2.0.0"),
            Some(Version::new(2, 0, 0))
        );
        assert_eq!(NpmSemver::parse_version("vv2.0.0"), None);
    }
}
