//! Package records.
//!
//! A [`Package`] is the unit the registry stores and mutates atomically: its
//! published versions, its dist-tags and the principals allowed to change
//! them.

use std::cmp::Ordering;

use indexmap::IndexSet;
use semver::Version;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::name::PackageName;
use crate::syntax::NpmSemver;
use crate::tags::{TagChange, TagMap, LATEST_TAG};
use crate::validation::{Validate, ValidationError, ValidationErrors};

/// A package as seen by the dist-tag subsystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Fully-qualified package name.
    pub name: PackageName,

    /// Published versions, in publish order.
    #[serde(default)]
    pub versions: IndexSet<String>,

    /// Dist-tags.
    #[serde(rename = "dist-tags", default)]
    pub tags: TagMap,

    /// Names of principals allowed to mutate the package.
    #[serde(default)]
    pub maintainers: Vec<String>,
}

impl Package {
    /// Creates a package with no versions and a single maintainer.
    #[must_use]
    pub fn new(name: PackageName, maintainer: impl Into<String>) -> Self {
        Self {
            name,
            versions: IndexSet::new(),
            tags: TagMap::new(),
            maintainers: vec![maintainer.into()],
        }
    }

    /// Adds a maintainer if not already present.
    #[must_use]
    pub fn with_maintainer(mut self, maintainer: impl Into<String>) -> Self {
        let maintainer = maintainer.into();
        if !self.is_maintainer(&maintainer) {
            self.maintainers.push(maintainer);
        }
        self
    }

    /// Returns true if `principal` may mutate this package.
    #[must_use]
    pub fn is_maintainer(&self, principal: &str) -> bool {
        self.maintainers.iter().any(|m| m == principal)
    }

    /// Returns true if `version` has been published.
    #[must_use]
    pub fn has_version(&self, version: &str) -> bool {
        self.versions.contains(version)
    }

    /// Returns true if a published version has the same SemVer precedence
    /// as `version`, so `v1.0.0`, `=1.0.0` and `1.0.0+build` all match
    /// `1.0.0`.
    fn has_equivalent_version(&self, version: &Version) -> bool {
        self.versions
            .iter()
            .filter_map(|v| NpmSemver::parse_version(v))
            .any(|v| v.cmp_precedence(version) == Ordering::Equal)
    }

    /// Records a newly published version.
    ///
    /// `latest` moves to the new version when the package had no `latest`
    /// yet or when the new version has higher SemVer precedence than the
    /// current one. Returns how `latest` changed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidVersion`] for a string that is not a full
    /// SemVer version and [`Error::DuplicateVersion`] if an equivalent
    /// version was already published.
    ///
    /// # Examples
    ///
    /// ```
    /// use disttag_core::{Package, PackageName};
    ///
    /// let mut package = Package::new("koa".parse::<PackageName>().unwrap(), "publisher");
    /// package.record_version("2.0.0").unwrap();
    /// package.record_version("1.5.0").unwrap();
    /// assert_eq!(package.tags.get("latest"), Some("2.0.0"));
    /// ```
    pub fn record_version(&mut self, version: &str) -> Result<TagChange, Error> {
        let parsed = NpmSemver::parse_version(version).ok_or_else(|| Error::InvalidVersion {
            version: version.to_string(),
        })?;
        if self.has_equivalent_version(&parsed) {
            return Err(Error::DuplicateVersion {
                package: self.name.to_string(),
                version: version.to_string(),
            });
        }

        self.versions.insert(version.to_string());

        let promote = self
            .tags
            .get(LATEST_TAG)
            .and_then(NpmSemver::parse_version)
            .map_or(true, |current| parsed > current);

        if promote {
            Ok(self.tags.set(LATEST_TAG, version))
        } else {
            Ok(TagChange::Unchanged)
        }
    }
}

impl Validate for Package {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if !self.versions.is_empty() && !self.tags.contains(LATEST_TAG) {
            errors.add(ValidationError::required(format!("tags.{LATEST_TAG}")));
        }

        for (tag, version) in self.tags.iter() {
            if !self.has_version(version) {
                errors.add(ValidationError::reference(
                    format!("tags.{tag}"),
                    format!("points at unpublished version {version}"),
                ));
            }
        }

        for (index, version) in self.versions.iter().enumerate() {
            if NpmSemver::parse_version(version).is_none() {
                errors.add(ValidationError::format(
                    format!("versions[{index}]"),
                    format!("\"{version}\" is not a valid SemVer version"),
                ));
            }
        }

        if self.maintainers.is_empty() {
            errors.add(ValidationError::constraint(
                "maintainers",
                "a package needs at least one maintainer",
            ));
        }

        errors.into_result()
    }
}
