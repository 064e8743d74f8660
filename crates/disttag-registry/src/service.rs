//! Tag registry service.
//!
//! [`TagRegistry`] is the single entry point for reading and mutating
//! dist-tags. Each mutation loads the package with its revision, runs its
//! gates in a fixed order, mutates a private copy and commits through
//! [`PackageStore::compare_and_swap`]. A failed gate never writes.

use std::sync::Arc;

use disttag_audit::{AuditEvent, AuditLogger, AuthorizationEvent, TagEvent};
use disttag_core::{
    AuthorizationPolicy, Decision, MaintainerPolicy, NpmSemver, Package, PackageName, Principal,
    TagChange, TagMap, TokenCapabilities, VersionSyntax, LATEST_TAG,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::{RegistryError, Result};
use crate::publish::Publisher;
use crate::store::{PackageStore, Revision, Versioned};

/// Result of a successful [`TagRegistry::save`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagUpdate {
    /// How the tag changed.
    pub change: TagChange,
    /// The package's tags after the call.
    pub tags: TagMap,
}

/// Result of a successful [`TagRegistry::remove`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum TagRemoval {
    /// The tag existed and was deleted.
    Removed {
        /// Version the tag pointed at.
        version: String,
    },
    /// The tag did not exist; nothing was written.
    Absent,
}

impl TagRemoval {
    /// Returns true if a tag was deleted.
    #[must_use]
    pub const fn is_removed(&self) -> bool {
        matches!(self, Self::Removed { .. })
    }
}

/// Dist-tag read and mutation service.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use disttag_core::{PackageName, Principal, TokenCapabilities};
/// use disttag_registry::{InMemoryStore, TagRegistry};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let registry = TagRegistry::new(Arc::new(InMemoryStore::new()));
/// let name: PackageName = "@cnpm/koa".parse().unwrap();
/// let publisher = Principal::new("publisher");
/// let caps = TokenCapabilities::default();
///
/// registry.publisher().publish(&name, "1.0.0", &publisher, caps).await.unwrap();
/// registry.save(&name, "beta", "1.0.0", &publisher, caps).await.unwrap();
///
/// let tags = registry.show(&name).await.unwrap();
/// assert_eq!(tags.get("beta"), Some("1.0.0"));
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TagRegistry {
    store: Arc<dyn PackageStore>,
    policy: Arc<dyn AuthorizationPolicy>,
    syntax: Arc<dyn VersionSyntax>,
    audit: Option<Arc<AuditLogger>>,
}

impl TagRegistry {
    /// Creates a service with the default policy and npm SemVer syntax.
    #[must_use]
    pub fn new(store: Arc<dyn PackageStore>) -> Self {
        Self::builder(store).build()
    }

    /// Creates a builder for configuring the service.
    #[must_use]
    pub fn builder(store: Arc<dyn PackageStore>) -> TagRegistryBuilder {
        TagRegistryBuilder::new(store)
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn PackageStore> {
        &self.store
    }

    /// Returns a publisher sharing this service's store, policy and audit log.
    #[must_use]
    pub fn publisher(&self) -> Publisher {
        Publisher::from_parts(
            Arc::clone(&self.store),
            Arc::clone(&self.policy),
            self.audit.clone(),
        )
    }

    /// Returns the dist-tags of a package.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::PackageNotFound`] if the package does not
    /// exist, or a store error.
    #[instrument(skip_all, fields(package = %name))]
    pub async fn show(&self, name: &PackageName) -> Result<TagMap> {
        Ok(self.resolve(name).await?.value.tags)
    }

    /// Returns the whole package record.
    ///
    /// # Errors
    ///
    /// Same as [`TagRegistry::show`].
    #[instrument(skip_all, fields(package = %name))]
    pub async fn package(&self, name: &PackageName) -> Result<Package> {
        Ok(self.resolve(name).await?.value)
    }

    /// Points `tag` at `version`.
    ///
    /// Gates, in order: package exists, caller is authorized, trimmed tag is
    /// not a SemVer range, version is a full SemVer version, version is
    /// published. Saving a tag to the version it already names succeeds
    /// without writing.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing gate, or
    /// [`RegistryError::Conflict`] if the package changed concurrently.
    #[instrument(skip_all, fields(package = %name, tag = tag.trim(), version = version))]
    pub async fn save(
        &self,
        name: &PackageName,
        tag: &str,
        version: &str,
        principal: &Principal,
        capabilities: TokenCapabilities,
    ) -> Result<TagUpdate> {
        let (
            Versioned {
                revision,
                value: mut package,
            },
            tag,
        ) = self.admit("save_tag", name, tag, principal, capabilities).await?;

        if !self.syntax.is_valid_version(version) {
            return Err(RegistryError::InvalidVersion {
                version: version.to_string(),
            });
        }
        if !package.has_version(version) {
            return Err(RegistryError::VersionNotFound {
                name: name.to_string(),
                version: version.to_string(),
            });
        }

        let change = package.tags.set(tag, version);
        if !change.is_modified() {
            debug!(tag, version, "Tag already set, nothing to write");
            return Ok(TagUpdate {
                change,
                tags: package.tags,
            });
        }

        let tags = package.tags.clone();
        let revision = self.commit(revision, package).await?;
        info!(tag, version, %revision, ?change, "Tag saved");

        let mut event = TagEvent::saved(&name.to_string(), tag, version, principal.name())
            .with_token_kind(capabilities.kind().as_str());
        if let TagChange::Updated { previous } = &change {
            event = event.with_previous_version(previous);
        }
        self.audit(&event);

        Ok(TagUpdate { change, tags })
    }

    /// Runs the gates of [`TagRegistry::save`] that come before the version
    /// check: package exists, caller is authorized, tag is not a range.
    ///
    /// Callers that cannot decode a version at all use this so their error
    /// still surfaces in gate order.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing gate.
    #[instrument(skip_all, fields(package = %name, tag = tag.trim()))]
    pub async fn precheck_save(
        &self,
        name: &PackageName,
        tag: &str,
        principal: &Principal,
        capabilities: TokenCapabilities,
    ) -> Result<()> {
        self.admit("save_tag", name, tag, principal, capabilities)
            .await
            .map(|_| ())
    }

    /// Deletes `tag`.
    ///
    /// Gates, in order: package exists, caller is authorized, trimmed tag is
    /// not a SemVer range, tag is not `latest`. Removing an absent tag
    /// succeeds without writing.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing gate, or
    /// [`RegistryError::Conflict`] if the package changed concurrently.
    #[instrument(skip_all, fields(package = %name, tag = tag.trim()))]
    pub async fn remove(
        &self,
        name: &PackageName,
        tag: &str,
        principal: &Principal,
        capabilities: TokenCapabilities,
    ) -> Result<TagRemoval> {
        let (
            Versioned {
                revision,
                value: mut package,
            },
            tag,
        ) = self
            .admit("remove_tag", name, tag, principal, capabilities)
            .await?;

        if tag == LATEST_TAG {
            return Err(RegistryError::CannotRemoveLatest);
        }

        let Some(version) = package.tags.get(tag).map(str::to_string) else {
            debug!(tag, "Tag absent, nothing to remove");
            return Ok(TagRemoval::Absent);
        };

        package.tags.delete(tag);
        let revision = self.commit(revision, package).await?;
        info!(tag, version = %version, %revision, "Tag removed");

        self.audit(
            &TagEvent::removed(&name.to_string(), tag, &version, principal.name())
                .with_token_kind(capabilities.kind().as_str()),
        );

        Ok(TagRemoval::Removed { version })
    }

    /// Loads the package, authorizes the caller and trims the tag.
    async fn admit<'a>(
        &self,
        operation: &str,
        name: &PackageName,
        tag: &'a str,
        principal: &Principal,
        capabilities: TokenCapabilities,
    ) -> Result<(Versioned<Package>, &'a str)> {
        let stored = self.resolve(name).await?;
        self.check_authorized(operation, principal, capabilities, &stored.value)?;
        let tag = self.check_tag(tag)?;
        Ok((stored, tag))
    }

    async fn resolve(&self, name: &PackageName) -> Result<Versioned<Package>> {
        self.store
            .load(name)
            .await?
            .ok_or_else(|| RegistryError::PackageNotFound {
                name: name.to_string(),
            })
    }

    fn check_authorized(
        &self,
        operation: &str,
        principal: &Principal,
        capabilities: TokenCapabilities,
        package: &Package,
    ) -> Result<()> {
        check_authorized(
            self.policy.as_ref(),
            self.audit.as_deref(),
            operation,
            principal,
            capabilities,
            package,
        )
    }

    /// Trims `tag` and rejects range-like names.
    fn check_tag<'a>(&self, tag: &'a str) -> Result<&'a str> {
        let tag = tag.trim();
        if self.syntax.is_valid_range(tag) {
            return Err(RegistryError::TagIsRange {
                tag: tag.to_string(),
            });
        }
        Ok(tag)
    }

    async fn commit(&self, revision: Revision, package: Package) -> Result<Revision> {
        let name = package.name.to_string();
        self.store
            .compare_and_swap(Some(revision), package)
            .await
            .map_err(|e| {
                let err = RegistryError::from(e);
                if matches!(err, RegistryError::Conflict { .. }) {
                    warn!(package = %name, %revision, "Concurrent modification, commit refused");
                }
                err
            })
    }

    fn audit<E: AuditEvent>(&self, event: &E) {
        log_audit(self.audit.as_deref(), event);
    }
}

/// Runs the policy, auditing and logging a denial.
pub(crate) fn check_authorized(
    policy: &dyn AuthorizationPolicy,
    audit: Option<&AuditLogger>,
    operation: &str,
    principal: &Principal,
    capabilities: TokenCapabilities,
    package: &Package,
) -> Result<()> {
    match policy.authorize(principal, capabilities, package) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => {
            warn!(
                principal = %principal,
                token = %capabilities.kind(),
                code = reason.code(),
                "{operation} denied"
            );
            log_audit(
                audit,
                &AuthorizationEvent::denied(
                    &package.name.to_string(),
                    operation,
                    principal.name(),
                    capabilities.kind().as_str(),
                    reason.code(),
                    &reason.to_string(),
                ),
            );
            Err(RegistryError::Forbidden(reason))
        }
    }
}

/// Sends an event to the audit log; audit failures never fail the request.
pub(crate) fn log_audit<E: AuditEvent>(audit: Option<&AuditLogger>, event: &E) {
    if let Some(logger) = audit {
        if let Err(e) = logger.log(event) {
            warn!(error = %e, "Failed to write audit event");
        }
    }
}

/// Builder for [`TagRegistry`].
#[derive(Debug)]
pub struct TagRegistryBuilder {
    store: Arc<dyn PackageStore>,
    policy: Arc<dyn AuthorizationPolicy>,
    syntax: Arc<dyn VersionSyntax>,
    audit: Option<Arc<AuditLogger>>,
}

impl TagRegistryBuilder {
    /// Creates a builder with the default policy and syntax.
    #[must_use]
    pub fn new(store: Arc<dyn PackageStore>) -> Self {
        Self {
            store,
            policy: Arc::new(MaintainerPolicy),
            syntax: Arc::new(NpmSemver),
            audit: None,
        }
    }

    /// Replaces the authorization policy.
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn AuthorizationPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the version syntax.
    #[must_use]
    pub fn with_syntax(mut self, syntax: Arc<dyn VersionSyntax>) -> Self {
        self.syntax = syntax;
        self
    }

    /// Sends tag and authorization events to `logger`.
    #[must_use]
    pub fn with_audit(mut self, logger: Arc<AuditLogger>) -> Self {
        self.audit = Some(logger);
        self
    }

    /// Builds the service.
    #[must_use]
    pub fn build(self) -> TagRegistry {
        TagRegistry {
            store: self.store,
            policy: self.policy,
            syntax: self.syntax,
            audit: self.audit,
        }
    }
}
