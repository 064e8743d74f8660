//! Version recording.
//!
//! Dist-tags can only point at published versions, so the registry needs a
//! minimal way to publish one. [`Publisher`] records the version string and
//! keeps `latest` on the highest version; it stores no artifacts.

use std::sync::Arc;

use disttag_audit::{AuditLogger, TagEvent};
use disttag_core::{
    AuthorizationPolicy, MaintainerPolicy, NpmSemver, Package, PackageName, Principal, TagChange,
    TagMap, TokenCapabilities, LATEST_TAG,
};
use serde::Serialize;
use tracing::{info, instrument};

use crate::error::{RegistryError, Result};
use crate::service::{check_authorized, log_audit};
use crate::store::{PackageStore, Revision};

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    /// Revision the package was committed at.
    pub revision: Revision,
    /// True if this publish created the package.
    pub created: bool,
    /// How `latest` moved.
    pub latest: TagChange,
    /// The package's tags after the publish.
    pub tags: TagMap,
}

/// Records new versions of packages.
#[derive(Debug, Clone)]
pub struct Publisher {
    store: Arc<dyn PackageStore>,
    policy: Arc<dyn AuthorizationPolicy>,
    audit: Option<Arc<AuditLogger>>,
}

impl Publisher {
    /// Creates a publisher with the default maintainer policy.
    #[must_use]
    pub fn new(store: Arc<dyn PackageStore>) -> Self {
        Self::from_parts(store, Arc::new(MaintainerPolicy), None)
    }

    pub(crate) fn from_parts(
        store: Arc<dyn PackageStore>,
        policy: Arc<dyn AuthorizationPolicy>,
        audit: Option<Arc<AuditLogger>>,
    ) -> Self {
        Self {
            store,
            policy,
            audit,
        }
    }

    /// Publishes `version` of `name`.
    ///
    /// The first publish creates the package with `principal` as its sole
    /// maintainer. Later publishes require the principal to be a
    /// maintainer.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidVersion`] for a malformed version
    /// - [`RegistryError::Forbidden`] when the policy refuses the caller
    /// - [`RegistryError::VersionExists`] when the version was published before
    /// - [`RegistryError::Conflict`] if the package changed concurrently
    #[instrument(skip_all, fields(package = %name, version = version))]
    pub async fn publish(
        &self,
        name: &PackageName,
        version: &str,
        principal: &Principal,
        capabilities: TokenCapabilities,
    ) -> Result<PublishOutcome> {
        if NpmSemver::parse_version(version).is_none() {
            return Err(RegistryError::InvalidVersion {
                version: version.to_string(),
            });
        }

        let (expected, mut package) = match self.store.load(name).await? {
            Some(stored) => (Some(stored.revision), stored.value),
            None => (None, Package::new(name.clone(), principal.name())),
        };

        check_authorized(
            self.policy.as_ref(),
            self.audit.as_deref(),
            "publish",
            principal,
            capabilities,
            &package,
        )?;

        let latest = package.record_version(version)?;
        let tags = package.tags.clone();
        let revision = self.store.compare_and_swap(expected, package).await?;
        info!(%revision, latest_moved = latest.is_modified(), "Version published");

        if latest.is_modified() {
            let mut event = TagEvent::saved(&name.to_string(), LATEST_TAG, version, principal.name())
                .with_token_kind(capabilities.kind().as_str());
            if let TagChange::Updated { previous } = &latest {
                event = event.with_previous_version(previous);
            }
            log_audit(self.audit.as_deref(), &event);
        }

        Ok(PublishOutcome {
            revision,
            created: expected.is_none(),
            latest,
            tags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    fn koa() -> PackageName {
        PackageName::parse("@cnpm/koa").unwrap()
    }

    #[tokio::test]
    async fn test_first_publish_creates_package() {
        let store = Arc::new(InMemoryStore::new());
        let publisher = Publisher::new(store.clone());

        let outcome = publisher
            .publish(&koa(), "1.0.0", &Principal::new("publisher"), TokenCapabilities::default())
            .await
            .unwrap();

        assert!(outcome.created);
        assert_eq!(outcome.revision, Revision::INITIAL);
        assert_eq!(outcome.latest, TagChange::Created);
        assert_eq!(outcome.tags.get(LATEST_TAG), Some("1.0.0"));

        let stored = store.load(&koa()).await.unwrap().unwrap();
        assert_eq!(stored.value.maintainers, vec!["publisher"]);
    }

    #[tokio::test]
    async fn test_republish_is_forbidden() {
        let publisher = Publisher::new(Arc::new(InMemoryStore::new()));
        let user = Principal::new("publisher");
        let caps = TokenCapabilities::default();

        publisher.publish(&koa(), "1.0.0", &user, caps).await.unwrap();
        let err = publisher.publish(&koa(), "1.0.0", &user, caps).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Can't modify pre-existing version: @cnpm/koa@1.0.0"
        );
    }

    #[tokio::test]
    async fn test_invalid_version_rejected_before_load() {
        let publisher = Publisher::new(Arc::new(InMemoryStore::new()));
        let err = publisher
            .publish(&koa(), "1.0", &Principal::new("publisher"), TokenCapabilities::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "version(\"1.0\") format invalid");
    }

    #[tokio::test]
    async fn test_non_maintainer_and_readonly_refused() {
        let publisher = Publisher::new(Arc::new(InMemoryStore::new()));
        publisher
            .publish(&koa(), "1.0.0", &Principal::new("publisher"), TokenCapabilities::default())
            .await
            .unwrap();

        let err = publisher
            .publish(&koa(), "1.1.0", &Principal::new("other"), TokenCapabilities::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Forbidden(ref r) if r.code() == "NOT_MAINTAINER"));

        let err = publisher
            .publish(&koa(), "1.1.0", &Principal::new("publisher"), TokenCapabilities::readonly())
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Forbidden(ref r) if r.code() == "READONLY_TOKEN"));
    }

    #[tokio::test]
    async fn test_latest_follows_highest_version() {
        let publisher = Publisher::new(Arc::new(InMemoryStore::new()));
        let user = Principal::new("publisher");
        let caps = TokenCapabilities::default();

        publisher.publish(&koa(), "1.0.0", &user, caps).await.unwrap();
        let outcome = publisher.publish(&koa(), "2.0.0", &user, caps).await.unwrap();
        assert_eq!(outcome.tags.get(LATEST_TAG), Some("2.0.0"));

        let outcome = publisher.publish(&koa(), "1.5.0", &user, caps).await.unwrap();
        assert_eq!(outcome.latest, TagChange::Unchanged);
        assert_eq!(outcome.tags.get(LATEST_TAG), Some("2.0.0"));
        assert_eq!(outcome.revision.get(), 3);
    }
}
