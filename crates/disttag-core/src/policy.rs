//! Tag mutation authorization.
//!
//! Every dist-tag mutation is gated by [`authorize`]:
//!
//! 1. A read-only token is refused, whoever holds it.
//! 2. A principal outside the package's maintainers is refused.
//! 3. Everything else is allowed.
//!
//! Automation tokens take the same path as standard tokens.

use std::fmt::Debug;

use crate::decision::{Decision, DenyReason};
use crate::identity::{Principal, TokenCapabilities};
use crate::package::Package;

/// Decides whether `principal`, using a token with `capabilities`, may
/// mutate the dist-tags of `package`.
///
/// # Examples
///
/// ```
/// use disttag_core::{authorize, Package, PackageName, Principal, TokenCapabilities};
///
/// let package = Package::new("koa".parse::<PackageName>().unwrap(), "publisher");
/// let publisher = Principal::new("publisher");
///
/// assert!(authorize(&publisher, TokenCapabilities::default(), &package).is_allowed());
/// assert!(authorize(&publisher, TokenCapabilities::automation(), &package).is_allowed());
///
/// let denied = authorize(&publisher, TokenCapabilities::readonly(), &package);
/// assert_eq!(denied.reason().unwrap().code(), "READONLY_TOKEN");
/// ```
#[must_use]
pub fn authorize(
    principal: &Principal,
    capabilities: TokenCapabilities,
    package: &Package,
) -> Decision {
    if capabilities.readonly {
        return Decision::Deny(DenyReason::ReadonlyToken {
            package: package.name.to_string(),
        });
    }

    if !package.is_maintainer(principal.name()) {
        return Decision::Deny(DenyReason::NotMaintainer {
            principal: principal.name().to_string(),
            package: package.name.to_string(),
            maintainers: package.maintainers.clone(),
        });
    }

    Decision::Allow
}

/// Pluggable authorization seam used by the registry service.
pub trait AuthorizationPolicy: Send + Sync + Debug {
    /// Evaluates a mutation request.
    fn authorize(
        &self,
        principal: &Principal,
        capabilities: TokenCapabilities,
        package: &Package,
    ) -> Decision;
}

/// The default policy: readonly tokens are refused, then maintainers only.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaintainerPolicy;

impl AuthorizationPolicy for MaintainerPolicy {
    fn authorize(
        &self,
        principal: &Principal,
        capabilities: TokenCapabilities,
        package: &Package,
    ) -> Decision {
        authorize(principal, capabilities, package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::PackageName;

    fn package() -> Package {
        Package::new(PackageName::parse("@cnpm/koa").unwrap(), "publisher")
    }

    #[test]
    fn test_maintainer_allowed() {
        let decision = authorize(
            &Principal::new("publisher"),
            TokenCapabilities::default(),
            &package(),
        );
        assert_eq!(decision, Decision::Allow);
    }

    #[test]
    fn test_readonly_precedes_membership() {
        let decision = authorize(
            &Principal::new("publisher"),
            TokenCapabilities::readonly(),
            &package(),
        );
        assert_eq!(
            decision,
            Decision::Deny(DenyReason::ReadonlyToken {
                package: "@cnpm/koa".to_string()
            })
        );

        // Non-maintainer with readonly token still reports the token.
        let decision = authorize(
            &Principal::new("other"),
            TokenCapabilities::readonly(),
            &package(),
        );
        assert_eq!(decision.reason().unwrap().code(), "READONLY_TOKEN");
    }

    #[test]
    fn test_non_maintainer_denied_with_list() {
        let package = package().with_maintainer("second");
        let decision = authorize(
            &Principal::new("other"),
            TokenCapabilities::default(),
            &package,
        );

        match decision {
            Decision::Deny(DenyReason::NotMaintainer {
                principal,
                package,
                maintainers,
            }) => {
                assert_eq!(principal, "other");
                assert_eq!(package, "@cnpm/koa");
                assert_eq!(maintainers, vec!["publisher", "second"]);
            }
            other => panic!("expected NotMaintainer, got {other:?}"),
        }
    }

    #[test]
    fn test_automation_token_is_ordinary() {
        let package = package();

        assert!(authorize(
            &Principal::new("publisher"),
            TokenCapabilities::automation(),
            &package
        )
        .is_allowed());

        let decision = authorize(
            &Principal::new("ci-bot"),
            TokenCapabilities::automation(),
            &package,
        );
        assert_eq!(decision.reason().unwrap().code(), "NOT_MAINTAINER");
    }

    #[test]
    fn test_maintainer_policy_delegates() {
        let policy = MaintainerPolicy;
        let decision = policy.authorize(
            &Principal::new("other"),
            TokenCapabilities::default(),
            &package(),
        );
        assert!(decision.is_denied());
    }
}
