//! Property-based tests for disttag-core types.
//!
//! These tests use proptest to verify invariants across many randomly generated inputs.

use proptest::prelude::*;

use crate::{
    authorize, NpmSemver, Package, PackageName, Principal, TagChange, TagMap, TokenCapabilities,
    Validate, VersionSyntax, LATEST_TAG,
};

/// Strategy for generating word-like tag names (never ranges).
fn tag_name_strategy() -> impl Strategy<Value = String> {
    "[a-uwyz][a-z-]{1,12}"
}

/// Strategy for generating numeric identifiers without leading zeros.
fn numeric_strategy() -> impl Strategy<Value = String> {
    "(0|[1-9][0-9]{0,3})"
}

/// Strategy for generating full versions.
fn version_strategy() -> impl Strategy<Value = String> {
    (0u64..20, 0u64..20, 0u64..20).prop_map(|(major, minor, patch)| format!("{major}.{minor}.{patch}"))
}

/// Strategy for generating partial numeric versions such as `1`, `1.0`, `1.0.3`.
fn partial_version_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(numeric_strategy(), 1..=3).prop_map(|parts| parts.join("."))
}

/// Strategy for generating user names.
fn user_strategy() -> impl Strategy<Value = String> {
    "(user|dev|ci)-[a-f0-9]{4,8}"
}

proptest! {
    #[test]
    fn word_tags_are_never_ranges(tag in tag_name_strategy()) {
        prop_assert!(!NpmSemver.is_valid_range(&tag));
    }

    #[test]
    fn numeric_tags_are_always_ranges(tag in partial_version_strategy()) {
        prop_assert!(NpmSemver.is_valid_range(&tag));
    }

    #[test]
    fn full_versions_are_valid(version in version_strategy()) {
        prop_assert!(NpmSemver.is_valid_version(&version));
    }

    #[test]
    fn tag_map_keeps_first_insertion_order(
        ops in prop::collection::vec((tag_name_strategy(), version_strategy()), 1..30)
    ) {
        let mut tags = TagMap::new();
        let mut expected_order: Vec<String> = Vec::new();

        for (tag, version) in &ops {
            if !expected_order.contains(tag) {
                expected_order.push(tag.clone());
            }
            tags.set(tag.clone(), version.clone());
        }

        let order: Vec<String> = tags.iter().map(|(t, _)| t.to_string()).collect();
        prop_assert_eq!(order, expected_order);
    }

    #[test]
    fn tag_set_is_idempotent(tag in tag_name_strategy(), version in version_strategy()) {
        let mut once = TagMap::new();
        once.set(tag.clone(), version.clone());

        let mut twice = once.clone();
        let change = twice.set(tag, version);

        prop_assert_eq!(change, TagChange::Unchanged);
        prop_assert_eq!(once.snapshot(), twice.snapshot());
    }

    #[test]
    fn latest_tracks_highest_published_version(
        versions in prop::collection::hash_set(version_strategy(), 1..15)
    ) {
        let mut package = Package::new(PackageName::parse("@scope/pkg").unwrap(), "publisher");
        for version in &versions {
            package.record_version(version).unwrap();
        }

        let highest = versions
            .iter()
            .max_by_key(|v| NpmSemver::parse_version(v).unwrap())
            .unwrap();

        prop_assert_eq!(package.tags.get(LATEST_TAG), Some(highest.as_str()));
        prop_assert!(package.validate().is_ok());
    }

    #[test]
    fn readonly_is_denied_for_everyone(
        maintainers in prop::collection::vec(user_strategy(), 1..5),
        caller in user_strategy(),
        automation in any::<bool>(),
    ) {
        let mut package = Package::new(PackageName::parse("koa").unwrap(), maintainers[0].clone());
        for maintainer in &maintainers[1..] {
            package = package.with_maintainer(maintainer.clone());
        }

        let caps = TokenCapabilities { readonly: true, automation };
        let decision = authorize(&Principal::new(caller), caps, &package);
        prop_assert_eq!(decision.reason().map(|r| r.code()), Some("READONLY_TOKEN"));
    }

    #[test]
    fn membership_decides_for_writable_tokens(
        maintainers in prop::collection::vec(user_strategy(), 1..5),
        caller in user_strategy(),
        automation in any::<bool>(),
    ) {
        let mut package = Package::new(PackageName::parse("koa").unwrap(), maintainers[0].clone());
        for maintainer in &maintainers[1..] {
            package = package.with_maintainer(maintainer.clone());
        }

        let caps = TokenCapabilities { readonly: false, automation };
        let decision = authorize(&Principal::new(caller.clone()), caps, &package);
        prop_assert_eq!(decision.is_allowed(), maintainers.contains(&caller));
    }
}
