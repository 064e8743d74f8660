//! Package persistence.
//!
//! The registry reads and writes whole [`Package`] records. Writers never
//! overwrite blindly: every commit names the [`Revision`] it loaded and the
//! store refuses the write if another writer committed in between.

use std::collections::HashMap;
use std::fmt::{self, Debug};

use async_trait::async_trait;
use disttag_core::{Package, PackageName};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Monotonically increasing revision of a stored package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(u64);

impl Revision {
    /// Revision assigned to a package on its first commit.
    pub const INITIAL: Self = Self(1);

    /// Creates a revision from its raw value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the revision that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Revision that a commit on top of `expected` produces.
    #[must_use]
    pub const fn after(expected: Option<Self>) -> Self {
        match expected {
            Some(revision) => revision.next(),
            None => Self::INITIAL,
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A value together with the revision it was read at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    /// Revision the value was read at.
    pub revision: Revision,
    /// The value.
    pub value: T,
}

impl<T> Versioned<T> {
    /// Pairs a value with its revision.
    pub const fn new(revision: Revision, value: T) -> Self {
        Self { revision, value }
    }
}

/// Persistence collaborator keyed by package name.
#[async_trait]
pub trait PackageStore: Send + Sync + Debug {
    /// Loads a package, or `None` if it was never stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the record exists but cannot be read.
    async fn load(&self, name: &PackageName) -> Result<Option<Versioned<Package>>, StoreError>;

    /// Stores `package` if the current revision equals `expected`.
    ///
    /// `expected == None` means the package must not exist yet. On success
    /// the new revision is returned.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the stored revision differs
    /// from `expected`, or an I/O error if the write fails.
    async fn compare_and_swap(
        &self,
        expected: Option<Revision>,
        package: Package,
    ) -> Result<Revision, StoreError>;

    /// Lists the names of all stored packages, sorted by full name.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be enumerated.
    async fn list(&self) -> Result<Vec<PackageName>, StoreError>;
}

/// Process-local store, used by tests and `storage: memory` servers.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    packages: RwLock<HashMap<PackageName, Versioned<Package>>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored packages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.read().len()
    }

    /// Returns true if no package is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.read().is_empty()
    }
}

#[async_trait]
impl PackageStore for InMemoryStore {
    async fn load(&self, name: &PackageName) -> Result<Option<Versioned<Package>>, StoreError> {
        Ok(self.packages.read().get(name).cloned())
    }

    async fn compare_and_swap(
        &self,
        expected: Option<Revision>,
        package: Package,
    ) -> Result<Revision, StoreError> {
        let mut packages = self.packages.write();
        let actual = packages.get(&package.name).map(|stored| stored.revision);
        if actual != expected {
            return Err(StoreError::Conflict {
                name: package.name.to_string(),
                expected,
                actual,
            });
        }

        let revision = Revision::after(expected);
        packages.insert(package.name.clone(), Versioned::new(revision, package));
        Ok(revision)
    }

    async fn list(&self) -> Result<Vec<PackageName>, StoreError> {
        let mut names: Vec<PackageName> = self.packages.read().keys().cloned().collect();
        names.sort_by_cached_key(ToString::to_string);
        Ok(names)
    }
}
