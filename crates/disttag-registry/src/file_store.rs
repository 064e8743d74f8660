//! File-backed package store.
//!
//! Each package lives in `<root>/packages/<file stem>.json` as a
//! `{ "revision": n, "package": {...} }` document. Writes go through a temp
//! file in the same directory followed by an atomic rename, so readers never
//! observe a half-written record.
//!
//! Compare-and-swap holds an exclusive advisory lock on
//! `<root>/packages/<file stem>.lock` while it re-reads the revision and
//! renames, so every process and every `FileStore` sharing a root sees one
//! writer per package at a time.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use disttag_core::{Package, PackageName, Validate};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::store::{PackageStore, Revision, Versioned};

const PACKAGES_DIR: &str = "packages";

#[derive(Debug, Serialize, Deserialize)]
struct StoredPackage {
    revision: Revision,
    package: Package,
}

/// Default data directory (`<data dir>/disttag`).
#[must_use]
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("disttag")
}

/// Store that keeps one JSON document per package on disk.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    /// Keeps this store's writers off the blocking pool while another
    /// writer holds the file lock.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Opens a store rooted at `root`, creating the directory layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be created.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use disttag_registry::FileStore;
    ///
    /// let store = FileStore::open("/var/lib/disttag")?;
    /// # Ok::<(), disttag_registry::StoreError>(())
    /// ```
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        let packages = root.join(PACKAGES_DIR);
        std::fs::create_dir_all(&packages).map_err(|source| StoreError::Io {
            path: packages.clone(),
            source,
        })?;

        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    /// Returns the store's root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the path of the document holding `name`.
    #[must_use]
    pub fn package_path(&self, name: &PackageName) -> PathBuf {
        self.root
            .join(PACKAGES_DIR)
            .join(format!("{}.json", name.file_stem()))
    }

    /// Returns the path of the lock file guarding writes to `name`.
    #[must_use]
    pub fn lock_path(&self, name: &PackageName) -> PathBuf {
        self.root
            .join(PACKAGES_DIR)
            .join(format!("{}.lock", name.file_stem()))
    }

    async fn read(&self, path: &Path) -> Result<Option<StoredPackage>, StoreError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => decode(path, &bytes).map(Some),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

/// Parses a stored document and checks the package invariants.
fn decode(path: &Path, bytes: &[u8]) -> Result<StoredPackage, StoreError> {
    let stored: StoredPackage = serde_json::from_slice(bytes).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    stored
        .package
        .validate()
        .map_err(|source| StoreError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(stored)
}

fn read_blocking(path: &Path) -> Result<Option<StoredPackage>, StoreError> {
    match std::fs::read(path) {
        Ok(bytes) => decode(path, &bytes).map(Some),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `bytes` to `path` via a sibling temp file and rename.
fn write_atomically(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn open_lock(path: &Path) -> Result<File, StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(path)
        .map_err(io_err)?;
    FileExt::lock_exclusive(&file).map_err(io_err)?;
    Ok(file)
}

/// Checks the stored revision and writes `package` under the package lock.
///
/// The lock is released when the returned guard file is closed.
fn swap_locked(
    path: &Path,
    lock_path: &Path,
    expected: Option<Revision>,
    package: Package,
) -> Result<Revision, StoreError> {
    let _lock = open_lock(lock_path)?;

    let actual = read_blocking(path)?.map(|stored| stored.revision);
    if actual != expected {
        warn!(package = %package.name, ?expected, ?actual, "Revision conflict");
        return Err(StoreError::Conflict {
            name: package.name.to_string(),
            expected,
            actual,
        });
    }

    let revision = Revision::after(expected);
    let stored = StoredPackage { revision, package };
    let bytes = serde_json::to_vec_pretty(&stored).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    write_atomically(path, &bytes).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(package = %stored.package.name, %revision, path = %path.display(), "Package written");
    Ok(revision)
}

#[async_trait]
impl PackageStore for FileStore {
    async fn load(&self, name: &PackageName) -> Result<Option<Versioned<Package>>, StoreError> {
        let path = self.package_path(name);
        Ok(self
            .read(&path)
            .await?
            .map(|stored| Versioned::new(stored.revision, stored.package)))
    }

    async fn compare_and_swap(
        &self,
        expected: Option<Revision>,
        package: Package,
    ) -> Result<Revision, StoreError> {
        let _guard = self.write_lock.lock().await;

        let path = self.package_path(&package.name);
        let lock_path = self.lock_path(&package.name);
        let target = path.clone();

        tokio::task::spawn_blocking(move || swap_locked(&target, &lock_path, expected, package))
            .await
            .map_err(|e| StoreError::Io {
                path,
                source: std::io::Error::other(e),
            })?
    }

    async fn list(&self) -> Result<Vec<PackageName>, StoreError> {
        let dir = self.root.join(PACKAGES_DIR);
        let io_err = |source| StoreError::Io {
            path: dir.clone(),
            source,
        };

        let mut entries = tokio::fs::read_dir(&dir).await.map_err(io_err)?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stored) = self.read(&path).await? {
                names.push(stored.package.name);
            }
        }

        names.sort_by_cached_key(ToString::to_string);
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn koa() -> Package {
        let mut package = Package::new(PackageName::parse("@cnpm/koa").unwrap(), "publisher");
        package.record_version("1.0.0").unwrap();
        package
    }

    #[test]
    fn test_package_path_is_flat() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        let path = store.package_path(&PackageName::parse("@cnpm/koa").unwrap());
        assert_eq!(path, dir.path().join("packages").join("@cnpm%2fkoa.json"));
        assert!(dir.path().join("packages").is_dir());
    }

    #[tokio::test]
    async fn test_round_trip_preserves_tag_order() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        let mut package = koa();
        package.record_version("1.1.0").unwrap();
        package.tags.set("beta", "1.0.0");
        package.tags.set("alpha", "1.1.0");
        let revision = store.compare_and_swap(None, package).await.unwrap();

        let name = PackageName::parse("@cnpm/koa").unwrap();
        let loaded = store.load(&name).await.unwrap().unwrap();
        assert_eq!(loaded.revision, revision);

        let order: Vec<&str> = loaded.value.tags.iter().map(|(tag, _)| tag).collect();
        assert_eq!(order, vec!["latest", "beta", "alpha"]);
    }

    #[tokio::test]
    async fn test_missing_package_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let name = PackageName::parse("not-exists").unwrap();
        assert!(store.load(&name).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_write_is_refused() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        let first = store.compare_and_swap(None, koa()).await.unwrap();
        store.compare_and_swap(Some(first), koa()).await.unwrap();

        let err = store.compare_and_swap(Some(first), koa()).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));

        let err = store.compare_and_swap(None, koa()).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { expected: None, .. }));
    }

    #[tokio::test]
    async fn test_reopen_sees_committed_state() {
        let dir = TempDir::new().unwrap();
        {
            let store = FileStore::open(dir.path()).unwrap();
            store.compare_and_swap(None, koa()).await.unwrap();
        }

        let store = FileStore::open(dir.path()).unwrap();
        let names = store.list().await.unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(names[0].to_string(), "@cnpm/koa");
    }

    #[tokio::test]
    async fn test_corrupt_document_is_reported() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let name = PackageName::parse("koa").unwrap();
        std::fs::write(store.package_path(&name), b"{ not json").unwrap();

        let err = store.load(&name).await.unwrap_err();
        assert!(matches!(err, StoreError::Json { .. }));
    }

    #[tokio::test]
    async fn test_record_breaking_invariants_is_refused() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        let name = PackageName::parse("koa").unwrap();
        std::fs::write(
            store.package_path(&name),
            br#"{
                "revision": 1,
                "package": {
                    "name": "koa",
                    "dist-tags": { "latest": "9.9.9" },
                    "versions": ["1.0.0"],
                    "maintainers": ["publisher"]
                }
            }"#,
        )
        .unwrap();

        let err = store.load(&name).await.unwrap_err();
        assert!(matches!(err, StoreError::Invalid { .. }), "{err}");
    }

    #[tokio::test]
    async fn test_lock_file_is_not_listed() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.compare_and_swap(None, koa()).await.unwrap();

        let name = PackageName::parse("@cnpm/koa").unwrap();
        assert!(store.lock_path(&name).exists());
        assert_eq!(store.list().await.unwrap(), vec![name]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_stores_sharing_a_root_never_both_win() {
        let dir = TempDir::new().unwrap();
        let first = Arc::new(FileStore::open(dir.path()).unwrap());
        let second = Arc::new(FileStore::open(dir.path()).unwrap());
        let revision = first.compare_and_swap(None, koa()).await.unwrap();

        for round in 0..20 {
            let current = first.load(&koa().name).await.unwrap().unwrap().revision;
            let writes = [Arc::clone(&first), Arc::clone(&second)].map(|store| {
                tokio::spawn(async move { store.compare_and_swap(Some(current), koa()).await })
            });

            let mut wins = 0;
            for write in writes {
                match write.await.unwrap() {
                    Ok(_) => wins += 1,
                    Err(err) => assert!(matches!(err, StoreError::Conflict { .. }), "{err}"),
                }
            }
            assert_eq!(wins, 1, "round {round}");
        }

        let last = second.load(&koa().name).await.unwrap().unwrap().revision;
        assert_eq!(last.get(), revision.get() + 20);
    }
}
