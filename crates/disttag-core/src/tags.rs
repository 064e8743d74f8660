//! Dist-tag maps.
//!
//! A [`TagMap`] associates tag names with version strings and iterates in
//! insertion order, so serialized responses list `latest` first for packages
//! whose first tag was `latest`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The tag every published package carries.
pub const LATEST_TAG: &str = "latest";

/// Outcome of [`TagMap::set`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum TagChange {
    /// The tag did not exist before.
    Created,
    /// The tag pointed at another version.
    Updated {
        /// Version the tag pointed at before.
        previous: String,
    },
    /// The tag already pointed at the requested version.
    Unchanged,
}

impl TagChange {
    /// Returns true if the map was modified.
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Insertion-ordered mapping of tag name to version.
///
/// # Examples
///
/// ```
/// use disttag_core::{TagChange, TagMap};
///
/// let mut tags = TagMap::new();
/// assert_eq!(tags.set("latest", "1.0.0"), TagChange::Created);
/// tags.set("beta", "1.1.0-beta.1");
/// tags.set("latest", "1.1.0");
///
/// let snapshot = tags.snapshot();
/// assert_eq!(snapshot[0], ("latest".to_string(), "1.1.0".to_string()));
/// assert_eq!(snapshot[1].0, "beta");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagMap {
    entries: IndexMap<String, String>,
}

impl TagMap {
    /// Creates an empty tag map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the version a tag points at.
    #[must_use]
    pub fn get(&self, tag: &str) -> Option<&str> {
        self.entries.get(tag).map(String::as_str)
    }

    /// Returns true if the tag exists.
    #[must_use]
    pub fn contains(&self, tag: &str) -> bool {
        self.entries.contains_key(tag)
    }

    /// Points `tag` at `version`.
    ///
    /// Overwriting keeps the tag at its original position.
    pub fn set(&mut self, tag: impl Into<String>, version: impl Into<String>) -> TagChange {
        let version = version.into();
        match self.entries.entry(tag.into()) {
            indexmap::map::Entry::Occupied(mut entry) => {
                if *entry.get() == version {
                    TagChange::Unchanged
                } else {
                    let previous = entry.insert(version);
                    TagChange::Updated { previous }
                }
            }
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(version);
                TagChange::Created
            }
        }
    }

    /// Deletes a tag, returning whether it existed.
    pub fn delete(&mut self, tag: &str) -> bool {
        self.entries.shift_remove(tag).is_some()
    }

    /// Returns the entries in insertion order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(tag, version)| (tag.clone(), version.clone()))
            .collect()
    }

    /// Iterates over `(tag, version)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(t, v)| (t.as_str(), v.as_str()))
    }

    /// Returns the number of tags.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Into<String>, V: Into<String>> FromIterator<(T, V)> for TagMap {
    fn from_iter<I: IntoIterator<Item = (T, V)>>(iter: I) -> Self {
        let mut tags = Self::new();
        for (tag, version) in iter {
            tags.set(tag, version);
        }
        tags
    }
}
