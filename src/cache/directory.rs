//! In-memory fingerprint table for a single directory.

use std::collections::BTreeMap;

use super::CacheEntry;

/// Fingerprint rows of one directory, keyed and ordered by file name.
///
/// Names are unique. A missing row means the file was never hashed or its
/// previous row was evicted as stale.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectoryCache {
    entries: BTreeMap<String, CacheEntry>,
}

impl DirectoryCache {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Row for `name`, if any.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&CacheEntry> {
        self.entries.get(name)
    }

    /// Insert `entry`, replacing any row with the same name.
    ///
    /// Returns the replaced row.
    pub fn upsert(&mut self, entry: CacheEntry) -> Option<CacheEntry> {
        self.entries.insert(entry.name.clone(), entry)
    }

    /// Remove the row for `name`.
    pub fn remove(&mut self, name: &str) -> Option<CacheEntry> {
        self.entries.remove(name)
    }

    /// Keep only rows whose name satisfies `keep`; returns how many were dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|name, _| keep(name));
        before - self.entries.len()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows in name order.
    pub fn iter(&self) -> impl Iterator<Item = &CacheEntry> {
        self.entries.values()
    }
}

impl FromIterator<CacheEntry> for DirectoryCache {
    fn from_iter<I: IntoIterator<Item = CacheEntry>>(iter: I) -> Self {
        let mut cache = Self::new();
        for entry in iter {
            cache.upsert(entry);
        }
        cache
    }
}
