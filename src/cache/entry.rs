//! Cache entry definitions.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Digest recorded for files fingerprinted while hashing was disabled.
pub const HASH_DISABLED: &str = "disabled";

/// Fingerprint record for one file of a directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheEntry {
    /// Base file name, unique within its directory
    pub name: String,
    /// File size in bytes when the hash was computed
    pub size: u64,
    /// Modification time when the hash was computed (microsecond resolution)
    pub mtime: DateTime<Utc>,
    /// Lowercase hex digest, or [`HASH_DISABLED`]
    pub hash: String,
    /// Seconds spent computing the hash
    pub hash_duration: f64,
    /// When the hash was computed
    pub hashed_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Whether this row was written while hashing was disabled.
    #[must_use]
    pub fn is_hash_disabled(&self) -> bool {
        self.hash == HASH_DISABLED
    }
}
