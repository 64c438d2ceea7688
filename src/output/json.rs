//! JSON output formatter for a directory's cache.
//!
//! Provides machine-readable JSON output for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "directory": "/path/to/dir",
//!   "entries": [
//!     {
//!       "name": "a.txt",
//!       "size": 10,
//!       "mtime": "2024-01-02T03:04:05.123456Z",
//!       "hash": "a9993e364706816aba3e25717850c26c9cd0d89d",
//!       "hash_duration": 0.000012,
//!       "hashed_at": "2024-01-02T03:04:06.000001Z"
//!     }
//!   ]
//! }
//! ```

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::cache::store::format_timestamp;
use crate::cache::{CacheEntry, DirectoryCache};

/// A single cache row in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonEntry {
    /// Base file name
    pub name: String,
    /// File size in bytes
    pub size: u64,
    /// Modification time (RFC 3339)
    pub mtime: String,
    /// Hex digest, or the hashing-disabled sentinel
    pub hash: String,
    /// Seconds spent hashing
    pub hash_duration: f64,
    /// When the hash was computed (RFC 3339)
    pub hashed_at: String,
}

impl From<&CacheEntry> for JsonEntry {
    fn from(entry: &CacheEntry) -> Self {
        Self {
            name: entry.name.clone(),
            size: entry.size,
            mtime: format_timestamp(entry.mtime),
            hash: entry.hash.clone(),
            hash_duration: entry.hash_duration,
            hashed_at: format_timestamp(entry.hashed_at),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Directory the table belongs to
    pub directory: String,
    /// Rows in name order
    pub entries: Vec<JsonEntry>,
}

impl JsonOutput {
    /// Create a new JSON output for one directory's cache.
    #[must_use]
    pub fn new(directory: &Path, cache: &DirectoryCache) -> Self {
        Self {
            directory: directory.to_string_lossy().into_owned(),
            entries: cache.iter().map(JsonEntry::from).collect(),
        }
    }

    /// Serialize to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON output to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writeln!(writer, "{json}")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(Debug, thiserror::Error)]
pub enum JsonOutputError {
    /// JSON serialization failed.
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
