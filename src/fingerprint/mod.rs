//! Incremental fingerprinting of a directory tree.
//!
//! This module provides:
//! - The scan orchestrator ([`Fingerprinter`]) driving the per-directory
//!   load, decide, hash, update and save cycle
//! - Scan accumulators ([`ScanTotals`]) and the final [`ScanReport`]
//! - The error policy applied to per-file failures

pub mod orchestrator;
pub mod totals;

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cache::CacheError;
use crate::scanner::{HashError, ScanError};

pub use orchestrator::{FingerprintConfig, Fingerprinter};
pub use totals::{ScanReport, ScanTotals};

/// What to do when a single file or directory cannot be fingerprinted.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Abort the whole scan on the first failure.
    #[default]
    FailFast,
    /// Record the failure, leave the file uncached and keep going.
    Continue,
}

/// Errors that can occur while fingerprinting.
#[derive(thiserror::Error, Debug)]
pub enum FingerprintError {
    /// The scan root does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The scan root is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A directory could not be listed.
    #[error("Cannot list directory: {0}")]
    Walk(#[from] ScanError),

    /// A listed file has a name that cannot be stored in the cache.
    #[error("File name is not valid UTF-8: {}", .path.display())]
    InvalidFileName {
        /// Directory containing the file
        directory: PathBuf,
        /// Full path of the file
        path: PathBuf,
    },

    /// A listed file could not be stat'ed.
    #[error("Failed to read metadata of {name} in {directory}: {source}")]
    Metadata {
        /// Directory containing the file
        directory: PathBuf,
        /// File name
        name: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A listed file could not be hashed.
    #[error("Failed to hash {name} in {directory}: {source}")]
    Hash {
        /// Directory containing the file
        directory: PathBuf,
        /// File name
        name: String,
        /// The underlying hashing error
        #[source]
        source: HashError,
    },

    /// A directory's cache could not be saved. Always fatal.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl FingerprintError {
    /// Directory the failure belongs to, when known.
    #[must_use]
    pub fn directory(&self) -> Option<&Path> {
        match self {
            Self::InvalidFileName { directory, .. }
            | Self::Metadata { directory, .. }
            | Self::Hash { directory, .. } => Some(directory.as_path()),
            Self::Walk(e) => Some(e.path()),
            Self::PathNotFound(_) | Self::NotADirectory(_) | Self::Cache(_) => None,
        }
    }

    /// File name the failure belongs to, when it concerns a single file.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        match self {
            Self::Metadata { name, .. } | Self::Hash { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    /// Whether the error policy may absorb this failure.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Walk(_)
                | Self::InvalidFileName { .. }
                | Self::Metadata { .. }
                | Self::Hash { .. }
        )
    }
}
