//! Live file metadata at the resolution stored in the cache.
//!
//! Modification times are truncated toward the past to whole microseconds.
//! The same truncation is applied before a value is written to a cache row
//! and before it is compared against one, so a file whose mtime has not
//! moved always compares equal to its cached record.

use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, SubsecRound, Utc};

/// Number of fractional-second digits kept for modification times.
pub const MTIME_PRECISION_DIGITS: u16 = 6;

/// Size and modification time of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileMetadata {
    /// File size in bytes
    pub size: u64,
    /// Last modification time, truncated to microseconds
    pub mtime: DateTime<Utc>,
}

/// Read the size and modification time of `path`, following symlinks.
///
/// # Errors
///
/// Returns the underlying I/O error if the file cannot be stat'ed.
pub fn read_metadata(path: &Path) -> io::Result<FileMetadata> {
    let metadata = fs::metadata(path)?;
    let modified = metadata.modified()?;
    Ok(FileMetadata {
        size: metadata.len(),
        mtime: normalize_mtime(modified),
    })
}

/// Convert a filesystem timestamp to the cache's stored resolution.
#[must_use]
pub fn normalize_mtime(time: SystemTime) -> DateTime<Utc> {
    truncate_timestamp(DateTime::<Utc>::from(time))
}

/// Truncate a timestamp to the cache's stored resolution.
#[must_use]
pub fn truncate_timestamp(time: DateTime<Utc>) -> DateTime<Utc> {
    time.trunc_subsecs(MTIME_PRECISION_DIGITS)
}
