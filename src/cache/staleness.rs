//! Staleness decision for cached fingerprints.
//!
//! A cached hash is reused only when the row exists and both the size and
//! the modification time match the live file exactly. Modification times are
//! compared at microsecond resolution; callers pass live times through
//! [`crate::scanner::metadata::normalize_mtime`], the same function used when
//! rows are written.

use chrono::{DateTime, Utc};

use super::CacheEntry;

/// Why a file must (or need not) be rehashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    /// Rehash requested regardless of the cached row.
    Forced,
    /// No row exists for the file.
    Missing,
    /// The file size differs from the cached size.
    SizeChanged,
    /// The modification time differs from the cached mtime.
    MtimeChanged,
    /// The cached hash may be reused.
    Fresh,
}

impl Staleness {
    /// Whether the file must be rehashed.
    #[must_use]
    pub fn is_stale(self) -> bool {
        self != Self::Fresh
    }
}

impl std::fmt::Display for Staleness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            Self::Forced => "forced",
            Self::Missing => "not cached",
            Self::SizeChanged => "size changed",
            Self::MtimeChanged => "mtime changed",
            Self::Fresh => "fresh",
        };
        f.write_str(reason)
    }
}

/// Classify a file against its cached row.
#[must_use]
pub fn classify(
    entry: Option<&CacheEntry>,
    live_size: u64,
    live_mtime: DateTime<Utc>,
    force_rehash: bool,
) -> Staleness {
    if force_rehash {
        return Staleness::Forced;
    }
    match entry {
        None => Staleness::Missing,
        Some(entry) if entry.size != live_size => Staleness::SizeChanged,
        Some(entry) if entry.mtime != live_mtime => Staleness::MtimeChanged,
        Some(_) => Staleness::Fresh,
    }
}

/// Whether the file must be rehashed.
#[must_use]
pub fn is_stale(
    entry: Option<&CacheEntry>,
    live_size: u64,
    live_mtime: DateTime<Utc>,
    force_rehash: bool,
) -> bool {
    classify(entry, live_size, live_mtime, force_rehash).is_stale()
}
