//! Per-directory fingerprint cache.
//!
//! Each scanned directory carries its own table of fingerprint rows, keyed
//! by base file name, so unchanged files are never re-hashed.
//!
//! # Architecture
//!
//! * [`entry`]: The row model ([`CacheEntry`]) and the hashing-disabled sentinel.
//! * [`directory`]: The in-memory table of one directory ([`DirectoryCache`]).
//! * [`store`]: CSV persistence, corruption recovery and atomic rewrites.
//! * [`staleness`]: The decision whether a cached hash may be reused.
//!
//! # Cache Invalidation
//!
//! A row is reused only when the live file has the same size and the same
//! modification time (microsecond resolution) as the row. Anything else,
//! including a forced rescan, evicts the row and the file is hashed again.

pub mod directory;
pub mod entry;
pub mod staleness;
pub mod store;

pub use directory::DirectoryCache;
pub use entry::{CacheEntry, HASH_DISABLED};
pub use staleness::{classify, is_stale, Staleness};
pub use store::{
    cache_path, is_reserved_name, CacheError, CacheResult, DecodeError, LoadOutcome,
    CACHE_FILE_NAME,
};
