//! On-disk persistence of per-directory fingerprint tables.
//!
//! Each scanned directory holds one [`CACHE_FILE_NAME`] file: a CSV table
//! with a header row and the columns listed in [`COLUMNS`]. Columns are
//! located by header name, so reordered or additional columns still load.
//! A row with a missing or unparseable value is skipped on its own; only a
//! table without a `name` column, or one the CSV reader rejects, is treated
//! as corrupt.
//!
//! Saving always rewrites the whole table through a temporary file that is
//! renamed over the previous one.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use csv::StringRecord;
use serde::Serialize;
use thiserror::Error;

use super::{CacheEntry, DirectoryCache};
use crate::scanner::metadata::truncate_timestamp;

/// Reserved name of the cache file inside every scanned directory.
pub const CACHE_FILE_NAME: &str = ".hashkeep.csv";

/// Suffix of the temporary file written before the atomic rename.
pub const TEMP_FILE_SUFFIX: &str = ".tmp";

/// Column names, in the order they are written.
pub const COLUMNS: [&str; 6] = ["name", "size", "mtime", "hash", "hash_duration", "hashed_at"];

/// Errors raised while persisting a cache table.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache file could not be created, written, synced or renamed.
    #[error("Failed to write cache {path}: {source}")]
    Write {
        /// Cache file path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// A row could not be encoded.
    #[error("Failed to encode cache {path}: {source}")]
    Encode {
        /// Cache file path
        path: PathBuf,
        /// The underlying CSV error
        #[source]
        source: csv::Error,
    },
}

/// Result type for cache persistence.
pub type CacheResult<T> = Result<T, CacheError>;

/// Reasons a cache table could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The CSV reader rejected the table.
    #[error("malformed table: {0}")]
    Csv(#[from] csv::Error),

    /// A column without which no row can be keyed.
    #[error("no `{0}` column")]
    MissingColumn(&'static str),
}

/// How a cache table was obtained by [`load`].
///
/// Every outcome other than `Loaded` yields an empty table.
#[derive(Debug)]
pub enum LoadOutcome {
    /// No cache file exists yet.
    Missing,
    /// The table was decoded.
    Loaded {
        /// Rows kept
        rows: usize,
        /// Rows dropped because a value was missing or unparseable
        skipped: usize,
    },
    /// The file exists but is not a cache table.
    Corrupt(DecodeError),
    /// The file exists but could not be read.
    Unreadable(io::Error),
}

impl LoadOutcome {
    /// Whether the on-disk table matched the returned one exactly.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Loaded { skipped: 0, .. })
    }
}

/// A decoded table plus the number of rows that had to be dropped.
#[derive(Debug, Default)]
pub struct DecodedTable {
    /// The decoded rows
    pub cache: DirectoryCache,
    /// Rows dropped because a value was missing or unparseable
    pub skipped: usize,
}

/// Path of the cache file for `dir`.
#[must_use]
pub fn cache_path(dir: &Path) -> PathBuf {
    dir.join(CACHE_FILE_NAME)
}

fn temp_path(dir: &Path) -> PathBuf {
    dir.join(format!("{CACHE_FILE_NAME}{TEMP_FILE_SUFFIX}"))
}

/// Whether `name` is the cache file or its temporary sibling.
#[must_use]
pub fn is_reserved_name(name: &str) -> bool {
    match name.strip_prefix(CACHE_FILE_NAME) {
        Some(rest) => rest.is_empty() || rest == TEMP_FILE_SUFFIX,
        None => false,
    }
}

/// Load the cache table of `dir`.
///
/// Never fails: an absent, unreadable or corrupt file yields an empty table,
/// and the returned [`LoadOutcome`] says which case applied.
pub fn load(dir: &Path) -> (DirectoryCache, LoadOutcome) {
    let path = cache_path(dir);

    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::trace!("No cache in {}", dir.display());
            return (DirectoryCache::new(), LoadOutcome::Missing);
        }
        Err(e) => {
            log::warn!("Cannot read cache {}, starting empty: {}", path.display(), e);
            return (DirectoryCache::new(), LoadOutcome::Unreadable(e));
        }
    };

    match read_table(bytes.as_slice()) {
        Ok(DecodedTable { cache, skipped }) => {
            if skipped > 0 {
                log::warn!(
                    "Dropped {} unreadable rows from cache {}",
                    skipped,
                    path.display()
                );
            }
            log::debug!("Loaded {} cached rows from {}", cache.len(), path.display());
            let rows = cache.len();
            (cache, LoadOutcome::Loaded { rows, skipped })
        }
        Err(e) => {
            log::warn!("Discarding corrupt cache {}: {}", path.display(), e);
            (DirectoryCache::new(), LoadOutcome::Corrupt(e))
        }
    }
}

/// Persist the full table of `dir`, replacing any previous cache file.
///
/// # Errors
///
/// Returns [`CacheError`] if the table cannot be written; the previous cache
/// file, if any, is left in place.
pub fn save(dir: &Path, cache: &DirectoryCache) -> CacheResult<()> {
    let path = cache_path(dir);
    let tmp = temp_path(dir);

    let result = write_replacing(&tmp, &path, cache);
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    } else {
        log::debug!("Saved {} rows to {}", cache.len(), path.display());
    }
    result
}

fn write_replacing(tmp: &Path, path: &Path, cache: &DirectoryCache) -> CacheResult<()> {
    let write_error = |source: io::Error| CacheError::Write {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(tmp).map_err(write_error)?;
    let mut writer = BufWriter::new(file);
    write_table(&mut writer, cache).map_err(|source| CacheError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    let file = writer
        .into_inner()
        .map_err(|e| write_error(e.into_error()))?;
    file.sync_all().map_err(write_error)?;
    fs::rename(tmp, path).map_err(write_error)
}

/// One serialized row; column order follows [`COLUMNS`].
#[derive(Debug, Serialize)]
struct CacheRow<'a> {
    name: &'a str,
    size: u64,
    mtime: String,
    hash: &'a str,
    hash_duration: f64,
    hashed_at: String,
}

impl<'a> From<&'a CacheEntry> for CacheRow<'a> {
    fn from(entry: &'a CacheEntry) -> Self {
        Self {
            name: &entry.name,
            size: entry.size,
            mtime: format_timestamp(entry.mtime),
            hash: &entry.hash,
            hash_duration: entry.hash_duration,
            hashed_at: format_timestamp(entry.hashed_at),
        }
    }
}

/// Write `cache` as a CSV table, header first, rows in name order.
///
/// # Errors
///
/// Returns the CSV error if a row cannot be written.
pub fn write_table<W: Write>(writer: W, cache: &DirectoryCache) -> Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(COLUMNS)?;
    for entry in cache.iter() {
        csv_writer.serialize(CacheRow::from(entry))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Decode a CSV cache table.
///
/// # Errors
///
/// Returns [`DecodeError`] if the header has no `name` column or the CSV
/// reader fails for a reason other than a single badly encoded row.
pub fn read_table<R: Read>(reader: R) -> Result<DecodedTable, DecodeError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut table = DecodedTable::default();
    for record in csv_reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) if matches!(e.kind(), csv::ErrorKind::Utf8 { .. }) => {
                table.skipped += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        match columns.parse(&record) {
            Some(entry) => {
                table.cache.upsert(entry);
            }
            None => table.skipped += 1,
        }
    }
    Ok(table)
}

/// Format a timestamp as stored in the table.
#[must_use]
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|time| truncate_timestamp(time.with_timezone(&Utc)))
}

/// Positions of the known columns within a header row.
struct ColumnMap {
    name: usize,
    size: Option<usize>,
    mtime: Option<usize>,
    hash: Option<usize>,
    hash_duration: Option<usize>,
    hashed_at: Option<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> Result<Self, DecodeError> {
        let find = |column: &str| headers.iter().position(|h| h.trim() == column);
        Ok(Self {
            name: find("name").ok_or(DecodeError::MissingColumn("name"))?,
            size: find("size"),
            mtime: find("mtime"),
            hash: find("hash"),
            hash_duration: find("hash_duration"),
            hashed_at: find("hashed_at"),
        })
    }

    /// Build an entry, or `None` if any value is missing or invalid.
    fn parse(&self, record: &StringRecord) -> Option<CacheEntry> {
        let field = |index: Option<usize>| index.and_then(|i| record.get(i));

        let name = record.get(self.name).filter(|n| !n.is_empty())?;
        let size = field(self.size)?.trim().parse::<u64>().ok()?;
        let mtime = parse_timestamp(field(self.mtime)?)?;
        let hash = field(self.hash).filter(|h| !h.is_empty())?;
        let hash_duration = field(self.hash_duration)?
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite() && *d >= 0.0)?;
        let hashed_at = parse_timestamp(field(self.hashed_at)?)?;

        Some(CacheEntry {
            name: name.to_string(),
            size,
            mtime,
            hash: hash.to_string(),
            hash_duration,
            hashed_at,
        })
    }
}
