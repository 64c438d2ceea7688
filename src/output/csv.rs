//! CSV output formatter for a directory's cache.
//!
//! Emits exactly the layout of the on-disk cache file, so the output of
//! `show --output csv` can be diffed against or copied over a cache.
//!
//! # Columns
//!
//! - `name`: Base file name
//! - `size`: File size in bytes
//! - `mtime`: Modification time (RFC 3339, microseconds, UTC)
//! - `hash`: Hex digest, or `disabled`
//! - `hash_duration`: Seconds spent hashing
//! - `hashed_at`: When the hash was computed (RFC 3339, microseconds, UTC)

use std::io;

use thiserror::Error;

use crate::cache::{store, DirectoryCache};

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    cache: &'a DirectoryCache,
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV output formatter.
    #[must_use]
    pub fn new(cache: &'a DirectoryCache) -> Self {
        Self { cache }
    }

    /// Write the CSV output to the given writer.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        store::write_table(writer, self.cache)?;
        Ok(())
    }

    /// Generate CSV output as a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}
