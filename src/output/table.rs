//! Aligned text rendering of a directory's cache table.
//!
//! Used by `scan --print-tables` and `show --output table`. Timestamps are
//! shown in UTC as `%Y/%m/%d %H:%M:%S`.

use std::io::{self, Write};
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::cache::DirectoryCache;

const HEADERS: [&str; 6] = ["NAME", "SIZE", "MTIME", "HASH", "DURATION", "HASHED AT"];

/// Human-readable table of one directory's cache.
pub struct TableOutput<'a> {
    directory: &'a Path,
    cache: &'a DirectoryCache,
}

impl<'a> TableOutput<'a> {
    /// Create a table renderer.
    #[must_use]
    pub fn new(directory: &'a Path, cache: &'a DirectoryCache) -> Self {
        Self { directory, cache }
    }

    fn rows(&self) -> Vec<[String; 6]> {
        self.cache
            .iter()
            .map(|entry| {
                [
                    entry.name.clone(),
                    entry.size.to_string(),
                    format_time(entry.mtime),
                    entry.hash.clone(),
                    format!("{:.6}", entry.hash_duration),
                    format_time(entry.hashed_at),
                ]
            })
            .collect()
    }

    /// Write the table to the given writer.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let rows = self.rows();
        writeln!(
            writer,
            "{} ({} entries)",
            self.directory.display(),
            rows.len()
        )?;
        if rows.is_empty() {
            return Ok(());
        }

        let mut widths = HEADERS.map(str::len);
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        write_row(writer, &HEADERS.map(String::from), &widths)?;
        for row in &rows {
            write_row(writer, row, &widths)?;
        }
        Ok(())
    }

    /// Render the table to a string.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if rendering fails.
    pub fn to_string(&self) -> io::Result<String> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn write_row<W: Write>(writer: &mut W, cells: &[String; 6], widths: &[usize; 6]) -> io::Result<()> {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(writer, "{}", line.trim_end())
}

fn format_time(time: DateTime<Utc>) -> String {
    time.format("%Y/%m/%d %H:%M:%S").to_string()
}
