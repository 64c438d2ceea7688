//! End-of-scan summary.
//!
//! Printed to stderr after `scan`, unless `--quiet` is set:
//!
//! ```text
//! Scan completed in 1.42s
//! Hashed 30 B in 0.00s (NA)
//! Files: 2 hashed, 0 reused, 0 pruned in 1 directories
//! ```

use std::io::{self, Write};

use bytesize::ByteSize;

use crate::fingerprint::ScanReport;

const MIB: f64 = 1024.0 * 1024.0;

/// Human-readable summary of a finished scan.
pub struct SummaryOutput<'a> {
    report: &'a ScanReport,
}

impl<'a> SummaryOutput<'a> {
    /// Create a summary for the given report.
    #[must_use]
    pub fn new(report: &'a ScanReport) -> Self {
        Self { report }
    }

    /// Hashing speed in MiB/s, or `NA` when no hashing time elapsed.
    #[must_use]
    pub fn throughput(&self) -> String {
        self.report
            .totals
            .throughput()
            .map_or_else(|| "NA".to_string(), |bps| format!("{:.2} MiB/s", bps / MIB))
    }

    /// Write the summary to the given writer.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let totals = &self.report.totals;

        if self.report.interrupted {
            writeln!(
                writer,
                "Scan interrupted after {:.2}s",
                self.report.elapsed.as_secs_f64()
            )?;
        } else {
            writeln!(
                writer,
                "Scan completed in {:.2}s",
                self.report.elapsed.as_secs_f64()
            )?;
        }
        writeln!(
            writer,
            "Hashed {} in {:.2}s ({})",
            ByteSize(totals.bytes_hashed),
            totals.hash_seconds,
            self.throughput()
        )?;
        writeln!(
            writer,
            "Files: {} hashed, {} reused, {} pruned in {} directories",
            totals.files_hashed, totals.files_reused, totals.files_pruned, totals.directories
        )?;
        if !self.report.errors.is_empty() {
            writeln!(writer, "Errors: {} (see log)", self.report.errors.len())?;
        }
        Ok(())
    }
}
