//! Scan accumulators and the final report.

use std::time::Duration;

use super::FingerprintError;

/// Counters accumulated while fingerprinting.
///
/// Created at zero by the caller, folded per directory by the orchestrator
/// and read once at the end to compute throughput.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanTotals {
    /// Bytes of every file that was hashed
    pub bytes_hashed: u64,
    /// Cumulative seconds spent hashing
    pub hash_seconds: f64,
    /// Directories processed
    pub directories: usize,
    /// Files listed
    pub files_seen: usize,
    /// Files hashed because they were stale
    pub files_hashed: usize,
    /// Files whose cached hash was reused
    pub files_reused: usize,
    /// Rows dropped because their file no longer exists
    pub files_pruned: usize,
}

impl ScanTotals {
    /// Account for one hashed file.
    pub fn record_hash(&mut self, bytes: u64, seconds: f64) {
        self.bytes_hashed += bytes;
        self.hash_seconds += seconds;
        self.files_hashed += 1;
    }

    /// Fold another set of totals into this one.
    pub fn merge(&mut self, other: &ScanTotals) {
        self.bytes_hashed += other.bytes_hashed;
        self.hash_seconds += other.hash_seconds;
        self.directories += other.directories;
        self.files_seen += other.files_seen;
        self.files_hashed += other.files_hashed;
        self.files_reused += other.files_reused;
        self.files_pruned += other.files_pruned;
    }

    /// Hashing throughput in bytes per second.
    ///
    /// `None` when no hashing time was spent.
    #[must_use]
    pub fn throughput(&self) -> Option<f64> {
        if self.hash_seconds > 0.0 {
            Some(self.bytes_hashed as f64 / self.hash_seconds)
        } else {
            None
        }
    }
}

/// Outcome of a complete scan.
#[derive(Debug, Default)]
pub struct ScanReport {
    /// Accumulated counters
    pub totals: ScanTotals,
    /// Wall-clock duration of the scan
    pub elapsed: Duration,
    /// Per-file or per-directory errors recorded under the `continue` policy
    pub errors: Vec<FingerprintError>,
    /// Whether the scan stopped early on a shutdown request
    pub interrupted: bool,
}

impl ScanReport {
    /// Whether every listed file was fingerprinted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty() && !self.interrupted
    }
}
