//! Scan orchestrator.
//!
//! # Overview
//!
//! For every directory listing, in traversal order, the [`Fingerprinter`]:
//! 1. **Loads** the directory's cache table
//! 2. **Classifies** each listed file against its row (size and mtime)
//! 3. **Hashes** the stale files on a bounded thread pool
//! 4. **Merges** the new rows into the table in listing order
//! 5. **Saves** the table when anything changed
//!
//! Fresh files cost one `stat` and nothing else. Directories are processed
//! one at a time; a shutdown request is honoured between directories.
//!
//! # Example
//!
//! ```no_run
//! use hashkeep::fingerprint::{FingerprintConfig, Fingerprinter};
//! use std::path::Path;
//!
//! let fingerprinter = Fingerprinter::new(FingerprintConfig::default().with_io_threads(2));
//! let report = fingerprinter.scan(Path::new("/some/path")).unwrap();
//!
//! println!("Hashed {} bytes", report.totals.bytes_hashed);
//! ```

use std::collections::HashSet;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rayon::prelude::*;

use super::{ErrorPolicy, FingerprintError, ScanReport, ScanTotals};
use crate::cache::{classify, store, CacheEntry};
use crate::output::table::TableOutput;
use crate::progress::ProgressCallback;
use crate::scanner::metadata::{read_metadata, truncate_timestamp, FileMetadata};
use crate::scanner::{
    DirectoryListing, FileHash, HashAlgorithm, HashError, Hasher, ScanError, Walker,
    WalkerConfig,
};

/// Configuration for a fingerprinting scan.
#[derive(Clone)]
pub struct FingerprintConfig {
    /// Read file contents; when false, rows get the hashing-disabled sentinel.
    pub hash_enabled: bool,
    /// Digest algorithm.
    pub algorithm: HashAlgorithm,
    /// Rehash every file regardless of its cached row.
    pub force_rehash: bool,
    /// Print each directory's table after it is processed.
    pub print_tables: bool,
    /// Number of threads hashing the stale files of one directory.
    pub io_threads: usize,
    /// What to do with per-file and per-directory failures.
    pub error_policy: ErrorPolicy,
    /// Drop rows of files that no longer exist.
    pub prune_missing: bool,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
    /// Optional progress callback for reporting.
    pub progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for FingerprintConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FingerprintConfig")
            .field("hash_enabled", &self.hash_enabled)
            .field("algorithm", &self.algorithm)
            .field("force_rehash", &self.force_rehash)
            .field("print_tables", &self.print_tables)
            .field("io_threads", &self.io_threads)
            .field("error_policy", &self.error_policy)
            .field("prune_missing", &self.prune_missing)
            .field("walker_config", &self.walker_config)
            .field("shutdown_flag", &self.shutdown_flag)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<callback>"),
            )
            .finish()
    }
}

impl Default for FingerprintConfig {
    fn default() -> Self {
        Self {
            hash_enabled: true,
            algorithm: HashAlgorithm::default(),
            force_rehash: false,
            print_tables: false,
            io_threads: 4,
            error_policy: ErrorPolicy::default(),
            prune_missing: true,
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
            progress_callback: None,
        }
    }
}

impl FingerprintConfig {
    /// Enable or disable content hashing.
    #[must_use]
    pub fn with_hash_enabled(mut self, enabled: bool) -> Self {
        self.hash_enabled = enabled;
        self
    }

    /// Set the digest algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Rehash every file on every run.
    #[must_use]
    pub fn with_force_rehash(mut self, force: bool) -> Self {
        self.force_rehash = force;
        self
    }

    /// Print each directory's table after processing it.
    #[must_use]
    pub fn with_print_tables(mut self, print: bool) -> Self {
        self.print_tables = print;
        self
    }

    /// Set the number of hashing threads (minimum 1).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the error policy.
    #[must_use]
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Drop rows of files that no longer exist.
    #[must_use]
    pub fn with_prune_missing(mut self, prune: bool) -> Self {
        self.prune_missing = prune;
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set the progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }
}

/// A stale file waiting to be hashed.
struct PendingFile<'a> {
    name: &'a str,
    metadata: FileMetadata,
}

/// A stale file after hashing.
struct HashedFile<'a> {
    name: &'a str,
    metadata: FileMetadata,
    result: Result<FileHash, HashError>,
    hashed_at: DateTime<Utc>,
}

/// Orchestrates incremental fingerprinting of a directory tree.
pub struct Fingerprinter {
    config: FingerprintConfig,
    hasher: Hasher,
    pool: Option<rayon::ThreadPool>,
}

impl Fingerprinter {
    /// Create a new fingerprinter with the given configuration.
    #[must_use]
    pub fn new(config: FingerprintConfig) -> Self {
        let hasher = Hasher::new(config.algorithm).with_enabled(config.hash_enabled);

        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(config.io_threads.max(1))
            .build()
        {
            Ok(pool) => Some(pool),
            Err(e) => {
                log::warn!(
                    "Failed to create hashing thread pool, using global pool with {} threads: {}",
                    rayon::current_num_threads(),
                    e
                );
                None
            }
        };

        Self {
            config,
            hasher,
            pool,
        }
    }

    /// Create a new fingerprinter with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FingerprintConfig::default())
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &FingerprintConfig {
        &self.config
    }

    /// Fingerprint every file under `root`.
    ///
    /// # Errors
    ///
    /// Returns [`FingerprintError`] if `root` is not an existing directory,
    /// if a cache cannot be saved, or on the first per-file failure under
    /// [`ErrorPolicy::FailFast`]. Caches saved before the failure are kept.
    pub fn scan(&self, root: &Path) -> Result<ScanReport, FingerprintError> {
        if !root.exists() {
            return Err(FingerprintError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(FingerprintError::NotADirectory(root.to_path_buf()));
        }

        let mut walker = Walker::new(root, self.config.walker_config.clone());
        if let Some(ref flag) = self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        log::info!("Listing directories under {}", root.display());
        let listings: Vec<_> = walker.walk().collect();
        log::info!("Found {} directories", listings.len());

        self.scan_listings(listings)
    }

    /// Fingerprint an ordered sequence of directory listings.
    ///
    /// The sequence may be materialized or produced lazily.
    ///
    /// # Errors
    ///
    /// Same as [`Self::scan`].
    pub fn scan_listings<I>(&self, listings: I) -> Result<ScanReport, FingerprintError>
    where
        I: IntoIterator<Item = Result<DirectoryListing, ScanError>>,
    {
        let start = Instant::now();
        let listings = listings.into_iter();
        let mut report = ScanReport::default();

        if let Some(ref callback) = self.config.progress_callback {
            let (lower, upper) = listings.size_hint();
            callback.on_scan_start(upper.unwrap_or(lower));
        }

        let result = self.process_listings(listings, &mut report);

        if let Some(ref callback) = self.config.progress_callback {
            callback.on_scan_end();
        }
        result?;

        if self.config.is_shutdown_requested() {
            report.interrupted = true;
        }
        report.elapsed = start.elapsed();

        log::info!(
            "Scan complete: {} directories, {} files hashed, {} reused, {} errors",
            report.totals.directories,
            report.totals.files_hashed,
            report.totals.files_reused,
            report.errors.len()
        );

        Ok(report)
    }

    fn process_listings(
        &self,
        listings: impl Iterator<Item = Result<DirectoryListing, ScanError>>,
        report: &mut ScanReport,
    ) -> Result<(), FingerprintError> {
        for (index, listing) in listings.enumerate() {
            if self.config.is_shutdown_requested() {
                log::info!("Shutdown requested, stopping before the next directory");
                report.interrupted = true;
                break;
            }

            match listing {
                Ok(listing) => {
                    if let Some(ref callback) = self.config.progress_callback {
                        callback.on_directory(index + 1, &listing.path);
                    }
                    self.scan_directory(&listing, report)?;
                }
                Err(e) => self.handle_failure(FingerprintError::Walk(e), report)?,
            }
        }
        Ok(())
    }

    /// Fingerprint the files of one directory and save its cache.
    ///
    /// Totals and recorded errors are folded into `report`.
    ///
    /// # Errors
    ///
    /// Returns [`FingerprintError`] if the cache cannot be saved, or for a
    /// per-file failure under [`ErrorPolicy::FailFast`]. In the latter case
    /// the directory's cache file is left untouched.
    pub fn scan_directory(
        &self,
        listing: &DirectoryListing,
        report: &mut ScanReport,
    ) -> Result<(), FingerprintError> {
        let dir = listing.path.as_path();
        log::debug!("Scanning {}", dir.display());

        for path in &listing.invalid_names {
            let err = FingerprintError::InvalidFileName {
                directory: dir.to_path_buf(),
                path: path.clone(),
            };
            self.handle_failure(err, report)?;
        }

        let (mut cache, outcome) = store::load(dir);
        let mut dirty = !outcome.is_clean();
        let mut totals = ScanTotals {
            directories: 1,
            files_seen: listing.files.len(),
            ..Default::default()
        };

        // Decide which files need hashing; stale rows are evicted up front.
        let mut pending = Vec::new();
        for name in &listing.files {
            let metadata = match read_metadata(&dir.join(name)) {
                Ok(metadata) => metadata,
                Err(source) => {
                    self.handle_failure(self.metadata_error(dir, name, source), report)?;
                    dirty |= cache.remove(name).is_some();
                    continue;
                }
            };

            let entry = cache.get(name);
            let upgrade_sentinel =
                self.hasher.is_enabled() && entry.is_some_and(CacheEntry::is_hash_disabled);
            let staleness = classify(
                entry,
                metadata.size,
                metadata.mtime,
                self.config.force_rehash || upgrade_sentinel,
            );

            if staleness.is_stale() {
                log::trace!("{} in {}: {}", name, dir.display(), staleness);
                dirty |= cache.remove(name).is_some();
                pending.push(PendingFile { name, metadata });
            } else {
                totals.files_reused += 1;
            }
        }

        // Hash stale files in parallel, then apply results in listing order.
        for hashed in self.hash_pending(dir, pending) {
            match hashed.result {
                Ok(file_hash) => {
                    let seconds = file_hash.elapsed_secs();
                    cache.upsert(CacheEntry {
                        name: hashed.name.to_string(),
                        size: hashed.metadata.size,
                        mtime: hashed.metadata.mtime,
                        hash: file_hash.digest,
                        hash_duration: seconds,
                        hashed_at: hashed.hashed_at,
                    });
                    totals.record_hash(hashed.metadata.size, seconds);
                    dirty = true;
                }
                Err(source) => {
                    let err = FingerprintError::Hash {
                        directory: dir.to_path_buf(),
                        name: hashed.name.to_string(),
                        source,
                    };
                    self.handle_failure(err, report)?;
                }
            }
        }

        if self.config.prune_missing {
            let present: HashSet<&str> = listing.files.iter().map(String::as_str).collect();
            let pruned = cache.retain(|name| present.contains(name));
            if pruned > 0 {
                log::debug!("Pruned {} vanished files from {}", pruned, dir.display());
                totals.files_pruned = pruned;
                dirty = true;
            }
        }

        if dirty {
            store::save(dir, &cache)?;
        } else {
            log::trace!("Cache for {} unchanged", dir.display());
        }

        if self.config.print_tables {
            let mut stdout = io::stdout().lock();
            if let Err(e) = TableOutput::new(dir, &cache).write_to(&mut stdout) {
                log::warn!("Failed to print cache table for {}: {}", dir.display(), e);
            }
        }

        report.totals.merge(&totals);
        Ok(())
    }

    fn hash_pending<'a>(&self, dir: &Path, pending: Vec<PendingFile<'a>>) -> Vec<HashedFile<'a>> {
        if pending.is_empty() {
            return Vec::new();
        }
        log::debug!("Hashing {} files in {}", pending.len(), dir.display());

        self.install(|| {
            pending
                .into_par_iter()
                .map(|file| {
                    let result = self.hasher.hash(&dir.join(file.name));
                    if result.is_ok() {
                        if let Some(ref callback) = self.config.progress_callback {
                            callback.on_file_hashed(file.metadata.size);
                        }
                    }
                    HashedFile {
                        name: file.name,
                        metadata: file.metadata,
                        result,
                        hashed_at: truncate_timestamp(Utc::now()),
                    }
                })
                .collect()
        })
    }

    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match self.pool {
            Some(ref pool) => pool.install(op),
            None => op(),
        }
    }

    fn metadata_error(&self, dir: &Path, name: &str, source: io::Error) -> FingerprintError {
        FingerprintError::Metadata {
            directory: dir.to_path_buf(),
            name: name.to_string(),
            source,
        }
    }

    /// Apply the error policy to a recoverable failure.
    fn handle_failure(
        &self,
        err: FingerprintError,
        report: &mut ScanReport,
    ) -> Result<(), FingerprintError> {
        match self.config.error_policy {
            ErrorPolicy::FailFast => Err(err),
            ErrorPolicy::Continue => {
                log::warn!("{}", err);
                report.errors.push(err);
                Ok(())
            }
        }
    }
}
