//! Progress reporting utilities using indicatif.
//!
//! This module provides the [`Progress`] struct which implements
//! [`ProgressCallback`] to display a per-directory progress bar in the
//! terminal, annotated with the volume hashed so far.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use bytesize::ByteSize;
use indicatif::{ProgressBar, ProgressStyle};

/// Progress callback for a fingerprinting scan.
///
/// Implement this trait to receive progress updates while directories are
/// processed. `on_file_hashed` may be called from worker threads.
pub trait ProgressCallback: Send + Sync {
    /// Called once, before the first directory.
    ///
    /// # Arguments
    ///
    /// * `total_dirs` - Number of directories expected (best effort)
    fn on_scan_start(&self, total_dirs: usize);

    /// Called when a directory starts being processed.
    ///
    /// # Arguments
    ///
    /// * `current` - Directory number (1-based)
    /// * `path` - Directory being processed
    fn on_directory(&self, current: usize, path: &Path);

    /// Called after a file has been hashed.
    fn on_file_hashed(&self, _bytes: u64) {}

    /// Called once, after the last directory.
    fn on_scan_end(&self);
}

/// Progress reporter using indicatif.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    bytes_hashed: AtomicU64,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bar will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use hashkeep::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            bytes_hashed: AtomicU64::new(0),
            quiet,
        }
    }

    /// Total bytes reported through [`ProgressCallback::on_file_hashed`].
    #[must_use]
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes_hashed.load(Ordering::Relaxed)
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template(
            "[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} dirs ({percent}%) {msg} (ETA: {eta})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█>-")
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(ref pb) = *guard {
                f(pb);
            }
        }
    }
}

impl ProgressCallback for Progress {
    fn on_scan_start(&self, total_dirs: usize) {
        self.bytes_hashed.store(0, Ordering::Relaxed);
        if self.quiet {
            return;
        }
        let pb = ProgressBar::new(total_dirs as u64);
        pb.set_style(Self::style());
        if let Ok(mut bar) = self.bar.lock() {
            *bar = Some(pb);
        }
    }

    fn on_directory(&self, current: usize, path: &Path) {
        let hashed = ByteSize(self.bytes_hashed());
        self.with_bar(|pb| {
            pb.set_position(current.saturating_sub(1) as u64);
            pb.set_message(format!(
                "{} hashed, {}",
                hashed,
                truncate_path(&path.to_string_lossy(), 30)
            ));
        });
    }

    fn on_file_hashed(&self, bytes: u64) {
        self.bytes_hashed.fetch_add(bytes, Ordering::Relaxed);
    }

    fn on_scan_end(&self) {
        let hashed = ByteSize(self.bytes_hashed());
        if let Ok(mut bar) = self.bar.lock() {
            if let Some(pb) = bar.take() {
                pb.set_position(pb.length().unwrap_or(0));
                pb.finish_with_message(format!("{hashed} hashed"));
            }
        }
    }
}

/// Truncate a path for display in the progress bar.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let tail: String = {
        let chars: Vec<char> = path.chars().collect();
        chars[chars.len() - (max_len - 3)..].iter().collect()
    };
    format!("...{tail}")
}
