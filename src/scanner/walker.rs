//! Directory walker yielding one listing per directory.
//!
//! # Overview
//!
//! [`Walker`] traverses a tree with [`walkdir`] in pre-order, siblings sorted
//! by name, and yields a [`DirectoryListing`] for every directory: its path
//! and the names of the regular files directly inside it. Recursion belongs
//! to the walker; consumers only see `(directory, filenames)` pairs.
//!
//! The cache file and its temporary sibling are never listed.
//!
//! # Example
//!
//! ```no_run
//! use hashkeep::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/photos"), WalkerConfig::default());
//! let listings: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} directories", listings.len());
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use walkdir::{DirEntry, WalkDir};

use super::{ScanError, WalkerConfig};
use crate::cache::is_reserved_name;

/// Files directly contained in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryListing {
    /// Directory path
    pub path: PathBuf,
    /// Base names of the regular files in the directory, sorted
    pub files: Vec<String>,
    /// Regular files whose names are not valid UTF-8, sorted
    pub invalid_names: Vec<PathBuf>,
}

impl DirectoryListing {
    /// Create a listing from a directory path and its file names.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, files: Vec<String>) -> Self {
        Self {
            path: path.into(),
            files,
            invalid_names: Vec::new(),
        }
    }
}

/// Directory walker for per-directory file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Compiled ignore patterns, if any
    gitignore: Option<Gitignore>,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given root.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        let gitignore = build_gitignore(path, &config);
        Self {
            root: path.to_path_buf(),
            config,
            gitignore,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set, the walker stops yielding listings.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk the tree, yielding one listing per directory in pre-order.
    ///
    /// Errors for unreadable directories are yielded as [`ScanError`] values
    /// rather than stopping iteration, one per directory.
    pub fn walk(&self) -> impl Iterator<Item = Result<DirectoryListing, ScanError>> + '_ {
        // walkdir reports a directory it cannot open again on the next step.
        let mut unlisted: HashSet<PathBuf> = HashSet::new();

        WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| entry.depth() == 0 || self.keep_directory(entry))
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
            .filter_map(move |entry| match entry {
                Ok(entry) if entry.file_type().is_dir() => {
                    let listing = self.list_directory(entry.path());
                    if listing.is_err() {
                        unlisted.insert(entry.path().to_path_buf());
                    }
                    Some(listing)
                }
                Ok(_) => None,
                Err(e) if e.path().is_some_and(|path| unlisted.contains(path)) => {
                    log::trace!("Already reported: {}", e);
                    None
                }
                Err(e) if e.path().is_some_and(is_dangling_symlink) => {
                    log::debug!("Skipping dangling symlink: {}", e);
                    None
                }
                Err(e) => Some(Err(self.convert_walk_error(e))),
            })
    }

    /// Decide whether a non-root entry is descended into.
    ///
    /// Files pass through untouched; they are listed by [`Self::list_directory`].
    fn keep_directory(&self, entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return true;
        }
        let name = entry.file_name().to_string_lossy();
        if self.config.skip_hidden && is_hidden(&name) {
            log::trace!("Skipping hidden directory: {}", entry.path().display());
            return false;
        }
        if self.should_ignore(entry.path(), true) {
            log::trace!("Ignoring directory: {}", entry.path().display());
            return false;
        }
        true
    }

    /// List the regular files directly inside `dir`, sorted by name.
    fn list_directory(&self, dir: &Path) -> Result<DirectoryListing, ScanError> {
        let read_dir =
            fs::read_dir(dir).map_err(|e| ScanError::from_io(dir.to_path_buf(), e))?;

        let mut listing = DirectoryListing::new(dir, Vec::new());
        for entry in read_dir {
            let entry = entry.map_err(|e| ScanError::from_io(dir.to_path_buf(), e))?;
            let path = entry.path();
            let file_name = entry.file_name();

            let lossy = file_name.to_string_lossy();
            if is_reserved_name(&lossy) {
                continue;
            }
            if self.config.skip_hidden && is_hidden(&lossy) {
                log::trace!("Skipping hidden file: {}", path.display());
                continue;
            }
            if !self.is_regular_file(&entry) {
                continue;
            }
            if self.should_ignore(&path, false) {
                log::trace!("Ignoring file: {}", path.display());
                continue;
            }

            match file_name.into_string() {
                Ok(name) => listing.files.push(name),
                Err(_) => listing.invalid_names.push(path),
            }
        }
        listing.files.sort();
        listing.invalid_names.sort();

        log::trace!("Listed {} files in {}", listing.files.len(), dir.display());
        Ok(listing)
    }

    /// Regular files, plus symlinks to regular files when following links.
    fn is_regular_file(&self, entry: &fs::DirEntry) -> bool {
        let Ok(file_type) = entry.file_type() else {
            return false;
        };
        if file_type.is_symlink() {
            if !self.config.follow_symlinks {
                log::trace!("Skipping symlink: {}", entry.path().display());
                return false;
            }
            return fs::metadata(entry.path()).is_ok_and(|m| m.is_file());
        }
        file_type.is_file()
    }

    fn should_ignore(&self, path: &Path, is_dir: bool) -> bool {
        let Some(gi) = &self.gitignore else {
            return false;
        };
        let relative_path = path.strip_prefix(&self.root).unwrap_or(path);
        gi.matched(relative_path, is_dir).is_ignore()
    }

    fn convert_walk_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);
        log::warn!("Walker error for {}: {}", path.display(), error);
        match error.into_io_error() {
            Some(source) => ScanError::from_io(path, source),
            None => ScanError::Io {
                path,
                source: std::io::Error::other("filesystem loop detected"),
            },
        }
    }
}

fn is_dangling_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
        && fs::metadata(path).is_err()
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Build a matcher from the configured patterns and, when enabled, the root
/// `.gitignore`.
fn build_gitignore(root: &Path, config: &WalkerConfig) -> Option<Gitignore> {
    let mut builder = GitignoreBuilder::new(root);

    let gitignore_path = root.join(".gitignore");
    if config.respect_gitignore && gitignore_path.exists() {
        if let Some(e) = builder.add(&gitignore_path) {
            log::warn!(
                "Failed to load .gitignore from {}: {}",
                gitignore_path.display(),
                e
            );
        }
    }

    for pattern in &config.ignore_patterns {
        if let Err(e) = builder.add_line(None, pattern) {
            log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
        }
    }

    match builder.build() {
        Ok(gitignore) if gitignore.is_empty() => None,
        Ok(gitignore) => Some(gitignore),
        Err(e) => {
            log::warn!("Failed to build ignore patterns: {}", e);
            None
        }
    }
}
