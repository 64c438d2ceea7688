//! Application configuration management.
//!
//! Settings are layered, later layers overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. `config.toml` in the platform config directory, or the file given
//!    with `--config`
//! 3. `HASHKEEP_*` environment variables (e.g. `HASHKEEP_IO_THREADS=8`)
//! 4. Command-line flags
//!
//! # Example
//!
//! ```toml
//! hash_enabled = true
//! algorithm = "sha256"
//! io_threads = 2
//! error_policy = "continue"
//! ignore_patterns = ["*.tmp", "node_modules"]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::ScanArgs;
use crate::fingerprint::{ErrorPolicy, FingerprintConfig};
use crate::scanner::{HashAlgorithm, WalkerConfig};

/// Prefix of environment variables read into the configuration.
pub const ENV_PREFIX: &str = "HASHKEEP_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Read file contents; when false only size and mtime are recorded.
    pub hash_enabled: bool,
    /// Rehash every file on every run.
    pub force_rehash: bool,
    /// Print each directory's table after processing it.
    pub print_tables: bool,
    /// Digest algorithm.
    pub algorithm: HashAlgorithm,
    /// Threads hashing the files of one directory.
    pub io_threads: usize,
    /// Abort on the first failure, or record it and continue.
    pub error_policy: ErrorPolicy,
    /// Drop rows of files that no longer exist.
    pub prune_missing: bool,
    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,
    /// Skip hidden files and directories.
    pub skip_hidden: bool,
    /// Gitignore-style patterns to skip.
    pub ignore_patterns: Vec<String>,
    /// Also skip what the `.gitignore` at the scan root matches.
    pub respect_gitignore: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            hash_enabled: true,
            force_rehash: false,
            print_tables: false,
            algorithm: HashAlgorithm::default(),
            io_threads: 4,
            error_policy: ErrorPolicy::default(),
            prune_missing: true,
            follow_symlinks: false,
            skip_hidden: false,
            ignore_patterns: Vec::new(),
            respect_gitignore: false,
        }
    }
}

impl Config {
    /// Load the layered configuration.
    ///
    /// With `explicit` set, that file replaces the platform config file and
    /// must exist. The platform config file is optional.
    ///
    /// # Errors
    ///
    /// Returns an error if the explicit file is missing, or if a layer holds
    /// malformed TOML or values of the wrong type.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let figment = Self::figment(explicit)?;
        let config: Self = figment.extract().context("Failed to load configuration")?;
        log::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// The figment behind [`Config::load`], before extraction.
    ///
    /// # Errors
    ///
    /// Returns an error if `explicit` names a file that does not exist.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match explicit {
            Some(path) => {
                if !path.is_file() {
                    bail!("Configuration file not found: {}", path.display());
                }
                log::debug!("Using configuration file {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(path) = Self::default_path() {
                    log::trace!("Looking for configuration in {}", path.display());
                    figment = figment.merge(Toml::file(path));
                }
            }
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Default platform-specific configuration path.
    ///
    /// `None` when no home directory can be determined.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "hashkeep", "hashkeep")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply the flags given on the `scan` command line.
    pub fn apply_scan_args(&mut self, args: &ScanArgs) {
        if args.force {
            self.force_rehash = true;
        }
        if args.no_hash {
            self.hash_enabled = false;
        }
        if args.print_tables {
            self.print_tables = true;
        }
        if let Some(algorithm) = args.algorithm {
            self.algorithm = algorithm;
        }
        if let Some(threads) = args.io_threads {
            self.io_threads = usize::from(threads);
        }
        if args.keep_going {
            self.error_policy = ErrorPolicy::Continue;
        }
        if args.no_prune {
            self.prune_missing = false;
        }
        if args.follow_symlinks {
            self.follow_symlinks = true;
        }
        if args.skip_hidden {
            self.skip_hidden = true;
        }
        self.ignore_patterns.extend(args.ignore_patterns.iter().cloned());
        if args.respect_gitignore {
            self.respect_gitignore = true;
        }
    }

    /// Build the fingerprinting configuration from these settings.
    #[must_use]
    pub fn fingerprint_config(&self) -> FingerprintConfig {
        FingerprintConfig::default()
            .with_hash_enabled(self.hash_enabled)
            .with_force_rehash(self.force_rehash)
            .with_print_tables(self.print_tables)
            .with_algorithm(self.algorithm)
            .with_io_threads(self.io_threads)
            .with_error_policy(self.error_policy)
            .with_prune_missing(self.prune_missing)
            .with_walker_config(
                WalkerConfig::new(
                    self.follow_symlinks,
                    self.skip_hidden,
                    self.ignore_patterns.clone(),
                )
                .with_respect_gitignore(self.respect_gitignore),
            )
    }
}
