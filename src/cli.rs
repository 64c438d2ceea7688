//! Command-line interface definitions for hashkeep.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! The CLI follows standard conventions with global options (verbosity, color) and
//! subcommands for different operations.
//!
//! Flags of `scan` only override the configuration file and environment when
//! they are given; an absent flag leaves the configured value alone.
//!
//! # Example
//!
//! ```bash
//! # Fingerprint a tree, reusing every cache already on disk
//! hashkeep scan ~/Pictures
//!
//! # Rehash everything and print each directory's table
//! hashkeep scan ~/Pictures --force --print-tables
//!
//! # Inspect one directory's cache as JSON
//! hashkeep show ~/Pictures/2024 --output json
//!
//! # Verbose mode for debugging
//! hashkeep -v scan ~/Pictures
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::scanner::HashAlgorithm;

/// Incremental per-directory file fingerprinting.
///
/// hashkeep records the size, modification time and content hash of every
/// file in a small cache file stored next to it, and only rehashes files
/// whose size or modification time changed since the last run.
#[derive(Debug, Parser)]
#[command(name = "hashkeep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Configuration file (default: config.toml in the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Report fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for hashkeep.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fingerprint every file under a directory tree
    Scan(ScanArgs),
    /// Print the cache table of one directory
    Show(ShowArgs),
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Root directory to fingerprint
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Rehash every file, ignoring cached rows
    #[arg(long)]
    pub force: bool,

    /// Record size and mtime only; hashes are stored as "disabled"
    #[arg(long)]
    pub no_hash: bool,

    /// Print each directory's cache table after processing it
    #[arg(long)]
    pub print_tables: bool,

    /// Digest algorithm (default: sha1)
    #[arg(long, value_enum, value_name = "ALGORITHM")]
    pub algorithm: Option<HashAlgorithm>,

    /// Number of threads hashing files of one directory (default: 4)
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub io_threads: Option<u16>,

    /// Record per-file failures and keep going instead of aborting
    #[arg(long)]
    pub keep_going: bool,

    /// Keep rows of files that no longer exist
    #[arg(long)]
    pub no_prune: bool,

    /// Follow symbolic links during scan
    ///
    /// Warning: May cause infinite loops if symlinks form cycles.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Glob patterns to ignore (can be specified multiple times)
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Also skip whatever the .gitignore at the scan root matches
    #[arg(long)]
    pub respect_gitignore: bool,
}

/// Arguments for the show subcommand.
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Directory whose cache should be printed
    #[arg(value_name = "DIR")]
    pub path: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: ShowFormat,
}

/// Rendering of a cache table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ShowFormat {
    /// Aligned text table
    #[default]
    Table,
    /// JSON document
    Json,
    /// CSV, identical to the cache file layout
    Csv,
}
