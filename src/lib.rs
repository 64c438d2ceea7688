//! hashkeep - incremental per-directory file fingerprinting
//!
//! Every scanned directory keeps a small cache file recording, per file, its
//! size, modification time and content hash. A file is only read and hashed
//! again when its size or modification time changed, so repeated scans of a
//! large, mostly static tree cost little more than a directory walk.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Result};

use crate::cache::store;
use crate::cli::{Cli, Commands, ScanArgs, ShowArgs, ShowFormat};
use crate::config::Config;
use crate::error::ExitCode;
use crate::fingerprint::{Fingerprinter, ScanReport};
use crate::output::{CsvOutput, JsonOutput, SummaryOutput, TableOutput};
use crate::progress::Progress;

/// Run the command described by `cli`.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the command
/// fails. Failures recorded under the `continue` error policy are not
/// errors; they are reflected in the returned exit code.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet, cli.no_color);

    match cli.command {
        Commands::Scan(ref args) => {
            let config = Config::load(cli.config.as_deref())?;
            run_scan(args, config, cli.quiet)
        }
        Commands::Show(ref args) => run_show(args),
    }
}

fn run_scan(args: &ScanArgs, mut config: Config, quiet: bool) -> Result<ExitCode> {
    config.apply_scan_args(args);

    let handler = signal::install_handler();
    // Tables go to stdout; keep the bar out of their way.
    let progress = Arc::new(Progress::new(quiet || config.print_tables));

    let fingerprint_config = config
        .fingerprint_config()
        .with_shutdown_flag(handler.get_flag())
        .with_progress_callback(progress);

    log::info!(
        "Fingerprinting {} with {} ({} threads)",
        args.path.display(),
        if config.hash_enabled {
            config.algorithm.to_string()
        } else {
            "hashing disabled".to_string()
        },
        config.io_threads
    );

    let report = Fingerprinter::new(fingerprint_config).scan(&args.path)?;

    if !quiet {
        SummaryOutput::new(&report).write_to(&mut io::stderr().lock())?;
    }

    Ok(scan_exit_code(&report))
}

/// Exit code reflecting how far a scan got.
#[must_use]
pub fn scan_exit_code(report: &ScanReport) -> ExitCode {
    if report.interrupted {
        ExitCode::Interrupted
    } else if !report.errors.is_empty() {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    }
}

fn run_show(args: &ShowArgs) -> Result<ExitCode> {
    if !args.path.is_dir() {
        bail!("Not a directory: {}", args.path.display());
    }

    let (cache, outcome) = store::load(&args.path);
    log::debug!("Cache of {}: {:?}", args.path.display(), outcome);

    let mut stdout = io::stdout().lock();
    match args.output {
        ShowFormat::Table => TableOutput::new(&args.path, &cache).write_to(&mut stdout)?,
        ShowFormat::Json => JsonOutput::new(&args.path, &cache).write_to(&mut stdout, true)?,
        ShowFormat::Csv => CsvOutput::new(&cache).write_to(&mut stdout)?,
    }
    stdout.flush()?;

    Ok(ExitCode::Success)
}
