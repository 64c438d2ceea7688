//! Ctrl+C handling for graceful shutdown.
//!
//! A scan is only ever interrupted between directories: the directory being
//! processed is finished and its cache saved before the scan stops, so no
//! cache file is left half-updated.
//!
//! # Usage
//!
//! ```rust,no_run
//! use hashkeep::fingerprint::FingerprintConfig;
//! use hashkeep::signal::install_handler;
//!
//! let handler = install_handler();
//! let config = FingerprintConfig::default().with_shutdown_flag(handler.get_flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared shutdown flag, set when Ctrl+C is received.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once Ctrl+C was pressed or [`Self::request_shutdown`] was called.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request a shutdown programmatically.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Clone of the flag, for the walker and the orchestrator.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Clear the flag.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C handler.
///
/// The first call registers the handler; later calls return the registered
/// handler with its flag cleared. If registration fails, a handler that is
/// never signalled is returned and the scan simply cannot be interrupted.
pub fn install_handler() -> ShutdownHandler {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return handler.clone();
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    let installed = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);

        let mut stderr = std::io::stderr();
        let _ = writeln!(stderr, "\nInterrupted. Finishing the current directory...");
        let _ = stderr.flush();

        log::info!("Shutdown signal received");
    });

    match installed {
        Ok(()) => GLOBAL_HANDLER.get_or_init(|| handler).clone(),
        Err(e) => {
            log::warn!("Failed to install Ctrl+C handler: {}", e);
            handler
        }
    }
}
