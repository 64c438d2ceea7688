//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the hashkeep application.
///
/// - 0: Success (every directory was fingerprinted)
/// - 1: General error (fatal failure, the run was aborted)
/// - 3: Partial success (completed, but some files could not be fingerprinted)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: Scan completed without errors.
    Success = 0,
    /// General error: The run was aborted.
    GeneralError = 1,
    /// Partial success: Scan completed but some files were skipped.
    PartialSuccess = 3,
    /// Interrupted: Scan was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "HK000",
            Self::GeneralError => "HK001",
            Self::PartialSuccess => "HK003",
            Self::Interrupted => "HK130",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "HK001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including the failing directory and file
    pub message: String,
    /// Chain of underlying causes, outermost first
    pub causes: Vec<String>,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: err.to_string(),
            causes: err.chain().skip(1).map(ToString::to_string).collect(),
        }
    }
}
