//! Streaming file hasher with wall-clock timing.
//!
//! # Overview
//!
//! [`Hasher`] reads a file in fixed-size chunks through a streaming digest,
//! so memory use stays bounded regardless of file size. Each call reports the
//! hex digest together with the time spent opening, reading and digesting.
//!
//! When hashing is disabled the hasher returns [`HASH_DISABLED`] and a zero
//! duration without touching the file.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use sha2::Digest;

use super::HashError;
use crate::cache::HASH_DISABLED;

/// Read buffer size used for hashing (1 MiB).
pub const BUFFER_SIZE: usize = 1024 * 1024;

/// Digest algorithm used to fingerprint file contents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-1 (160-bit)
    #[default]
    Sha1,
    /// SHA-256
    Sha256,
    /// BLAKE3
    Blake3,
}

impl std::fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sha1 => write!(f, "sha1"),
            Self::Sha256 => write!(f, "sha256"),
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

/// Result of hashing one file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHash {
    /// Lowercase hex digest, or [`HASH_DISABLED`]
    pub digest: String,
    /// Wall-clock time spent reading and digesting the file
    pub elapsed: Duration,
}

impl FileHash {
    /// Elapsed time in fractional seconds.
    #[must_use]
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// Streaming content hasher.
#[derive(Debug, Clone)]
pub struct Hasher {
    algorithm: HashAlgorithm,
    enabled: bool,
    buffer_size: usize,
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new(HashAlgorithm::default())
    }
}

impl Hasher {
    /// Create an enabled hasher for `algorithm`.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            enabled: true,
            buffer_size: BUFFER_SIZE,
        }
    }

    /// Enable or disable hashing.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Override the read buffer size (minimum 1 byte).
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    /// Whether files are actually read.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Configured digest algorithm.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hash the contents of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read. No digest
    /// is produced for a partially read file.
    pub fn hash(&self, path: &Path) -> Result<FileHash, HashError> {
        if !self.enabled {
            return Ok(FileHash {
                digest: HASH_DISABLED.to_string(),
                elapsed: Duration::ZERO,
            });
        }

        let start = Instant::now();
        let file = File::open(path).map_err(|e| HashError::from_io(path.to_path_buf(), e))?;

        let digest = match self.algorithm {
            HashAlgorithm::Sha1 => self.stream_digest::<sha1::Sha1>(file),
            HashAlgorithm::Sha256 => self.stream_digest::<sha2::Sha256>(file),
            HashAlgorithm::Blake3 => self.stream_blake3(file),
        }
        .map_err(|e| HashError::from_io(path.to_path_buf(), e))?;

        let elapsed = start.elapsed();
        log::trace!(
            "Hashed {} with {} in {:.3}s",
            path.display(),
            self.algorithm,
            elapsed.as_secs_f64()
        );

        Ok(FileHash { digest, elapsed })
    }

    fn stream_digest<D: Digest>(&self, mut reader: impl Read) -> io::Result<String> {
        let mut digest = D::new();
        let mut buffer = vec![0u8; self.buffer_size];
        loop {
            let read = read_chunk(&mut reader, &mut buffer)?;
            if read == 0 {
                break;
            }
            digest.update(&buffer[..read]);
        }
        Ok(hex::encode(digest.finalize()))
    }

    fn stream_blake3(&self, mut reader: impl Read) -> io::Result<String> {
        let mut digest = blake3::Hasher::new();
        let mut buffer = vec![0u8; self.buffer_size];
        loop {
            let read = read_chunk(&mut reader, &mut buffer)?;
            if read == 0 {
                break;
            }
            digest.update(&buffer[..read]);
        }
        Ok(digest.finalize().to_hex().to_string())
    }
}

/// Read the next chunk, retrying reads interrupted by signals.
fn read_chunk(reader: &mut impl Read, buffer: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buffer) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            result => return result,
        }
    }
}
