//! Content fingerprinting with streaming reads.
//!
//! # Overview
//!
//! This module provides the [`Fingerprinter`] for computing a fixed-width
//! digest of a file's full content. Files are read in bounded chunks so
//! arbitrarily large files never have to fit in memory.
//!
//! Two algorithms are available, both producing 256-bit digests:
//!
//! - **BLAKE3** (default): fast, cryptographically secure
//! - **SHA-256**: slower, widely recognized
//!
//! A fingerprint remembers which algorithm produced it, so digests from
//! different algorithms never compare equal.
//!
//! # Example
//!
//! ```no_run
//! use linkdupe::scanner::fingerprint::{Fingerprinter, FingerprintAlgorithm};
//! use std::path::Path;
//!
//! let fingerprinter = Fingerprinter::new(FingerprintAlgorithm::Blake3);
//! match fingerprinter.fingerprint(Path::new("photo.jpg")) {
//!     Ok(fp) => println!("{}", fp),
//!     Err(e) => eprintln!("skipping: {}", e),
//! }
//! ```

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Default read chunk size (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Smallest chunk size accepted; smaller requests are clamped up.
pub const MIN_CHUNK_SIZE: usize = 1024;

/// Width of every fingerprint in bytes.
pub const FINGERPRINT_LEN: usize = 32;

/// Digest algorithm used to fingerprint file content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintAlgorithm {
    /// BLAKE3, 256-bit output
    #[default]
    Blake3,
    /// SHA-256, 256-bit output
    Sha256,
}

impl fmt::Display for FingerprintAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blake3 => write!(f, "blake3"),
            Self::Sha256 => write!(f, "sha256"),
        }
    }
}

/// Fixed-width content identifier.
///
/// Opaque, comparable for equality and usable as a map key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    algorithm: FingerprintAlgorithm,
    digest: [u8; FINGERPRINT_LEN],
}

impl Fingerprint {
    /// Build a fingerprint from raw digest bytes.
    #[must_use]
    pub fn from_bytes(algorithm: FingerprintAlgorithm, digest: [u8; FINGERPRINT_LEN]) -> Self {
        Self { algorithm, digest }
    }

    /// Algorithm that produced this fingerprint.
    #[must_use]
    pub fn algorithm(&self) -> FingerprintAlgorithm {
        self.algorithm
    }

    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.digest
    }

    /// Lowercase hex rendering of the digest.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.digest.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps log lines readable
        write!(f, "Fingerprint({}:{}..)", self.algorithm, &self.to_hex()[..12])
    }
}

/// The file's content could not be read.
///
/// Callers must skip the file; it never matches anything.
#[derive(thiserror::Error, Debug)]
pub enum FingerprintError {
    /// Open or read failed.
    #[error("Fingerprint unavailable for {path}: {source}")]
    Unavailable {
        /// File that could not be fingerprinted
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl FingerprintError {
    /// Path of the file that could not be fingerprinted.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Unavailable { path, .. } => path,
        }
    }

    /// Kind of the underlying I/O error.
    #[must_use]
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            Self::Unavailable { source, .. } => source.kind(),
        }
    }
}

/// Incremental digest state for one of the supported algorithms.
enum DigestState {
    Blake3(Box<blake3::Hasher>),
    Sha256(Sha256),
}

impl DigestState {
    fn new(algorithm: FingerprintAlgorithm) -> Self {
        match algorithm {
            FingerprintAlgorithm::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
            FingerprintAlgorithm::Sha256 => Self::Sha256(Sha256::new()),
        }
    }

    fn update(&mut self, bytes: &[u8]) {
        match self {
            Self::Blake3(h) => {
                h.update(bytes);
            }
            Self::Sha256(h) => h.update(bytes),
        }
    }

    fn finalize(self) -> [u8; FINGERPRINT_LEN] {
        match self {
            Self::Blake3(h) => *h.finalize().as_bytes(),
            Self::Sha256(h) => {
                let mut out = [0u8; FINGERPRINT_LEN];
                out.copy_from_slice(&h.finalize());
                out
            }
        }
    }
}

/// Streaming file fingerprinter.
#[derive(Debug, Clone)]
pub struct Fingerprinter {
    algorithm: FingerprintAlgorithm,
    chunk_size: usize,
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new(FingerprintAlgorithm::default())
    }
}

impl Fingerprinter {
    /// Create a fingerprinter with the default chunk size.
    #[must_use]
    pub fn new(algorithm: FingerprintAlgorithm) -> Self {
        Self {
            algorithm,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Set the read chunk size (clamped to [`MIN_CHUNK_SIZE`]).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(MIN_CHUNK_SIZE);
        self
    }

    /// Algorithm in use.
    #[must_use]
    pub fn algorithm(&self) -> FingerprintAlgorithm {
        self.algorithm
    }

    /// Read chunk size in bytes.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Fingerprint the full content of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FingerprintError::Unavailable`] if the file cannot be opened
    /// or a read fails part way through.
    pub fn fingerprint(&self, path: &Path) -> Result<Fingerprint, FingerprintError> {
        let unavailable = |source: io::Error| FingerprintError::Unavailable {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(unavailable)?;
        self.fingerprint_reader(file).map_err(unavailable)
    }

    /// Fingerprint everything readable from `reader`.
    ///
    /// # Errors
    ///
    /// Propagates any read error other than `Interrupted`.
    pub fn fingerprint_reader<R: Read>(&self, mut reader: R) -> io::Result<Fingerprint> {
        let mut state = DigestState::new(self.algorithm);
        let mut buffer = vec![0u8; self.chunk_size];

        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            state.update(&buffer[..n]);
        }

        Ok(Fingerprint::from_bytes(self.algorithm, state.finalize()))
    }
}
