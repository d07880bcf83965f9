//! Scanner module for directory traversal and content fingerprinting.
//!
//! This module provides functionality for:
//! - Depth-first directory walking using walkdir
//! - Content fingerprinting with BLAKE3 or SHA-256
//! - Hardlink detection
//! - Single-directory listing for interactive browsers
//!
//! # Architecture
//!
//! The scanner is divided into submodules:
//! - [`walker`]: Directory traversal and file discovery
//! - [`fingerprint`]: Streaming content digests
//! - [`hardlink`]: Inode tracking
//! - [`listing`]: Non-recursive directory listing
//!
//! # Example
//!
//! ```no_run
//! use linkdupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("."), WalkerConfig::default());
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod fingerprint;
pub mod hardlink;
pub mod listing;
pub mod walker;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

// Re-export main types
pub use fingerprint::{
    Fingerprint, FingerprintAlgorithm, FingerprintError, Fingerprinter, DEFAULT_CHUNK_SIZE,
};
pub use listing::{list, ListEntry};
pub use walker::Walker;

/// A regular file discovered by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path of the directory entry as found under the root
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Whether the directory entry is a symbolic link to a regular file
    pub is_symlink: bool,
    /// Target of a symlinked file, spelled under the root as given
    /// (always inside the root)
    pub target: Option<PathBuf>,
}

impl FileEntry {
    /// Create a new FileEntry for a plain regular file.
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self {
            path,
            size,
            is_symlink: false,
            target: None,
        }
    }

    /// Path whose inode later duplicates should be linked to.
    ///
    /// For a symlinked file this is the resolved target, so a hard link
    /// never ends up pointing at the symlink itself.
    #[must_use]
    pub fn link_source(&self) -> &Path {
        self.target.as_deref().unwrap_or(&self.path)
    }
}

/// Configuration for directory walking.
///
/// Every filter is off by default: the walker reports every regular file.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Minimum file size to include (in bytes).
    pub min_size: Option<u64>,

    /// Glob patterns to ignore (gitignore-style).
    pub ignore_patterns: Vec<String>,

    /// Also apply the patterns of a `.gitignore` at the root.
    pub respect_gitignore: bool,

    /// Files that must never be reported, matched by inode where the
    /// platform supports it (so hard links and symlinks to them are
    /// excluded too).
    pub exclude: Vec<PathBuf>,
}

impl WalkerConfig {
    /// Skip hidden entries.
    #[must_use]
    pub fn with_skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    /// Only report files of at least `min_size` bytes.
    #[must_use]
    pub fn with_min_size(mut self, min_size: Option<u64>) -> Self {
        self.min_size = min_size;
        self
    }

    /// Add gitignore-style patterns.
    #[must_use]
    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    /// Honour the root's `.gitignore`.
    #[must_use]
    pub fn with_respect_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }

    /// Never report `path`.
    #[must_use]
    pub fn with_excluded(mut self, path: PathBuf) -> Self {
        self.exclude.push(path);
        self
    }
}

/// Marker embedded in the names of temporary links made while substituting.
pub const TEMP_LINK_MARKER: &str = ".linkdupe-";

/// Whether `name` looks like a temporary link left behind by a substitution
/// (`.<name>.linkdupe-<pid>-<n>.tmp`).
#[must_use]
pub fn is_temp_link_name(name: &OsStr) -> bool {
    name.to_str().is_some_and(|n| {
        n.starts_with('.') && n.ends_with(".tmp") && n.contains(TEMP_LINK_MARKER)
    })
}

/// Errors that can occur during directory scanning.
///
/// All of these are non-fatal: the entry is skipped and the walk continues.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The path vanished between discovery and inspection.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::PermissionDenied(p) | Self::NotFound(p) | Self::Io { path: p, .. } => p,
        }
    }
}
