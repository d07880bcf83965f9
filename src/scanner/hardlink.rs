//! Hardlink detection.
//!
//! # Overview
//!
//! Hardlinks are multiple directory entries pointing to the same inode on disk.
//! Once a duplicate has been substituted it *is* a hardlink to its
//! representative, so a re-scan must recognise it and leave it alone. The
//! walker feeds every regular file's metadata through a [`HardlinkTracker`]
//! and skips inodes it has already seen, which is what makes a second scan
//! over a deduplicated tree a no-op.
//!
//! The substitution protocol also uses [`InodeKey`] to confirm that a freshly
//! created link really shares the representative's storage.
//!
//! # Platform Support
//!
//! - **Unix**: Uses (device_id, inode) pairs from file metadata
//! - **Other**: Detection disabled (every file is treated as unique)

use std::collections::HashSet;
use std::fs::Metadata;
use std::io;
use std::path::Path;

/// Tracks seen inodes to detect hardlinks.
///
/// `HardlinkTracker` is NOT thread-safe. Each scan session owns its own.
#[derive(Debug, Default)]
pub struct HardlinkTracker {
    /// Set of seen inode keys
    seen: HashSet<InodeKey>,
}

impl HardlinkTracker {
    /// Create a new hardlink tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
        }
    }

    /// Check if a file is a hardlink to a previously seen file.
    ///
    /// The first occurrence of an inode is recorded and reported as `false`;
    /// every later occurrence reports `true`. Always `false` on platforms
    /// without inode information.
    pub fn is_hardlink(&mut self, metadata: &Metadata) -> bool {
        match InodeKey::from_metadata(metadata) {
            Some(key) => !self.seen.insert(key),
            None => false,
        }
    }

    /// Record a file's inode without checking for hardlinks.
    ///
    /// Returns `true` if the inode was newly recorded.
    pub fn record(&mut self, metadata: &Metadata) -> bool {
        InodeKey::from_metadata(metadata).is_some_and(|key| self.seen.insert(key))
    }

    /// Get the number of unique inodes tracked.
    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }

    /// Check if hardlink detection is supported on this platform.
    #[must_use]
    pub const fn is_supported() -> bool {
        cfg!(unix)
    }
}

/// Platform-specific identity of the storage behind a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InodeKey {
    #[cfg(unix)]
    dev: u64,
    #[cfg(unix)]
    ino: u64,
    #[cfg(not(unix))]
    _phantom: (),
}

impl InodeKey {
    /// Create an inode key from file metadata.
    ///
    /// Returns `None` if the platform doesn't support inode tracking.
    #[cfg(unix)]
    #[must_use]
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        use std::os::unix::fs::MetadataExt;
        Some(Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        })
    }

    #[cfg(not(unix))]
    #[must_use]
    pub fn from_metadata(_metadata: &Metadata) -> Option<Self> {
        None
    }

    /// Inode key of the entry at `path`, without following a final symlink.
    ///
    /// # Errors
    ///
    /// Returns the error from `symlink_metadata`.
    pub fn of_path(path: &Path) -> io::Result<Option<Self>> {
        Ok(Self::from_metadata(&std::fs::symlink_metadata(path)?))
    }
}

/// Whether two paths are directory entries for the same inode.
///
/// Returns `Ok(None)` when the platform cannot tell.
///
/// # Errors
///
/// Returns an error if either path cannot be inspected.
pub fn same_inode(a: &Path, b: &Path) -> io::Result<Option<bool>> {
    match (InodeKey::of_path(a)?, InodeKey::of_path(b)?) {
        (Some(ka), Some(kb)) => Ok(Some(ka == kb)),
        _ => Ok(None),
    }
}
