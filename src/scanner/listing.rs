//! Non-recursive directory listing for interactive browsers.
//!
//! A browser shows one directory at a time and lets the user pick a
//! subdirectory to descend into before triggering a scan. [`list`] is the
//! only thing it needs from the scanner: a stateless, sorted snapshot of a
//! directory's children.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use super::ScanError;

/// One child of a listed directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListEntry {
    /// File name of the child
    pub name: OsString,
    /// Full path of the child
    pub path: PathBuf,
    /// Whether the child is (or links to) a directory
    pub is_directory: bool,
}

/// List the children of `dir`, sorted by name.
///
/// Symlinks are resolved to decide `is_directory`. Children that cannot be
/// inspected (dangling links, permission errors) are left out with a debug
/// diagnostic.
///
/// # Errors
///
/// Returns a [`ScanError`] if `dir` itself cannot be read.
pub fn list(dir: &Path) -> Result<Vec<ListEntry>, ScanError> {
    let read_dir = fs::read_dir(dir).map_err(|e| ScanError::from_io(dir, e))?;

    let mut entries: Vec<ListEntry> = read_dir
        .filter_map(|child| match child {
            Ok(child) => {
                let path = child.path();
                match fs::metadata(&path) {
                    Ok(meta) => Some(ListEntry {
                        name: child.file_name(),
                        path,
                        is_directory: meta.is_dir(),
                    }),
                    Err(e) => {
                        log::debug!("Leaving {} out of listing: {}", path.display(), e);
                        None
                    }
                }
            }
            Err(e) => {
                log::debug!("Unreadable entry in {}: {}", dir.display(), e);
                None
            }
        })
        .collect();

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}
