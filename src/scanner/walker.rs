//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for traversing a directory
//! tree and reporting every regular file beneath it. Traversal is
//! depth-first and single-threaded, with the children of each directory
//! sorted by name, so two walks over the same tree visit files in the same
//! order. The first-visited file of a content group becomes its
//! representative, which makes that choice deterministic.
//!
//! # Features
//!
//! - Never follows symlinked directories (no cycles, no escaping the root)
//! - Symlinked regular files are reported when their target is inside the root
//! - Gitignore-style pattern matching via the `ignore` crate (the root's
//!   `.gitignore` only when asked for)
//! - Exclusion of specific files (such as the action log) by inode
//! - Leftover temporary links from interrupted substitutions are skipped
//! - Minimum size and hidden file filtering
//! - Hardlink detection via [`HardlinkTracker`]
//! - Graceful shutdown via atomic flag
//!
//! # Example
//!
//! ```no_run
//! use linkdupe::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/home/user/Downloads"), WalkerConfig::default());
//! let files: Vec<_> = walker.walk().filter_map(Result::ok).collect();
//! println!("Found {} files", files.len());
//! ```

use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use walkdir::{DirEntry, WalkDir};

use super::hardlink::{HardlinkTracker, InodeKey};
use super::{is_temp_link_name, FileEntry, ScanError, WalkerConfig};

/// Files the walker must never report, resolved once per walk.
#[derive(Debug, Default)]
struct Exclusions {
    keys: Vec<InodeKey>,
    paths: Vec<PathBuf>,
}

impl Exclusions {
    fn resolve(paths: &[PathBuf]) -> Self {
        let mut exclusions = Self::default();
        for path in paths {
            match fs::metadata(path).map(|m| InodeKey::from_metadata(&m)) {
                Ok(Some(key)) => exclusions.keys.push(key),
                Ok(None) => exclusions.paths.push(path.clone()),
                Err(e) => {
                    log::trace!("Excluded path {} not present: {}", path.display(), e);
                    exclusions.paths.push(path.clone());
                }
            }
        }
        exclusions
    }

    fn contains(&self, path: &Path, metadata: &Metadata) -> bool {
        if let Some(key) = InodeKey::from_metadata(metadata) {
            if self.keys.contains(&key) {
                return true;
            }
        }
        self.paths.iter().any(|p| p == path)
    }
}

/// Depth-first directory walker.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops before the next entry.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Build gitignore matcher from config patterns and, if enabled, the
    /// root's .gitignore file.
    fn build_gitignore(&self) -> Option<Gitignore> {
        let mut builder = GitignoreBuilder::new(&self.root);

        let gitignore_path = self.root.join(".gitignore");
        if self.config.respect_gitignore && gitignore_path.is_file() {
            if let Some(e) = builder.add(&gitignore_path) {
                log::warn!(
                    "Failed to load .gitignore from {}: {}",
                    gitignore_path.display(),
                    e
                );
            } else {
                log::debug!("Loaded .gitignore from {}", gitignore_path.display());
            }
        }

        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if gitignore.is_empty() => None,
            Ok(gitignore) => Some(gitignore),
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// Check if a path should be ignored based on configured patterns.
    fn should_ignore(&self, path: &Path, is_dir: bool, gitignore: Option<&Gitignore>) -> bool {
        let Some(gi) = gitignore else {
            return false;
        };
        let relative_path = path.strip_prefix(&self.root).unwrap_or(path);
        gi.matched(relative_path, is_dir).is_ignore()
    }

    /// Decide whether walkdir should yield (and descend into) an entry.
    fn keep_entry(&self, entry: &DirEntry, gitignore: Option<&Gitignore>) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        if self.config.skip_hidden && is_hidden(entry) {
            log::trace!("Skipping hidden entry: {}", entry.path().display());
            return false;
        }
        if !entry.file_type().is_dir() && is_temp_link_name(entry.file_name()) {
            log::debug!("Skipping leftover temporary link: {}", entry.path().display());
            return false;
        }
        if self.should_ignore(entry.path(), entry.file_type().is_dir(), gitignore) {
            log::trace!("Ignoring: {}", entry.path().display());
            return false;
        }
        true
    }

    /// Walk the directory tree, yielding file entries.
    ///
    /// Returns an iterator over [`FileEntry`] results. Errors are yielded
    /// as [`ScanError`] values rather than stopping iteration; the walk
    /// carries on with the next entry.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let gitignore = self.build_gitignore();
        let exclusions = Exclusions::resolve(&self.config.exclude);
        let mut hardlink_tracker = HardlinkTracker::new();
        let canonical_root = match fs::canonicalize(&self.root) {
            Ok(p) => Some(p),
            Err(e) => {
                log::warn!(
                    "Cannot resolve root {}: {}; symlinked files will be skipped",
                    self.root.display(),
                    e
                );
                None
            }
        };

        WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |e| self.keep_entry(e, gitignore.as_ref()))
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => self.process_entry(
                    &entry,
                    canonical_root.as_deref(),
                    &exclusions,
                    &mut hardlink_tracker,
                ),
                Err(e) => Some(Err(self.handle_walkdir_error(e))),
            })
    }

    /// Turn one walkdir entry into a file report, or nothing.
    fn process_entry(
        &self,
        entry: &DirEntry,
        canonical_root: Option<&Path>,
        exclusions: &Exclusions,
        hardlink_tracker: &mut HardlinkTracker,
    ) -> Option<Result<FileEntry, ScanError>> {
        let path = entry.path();
        let file_type = entry.file_type();

        if file_type.is_dir() {
            return None;
        }

        if file_type.is_symlink() {
            return self.process_symlink(path, canonical_root, exclusions, hardlink_tracker);
        }

        if !file_type.is_file() {
            log::trace!("Skipping special file: {}", path.display());
            return None;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => return Some(Err(self.handle_walkdir_error(e))),
        };

        self.process_file_entry(path.to_path_buf(), None, &metadata, exclusions, hardlink_tracker)
    }

    /// Resolve a symlink: files inside the root are reported, everything
    /// else is skipped.
    ///
    /// The reported target is the root as given joined with the target's
    /// path below the canonical root, so it reads like any other entry.
    fn process_symlink(
        &self,
        path: &Path,
        canonical_root: Option<&Path>,
        exclusions: &Exclusions,
        hardlink_tracker: &mut HardlinkTracker,
    ) -> Option<Result<FileEntry, ScanError>> {
        let metadata = match fs::metadata(path) {
            Ok(m) => m,
            Err(e) => {
                log::debug!("Skipping dangling symlink {}: {}", path.display(), e);
                return None;
            }
        };

        if metadata.is_dir() {
            log::trace!("Not following symlinked directory: {}", path.display());
            return None;
        }
        if !metadata.is_file() {
            return None;
        }

        let canonical_root = canonical_root?;
        let target = match fs::canonicalize(path) {
            Ok(t) => t,
            Err(e) => return Some(Err(ScanError::from_io(path, e))),
        };
        let Ok(below_root) = target.strip_prefix(canonical_root) else {
            log::debug!(
                "Skipping symlink that leaves the root: {} -> {}",
                path.display(),
                target.display()
            );
            return None;
        };
        let target = self.root.join(below_root);

        self.process_file_entry(
            path.to_path_buf(),
            Some(target),
            &metadata,
            exclusions,
            hardlink_tracker,
        )
    }

    /// Apply filters and hardlink detection to a regular file.
    fn process_file_entry(
        &self,
        path: PathBuf,
        target: Option<PathBuf>,
        metadata: &Metadata,
        exclusions: &Exclusions,
        hardlink_tracker: &mut HardlinkTracker,
    ) -> Option<Result<FileEntry, ScanError>> {
        let size = metadata.len();

        if exclusions.contains(target.as_deref().unwrap_or(&path), metadata) {
            log::debug!("Skipping excluded file: {}", path.display());
            return None;
        }

        if let Some(min) = self.config.min_size {
            if size < min {
                log::trace!(
                    "Skipping file due to size filter ({}): {}",
                    size,
                    path.display()
                );
                return None;
            }
        }

        if hardlink_tracker.is_hardlink(metadata) {
            log::debug!("Skipping already-linked file: {}", path.display());
            return None;
        }

        Some(Ok(FileEntry {
            path,
            size,
            is_symlink: target.is_some(),
            target,
        }))
    }

    /// Convert a walkdir error into a non-fatal scan error.
    fn handle_walkdir_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);

        let scan_error = match error.into_io_error() {
            Some(io_err) => ScanError::from_io(&path, io_err),
            None => ScanError::Io {
                path: path.clone(),
                source: std::io::Error::other("filesystem loop detected"),
            },
        };

        match &scan_error {
            ScanError::NotFound(p) => {
                log::debug!("Path not found (may have been deleted): {}", p.display());
            }
            other => log::warn!("{}", other),
        }
        scan_error
    }
}

/// Names starting with `.` are hidden.
fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}
