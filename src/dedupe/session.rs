//! Scan sessions: walking a tree and deduplicating it in one pass.
//!
//! # Overview
//!
//! A [`ScanSession`] owns the root path and a fresh [`DuplicateIndex`].
//! [`ScanSession::run`] walks the tree depth-first and, for each regular
//! file:
//!
//! 1. fingerprints it,
//! 2. registers it as representative if the fingerprint is new,
//! 3. otherwise replaces it with a hard link to the representative and
//!    records the substitution in the [`ActionLog`].
//!
//! Running consumes the session, so the index never outlives the scan.
//! The action log's own file is never scanned, even when it lives inside
//! the tree.
//!
//! # Example
//!
//! ```no_run
//! use linkdupe::action_log::ActionLog;
//! use linkdupe::dedupe::{process_directory, SessionConfig};
//! use std::path::Path;
//!
//! let mut log = ActionLog::open(Path::new("duplicate_log.txt"), 10_000)?;
//! let summary = process_directory(Path::new("/srv/photos"), &SessionConfig::default(), &mut log)?;
//! println!("{} files linked", summary.substitutions);
//! log.flush()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::index::DuplicateIndex;
use super::substitute::{HardLinker, Linker, SubstituteError, SubstituteOutcome, Substituter};
use crate::action_log::ActionLog;
use crate::progress::ProgressCallback;
use crate::scanner::{
    FingerprintAlgorithm, FingerprintError, Fingerprinter, ScanError, Walker, WalkerConfig,
    DEFAULT_CHUNK_SIZE,
};

/// Errors that prevent a session from starting.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    /// The root does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The root exists but is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The root could not be inspected.
    #[error("Cannot access {path}: {source}")]
    Io {
        /// The root path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Settings for one scan session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Filters applied while walking
    pub walker: WalkerConfig,
    /// Fingerprint algorithm
    pub algorithm: FingerprintAlgorithm,
    /// Read size used while fingerprinting
    pub chunk_size: usize,
    /// Report substitutions without performing them
    pub dry_run: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            walker: WalkerConfig::default(),
            algorithm: FingerprintAlgorithm::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            dry_run: false,
        }
    }
}

impl SessionConfig {
    /// Set walker filters.
    #[must_use]
    pub fn with_walker(mut self, walker: WalkerConfig) -> Self {
        self.walker = walker;
        self
    }

    /// Set the fingerprint algorithm.
    #[must_use]
    pub fn with_algorithm(mut self, algorithm: FingerprintAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Enable or disable dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Build the fingerprinter these settings describe.
    #[must_use]
    pub fn fingerprinter(&self) -> Fingerprinter {
        Fingerprinter::new(self.algorithm).with_chunk_size(self.chunk_size)
    }
}

/// A duplicate that was (or, in a dry run, would have been) replaced.
///
/// Both paths are spelled under the root as it was given to the session.
/// When the walk reached a file through a symlink, `duplicate` names the
/// file the symlink resolves to, since that is the entry that was replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstitutionEvent {
    /// Path now linked to the representative
    pub duplicate: PathBuf,
    /// The representative
    pub representative: PathBuf,
    /// Bytes freed by the substitution
    pub size: u64,
}

/// Outcome of a completed (or interrupted) session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Regular files reported by the walker
    pub files_visited: usize,
    /// Files registered as representatives
    pub unique_files: usize,
    /// Duplicates replaced by hard links
    pub substitutions: usize,
    /// Total size of the replaced duplicates
    pub bytes_reclaimed: u64,
    /// Entries skipped because they could not be inspected or read
    pub skipped: usize,
    /// Substitutions abandoned because linking failed
    pub link_failures: usize,
    /// Substitutions abandoned because the representative vanished or changed
    pub representative_missing: usize,
    /// Substitutions abandoned because the duplicate changed mid-way
    pub content_changed: usize,
    /// Whether the walk stopped early on a shutdown request
    pub interrupted: bool,
    /// Whether this was a dry run
    pub dry_run: bool,
    /// Every substitution, in the order it happened
    pub events: Vec<SubstitutionEvent>,
}

impl ScanSummary {
    /// Number of substitutions that were attempted but abandoned.
    #[must_use]
    pub fn abandoned(&self) -> usize {
        self.link_failures + self.representative_missing + self.content_changed
    }
}

/// One scan of one directory tree.
pub struct ScanSession {
    root: PathBuf,
    config: SessionConfig,
    index: DuplicateIndex,
    linker: Box<dyn Linker>,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl ScanSession {
    /// Create a session rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] if `root` is missing, unreadable, or not
    /// a directory.
    pub fn new(root: &Path, config: SessionConfig) -> Result<Self, SessionError> {
        let metadata = fs::metadata(root).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SessionError::PathNotFound(root.to_path_buf())
            } else {
                SessionError::Io {
                    path: root.to_path_buf(),
                    source: e,
                }
            }
        })?;
        if !metadata.is_dir() {
            return Err(SessionError::NotADirectory(root.to_path_buf()));
        }

        Ok(Self {
            root: root.to_path_buf(),
            config,
            index: DuplicateIndex::new(),
            linker: Box::new(HardLinker),
            shutdown_flag: None,
        })
    }

    /// Use `linker` for filesystem changes instead of the default.
    #[must_use]
    pub fn with_linker(mut self, linker: Box<dyn Linker>) -> Self {
        self.linker = linker;
        self
    }

    /// Stop walking once `flag` becomes `true`.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Walk the tree and deduplicate it.
    ///
    /// Individual failures are logged and counted in the summary; nothing
    /// short of a shutdown request stops the walk.
    pub fn run(self, log: &mut ActionLog, progress: Option<&dyn ProgressCallback>) -> ScanSummary {
        let Self {
            root,
            config,
            mut index,
            linker,
            shutdown_flag,
        } = self;

        let fingerprinter = config.fingerprinter();
        let substituter = Substituter::new(&fingerprinter, linker.as_ref()).with_dry_run(config.dry_run);

        let mut walker_config = config.walker.clone();
        if let Some(path) = log.path() {
            walker_config = walker_config.with_excluded(path.to_path_buf());
        }
        let mut walker = Walker::new(&root, walker_config);
        if let Some(flag) = &shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        let mut summary = ScanSummary {
            dry_run: config.dry_run,
            ..ScanSummary::default()
        };

        log::info!(
            "Scanning {} ({} fingerprints{})",
            root.display(),
            fingerprinter.algorithm(),
            if config.dry_run { ", dry run" } else { "" }
        );
        if let Some(p) = progress {
            p.on_start(&root);
        }

        for item in walker.walk() {
            let entry = match item {
                Ok(entry) => entry,
                Err(ScanError::NotFound(_)) => continue,
                Err(_) => {
                    summary.skipped += 1;
                    continue;
                }
            };

            summary.files_visited += 1;
            if let Some(p) = progress {
                p.on_file(summary.files_visited, &entry.path);
            }

            let source = entry.link_source();
            let fingerprint = match fingerprinter.fingerprint(source) {
                Ok(fp) => fp,
                Err(e) => {
                    report_unreadable(&e);
                    summary.skipped += 1;
                    continue;
                }
            };

            let Some(representative) = index.lookup(&fingerprint).map(Path::to_path_buf) else {
                match index.register(fingerprint, source.to_path_buf()) {
                    Ok(()) => summary.unique_files += 1,
                    Err(e) => log::error!("{}", e),
                }
                continue;
            };

            match substituter.substitute(source, &representative, &fingerprint) {
                Ok(SubstituteOutcome::Linked | SubstituteOutcome::DryRun) => {
                    let event = SubstitutionEvent {
                        duplicate: source.to_path_buf(),
                        representative,
                        size: entry.size,
                    };
                    log.record(&event.duplicate, &event.representative);
                    summary.substitutions += 1;
                    summary.bytes_reclaimed += event.size;
                    if let Some(p) = progress {
                        p.on_substitution(&event);
                    }
                    summary.events.push(event);
                }
                Ok(SubstituteOutcome::AlreadyLinked) => {
                    log::debug!(
                        "{} already shares storage with {}",
                        source.display(),
                        representative.display()
                    );
                }
                Err(e) => {
                    log::warn!("{}", e);
                    match e {
                        SubstituteError::LinkFailed { .. } => summary.link_failures += 1,
                        SubstituteError::RepresentativeMissing(_)
                        | SubstituteError::RepresentativeChanged(_) => {
                            summary.representative_missing += 1;
                        }
                        SubstituteError::ContentChanged(_) => summary.content_changed += 1,
                    }
                }
            }
        }

        summary.interrupted = shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst));
        if summary.interrupted {
            log::info!("Scan interrupted after {} files", summary.files_visited);
        }

        log::debug!(
            "Scan of {} done: {} files, {} unique, {} substitutions",
            root.display(),
            summary.files_visited,
            index.len(),
            summary.substitutions
        );
        if let Some(p) = progress {
            p.on_finish(&summary);
        }
        summary
    }
}

/// Emit the diagnostic for a file that could not be fingerprinted.
fn report_unreadable(error: &FingerprintError) {
    if error.kind() == std::io::ErrorKind::NotFound {
        log::debug!("{}", error);
    } else {
        log::warn!("{}", error);
    }
}

/// Scan and deduplicate `path` with a fresh session.
///
/// Each call starts from an empty index, so calling it again over the same
/// tree only finds what changed since: already-linked files are skipped.
///
/// # Errors
///
/// Returns a [`SessionError`] if `path` is not a usable directory.
pub fn process_directory(
    path: &Path,
    config: &SessionConfig,
    log: &mut ActionLog,
) -> Result<ScanSummary, SessionError> {
    let session = ScanSession::new(path, config.clone())?;
    Ok(session.run(log, None))
}
