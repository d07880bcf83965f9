//! Replacing a duplicate file with a hard link to its representative.
//!
//! # Protocol
//!
//! The duplicate's directory entry is never removed before its replacement
//! exists. A substitution runs in this order:
//!
//! 1. The representative must still exist as a regular file and still
//!    fingerprint to the value it was indexed under.
//! 2. A hard link to the representative is created under a temporary name
//!    next to the duplicate (same directory, so same filesystem).
//! 3. The temporary link is checked to share the representative's inode,
//!    and the duplicate is checked to still hold the expected content.
//! 4. The temporary link is renamed over the duplicate. `rename` replaces
//!    the target atomically, so at every instant the duplicate's path names
//!    either the old content or the identical linked content.
//!
//! Any failure before step 4 completes removes the temporary link and leaves
//! the duplicate untouched.
//!
//! The filesystem calls go through the [`Linker`] trait so tests can force
//! individual steps to fail.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::scanner::hardlink::same_inode;
use crate::scanner::{Fingerprint, Fingerprinter, TEMP_LINK_MARKER};

/// How many temporary names to try before giving up.
const MAX_TEMP_ATTEMPTS: u32 = 16;

/// Process-wide counter so temporary names never repeat.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Filesystem operations used by the substitution protocol.
pub trait Linker {
    /// Create `link` as a new hard link to `original`.
    fn hard_link(&self, original: &Path, link: &Path) -> io::Result<()>;

    /// Atomically rename `from` to `to`, replacing `to`.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Name of this linker (for logging).
    fn name(&self) -> &'static str;
}

/// [`Linker`] backed by `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HardLinker;

impl Linker for HardLinker {
    fn hard_link(&self, original: &Path, link: &Path) -> io::Result<()> {
        fs::hard_link(original, link)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn name(&self) -> &'static str {
        "hardlink"
    }
}

/// Why a substitution did not happen.
///
/// Every variant is non-fatal and guarantees the duplicate is unchanged.
#[derive(thiserror::Error, Debug)]
pub enum SubstituteError {
    /// The link could not be created or put in place.
    #[error("cannot link {duplicate} to {representative}: {source}")]
    LinkFailed {
        /// File that was meant to be replaced
        duplicate: PathBuf,
        /// File it was meant to link to
        representative: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The representative disappeared after it was indexed.
    #[error("representative {0} no longer exists")]
    RepresentativeMissing(PathBuf),

    /// The representative's content no longer matches its fingerprint.
    #[error("representative {0} changed since it was indexed")]
    RepresentativeChanged(PathBuf),

    /// The duplicate itself changed before it could be replaced.
    #[error("{0} changed during substitution")]
    ContentChanged(PathBuf),
}

impl SubstituteError {
    fn link_failed(duplicate: &Path, representative: &Path, source: io::Error) -> Self {
        Self::LinkFailed {
            duplicate: duplicate.to_path_buf(),
            representative: representative.to_path_buf(),
            source,
        }
    }
}

/// What a successful call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstituteOutcome {
    /// The duplicate is now a hard link to the representative.
    Linked,
    /// Both paths already named the same inode; nothing was changed.
    AlreadyLinked,
    /// Checks passed but no change was made because of dry-run mode.
    DryRun,
}

/// Runs the substitution protocol.
pub struct Substituter<'a> {
    fingerprinter: &'a Fingerprinter,
    linker: &'a dyn Linker,
    dry_run: bool,
}

impl<'a> Substituter<'a> {
    /// Create a substituter using `linker` for filesystem changes.
    #[must_use]
    pub fn new(fingerprinter: &'a Fingerprinter, linker: &'a dyn Linker) -> Self {
        Self {
            fingerprinter,
            linker,
            dry_run: false,
        }
    }

    /// Verify but never modify anything.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Replace `duplicate` with a hard link to `representative`.
    ///
    /// `expected` is the fingerprint both files were found to share.
    ///
    /// # Errors
    ///
    /// See [`SubstituteError`]. On every error path the duplicate is left
    /// exactly as it was.
    pub fn substitute(
        &self,
        duplicate: &Path,
        representative: &Path,
        expected: &Fingerprint,
    ) -> Result<SubstituteOutcome, SubstituteError> {
        self.verify_representative(duplicate, representative, expected)?;

        match same_inode(duplicate, representative) {
            Ok(Some(true)) => return Ok(SubstituteOutcome::AlreadyLinked),
            Ok(_) => {}
            Err(e) => return Err(SubstituteError::link_failed(duplicate, representative, e)),
        }

        if self.dry_run {
            return Ok(SubstituteOutcome::DryRun);
        }

        let temp = self.link_to_temp(duplicate, representative)?;

        if let Err(e) = self.verify_link(&temp, representative, expected) {
            discard_temp(&temp);
            return Err(SubstituteError::link_failed(duplicate, representative, e));
        }

        if let Err(e) = self.verify_duplicate(duplicate, representative, expected) {
            discard_temp(&temp);
            return Err(e);
        }

        if let Err(e) = self.linker.rename(&temp, duplicate) {
            discard_temp(&temp);
            return Err(SubstituteError::link_failed(duplicate, representative, e));
        }

        log::debug!(
            "Linked {} -> {} via {}",
            duplicate.display(),
            representative.display(),
            self.linker.name()
        );
        Ok(SubstituteOutcome::Linked)
    }

    /// The representative must still be the file that was indexed.
    fn verify_representative(
        &self,
        duplicate: &Path,
        representative: &Path,
        expected: &Fingerprint,
    ) -> Result<(), SubstituteError> {
        match fs::metadata(representative) {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(SubstituteError::RepresentativeMissing(representative.into())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SubstituteError::RepresentativeMissing(representative.into()));
            }
            Err(e) => return Err(SubstituteError::link_failed(duplicate, representative, e)),
        }

        match self.fingerprinter.fingerprint(representative) {
            Ok(actual) if actual == *expected => Ok(()),
            Ok(_) => Err(SubstituteError::RepresentativeChanged(representative.into())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(SubstituteError::RepresentativeMissing(representative.into()))
            }
            Err(e) => Err(SubstituteError::link_failed(
                duplicate,
                representative,
                io::Error::new(e.kind(), e.to_string()),
            )),
        }
    }

    /// The duplicate must still hold the content about to be replaced.
    fn verify_duplicate(
        &self,
        duplicate: &Path,
        representative: &Path,
        expected: &Fingerprint,
    ) -> Result<(), SubstituteError> {
        match self.fingerprinter.fingerprint(duplicate) {
            Ok(actual) if actual == *expected => Ok(()),
            Ok(_) => Err(SubstituteError::ContentChanged(duplicate.into())),
            Err(e) => Err(SubstituteError::link_failed(
                duplicate,
                representative,
                io::Error::new(e.kind(), e.to_string()),
            )),
        }
    }

    /// Create a hard link to the representative under a fresh temporary
    /// name in the duplicate's directory.
    fn link_to_temp(&self, duplicate: &Path, representative: &Path) -> Result<PathBuf, SubstituteError> {
        let mut last_err = None;

        for _ in 0..MAX_TEMP_ATTEMPTS {
            let temp = temp_path_for(duplicate);
            match self.linker.hard_link(representative, &temp) {
                Ok(()) => return Ok(temp),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    log::trace!("Temporary name taken, retrying: {}", temp.display());
                    last_err = Some(e);
                }
                Err(e) => return Err(SubstituteError::link_failed(duplicate, representative, e)),
            }
        }

        Err(SubstituteError::link_failed(
            duplicate,
            representative,
            last_err.unwrap_or_else(|| io::Error::other("no free temporary name")),
        ))
    }

    /// The temporary link must share the representative's storage.
    fn verify_link(&self, temp: &Path, representative: &Path, expected: &Fingerprint) -> io::Result<()> {
        match same_inode(temp, representative)? {
            Some(true) => Ok(()),
            Some(false) => Err(io::Error::other(format!(
                "{} does not share the representative's inode",
                temp.display()
            ))),
            // No inode information: fall back to comparing content
            None => {
                let actual = self
                    .fingerprinter
                    .fingerprint(temp)
                    .map_err(|e| io::Error::new(e.kind(), e.to_string()))?;
                if actual == *expected {
                    Ok(())
                } else {
                    Err(io::Error::other(format!(
                        "{} does not match the representative's content",
                        temp.display()
                    )))
                }
            }
        }
    }
}

/// Temporary sibling name for `duplicate`.
fn temp_path_for(duplicate: &Path) -> PathBuf {
    let name = duplicate
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    duplicate.with_file_name(format!(
        ".{}{}{}-{}.tmp",
        name,
        TEMP_LINK_MARKER,
        std::process::id(),
        n
    ))
}

/// Best-effort removal of a temporary link that will not be used.
fn discard_temp(temp: &Path) {
    if let Err(e) = fs::remove_file(temp) {
        if e.kind() != io::ErrorKind::NotFound {
            log::warn!("Failed to remove temporary link {}: {}", temp.display(), e);
        }
    }
}
