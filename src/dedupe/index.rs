//! Fingerprint-to-representative index.
//!
//! The index maps each fingerprint seen in a session to the path of the
//! first file that produced it. Entries are only ever added: once a path is
//! the representative for a fingerprint it stays that way until the session
//! ends and the index is dropped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::scanner::Fingerprint;

/// Errors from [`DuplicateIndex::register`].
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum IndexError {
    /// The fingerprint already has a representative.
    #[error("fingerprint {fingerprint} already registered to {existing}")]
    AlreadyRegistered {
        /// The fingerprint being registered
        fingerprint: Fingerprint,
        /// The representative already on record
        existing: PathBuf,
    },
}

/// Mapping from fingerprint to representative path.
///
/// Holds no file handles; it is pure metadata owned by one scan session.
#[derive(Debug, Default)]
pub struct DuplicateIndex {
    representatives: HashMap<Fingerprint, PathBuf>,
}

impl DuplicateIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Representative registered for `fingerprint`, if any.
    #[must_use]
    pub fn lookup(&self, fingerprint: &Fingerprint) -> Option<&Path> {
        self.representatives.get(fingerprint).map(PathBuf::as_path)
    }

    /// Register `path` as the representative for `fingerprint`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::AlreadyRegistered`] if the fingerprint already
    /// has a representative; the existing mapping is left untouched.
    pub fn register(&mut self, fingerprint: Fingerprint, path: PathBuf) -> Result<(), IndexError> {
        use std::collections::hash_map::Entry;

        match self.representatives.entry(fingerprint) {
            Entry::Occupied(existing) => Err(IndexError::AlreadyRegistered {
                fingerprint,
                existing: existing.get().clone(),
            }),
            Entry::Vacant(slot) => {
                log::trace!("Representative for {:?}: {}", fingerprint, path.display());
                slot.insert(path);
                Ok(())
            }
        }
    }

    /// Number of registered fingerprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.representatives.len()
    }

    /// Whether nothing has been registered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.representatives.is_empty()
    }
}
