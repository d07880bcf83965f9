//! Audit log of substitutions.
//!
//! # Overview
//!
//! Every substitution is recorded as a [`LogEntry`]. Entries are buffered in
//! memory, up to a fixed capacity, and written to the log file when the
//! session ends. When the buffer is full the oldest entry is dropped; a
//! diagnostic at flush time says how many were lost.
//!
//! The log file is opened in append mode when the [`ActionLog`] is created,
//! so an unwritable log location is reported before any file is touched.
//! Prior runs' entries are never truncated.
//!
//! # Format
//!
//! One line per entry:
//!
//! ```text
//! Duplicate: <duplicate path> -> <representative path>
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default number of entries held in memory.
pub const DEFAULT_LOG_CAPACITY: usize = 10_000;

/// Default log file location, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "duplicate_log.txt";

/// Errors from the action log.
#[derive(thiserror::Error, Debug)]
pub enum ActionLogError {
    /// The log file could not be opened for appending.
    #[error("cannot open log file {path}: {source}")]
    Open {
        /// Log file path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Buffered entries could not be written.
    #[error("cannot write log file {path}: {source}")]
    Write {
        /// Log file path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// One recorded substitution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Path that was replaced by a hard link
    pub duplicate: PathBuf,
    /// Path it now shares storage with
    pub representative: PathBuf,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Duplicate: {} -> {}",
            self.duplicate.display(),
            self.representative.display()
        )
    }
}

/// Bounded, append-only buffer of [`LogEntry`] values backed by a file.
#[derive(Debug)]
pub struct ActionLog {
    sink: Option<(PathBuf, File)>,
    buffer: VecDeque<LogEntry>,
    capacity: usize,
    evicted: usize,
}

impl ActionLog {
    /// Open (creating if needed) `path` for appending.
    ///
    /// # Errors
    ///
    /// Returns [`ActionLogError::Open`] if the file cannot be opened.
    pub fn open(path: &Path, capacity: usize) -> Result<Self, ActionLogError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| ActionLogError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        log::debug!("Action log: {}", path.display());
        let mut log = Self::in_memory(capacity);
        log.sink = Some((path.to_path_buf(), file));
        Ok(log)
    }

    /// A log that buffers entries but never writes them anywhere.
    ///
    /// Used for dry runs.
    #[must_use]
    pub fn in_memory(capacity: usize) -> Self {
        Self {
            sink: None,
            buffer: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            evicted: 0,
        }
    }

    /// Append an entry, evicting the oldest one if the buffer is full.
    pub fn record(&mut self, duplicate: &Path, representative: &Path) {
        if self.capacity == 0 {
            self.evicted += 1;
            return;
        }
        if self.buffer.len() == self.capacity {
            self.buffer.pop_front();
            self.evicted += 1;
        }
        self.buffer.push_back(LogEntry {
            duplicate: duplicate.to_path_buf(),
            representative: representative.to_path_buf(),
        });
    }

    /// Entries waiting to be flushed, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.buffer.iter()
    }

    /// Number of entries waiting to be flushed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing is waiting to be flushed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Entries dropped because the buffer was full.
    #[must_use]
    pub fn evicted(&self) -> usize {
        self.evicted
    }

    /// Log file path, or `None` for an in-memory log.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.sink.as_ref().map(|(p, _)| p.as_path())
    }

    /// Write all buffered entries to the log file and empty the buffer.
    ///
    /// Each entry is written at most once; calling `flush` again with no
    /// new entries writes nothing. For an in-memory log the buffer is
    /// simply cleared.
    ///
    /// Returns the number of entries written.
    ///
    /// # Errors
    ///
    /// Returns [`ActionLogError::Write`] if the file write fails. The
    /// buffered entries are discarded either way.
    pub fn flush(&mut self) -> Result<usize, ActionLogError> {
        if self.evicted > 0 {
            log::warn!(
                "Action log buffer overflowed: {} oldest entries were not kept",
                self.evicted
            );
        }

        let entries: Vec<LogEntry> = self.buffer.drain(..).collect();
        let Some((path, file)) = self.sink.as_mut() else {
            return Ok(0);
        };
        if entries.is_empty() {
            return Ok(0);
        }

        let mut text = String::new();
        for entry in &entries {
            text.push_str(&entry.to_string());
            text.push('\n');
        }

        file.write_all(text.as_bytes())
            .and_then(|()| file.flush())
            .map_err(|source| ActionLogError::Write {
                path: path.clone(),
                source,
            })?;

        log::debug!("Wrote {} entries to {}", entries.len(), path.display());
        Ok(entries.len())
    }
}

impl Drop for ActionLog {
    fn drop(&mut self) {
        if self.sink.is_some() && !self.buffer.is_empty() {
            if let Err(e) = self.flush() {
                log::error!("{}", e);
            }
        }
    }
}
