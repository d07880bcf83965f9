//! Duplicate detection and hard-link substitution.
//!
//! This module turns the scanner's stream of files into substitutions:
//! - [`index`]: fingerprint to representative mapping
//! - [`substitute`]: replacing a duplicate with a hard link, safely
//! - [`session`]: one walk over one tree, tying the pieces together
//!
//! # Example
//!
//! ```no_run
//! use linkdupe::action_log::ActionLog;
//! use linkdupe::dedupe::{ScanSession, SessionConfig};
//! use std::path::Path;
//!
//! let mut log = ActionLog::in_memory(100);
//! let session = ScanSession::new(Path::new("."), SessionConfig::default().with_dry_run(true))?;
//! let summary = session.run(&mut log, None);
//! for event in &summary.events {
//!     println!("{} -> {}", event.duplicate.display(), event.representative.display());
//! }
//! # Ok::<(), linkdupe::dedupe::SessionError>(())
//! ```

pub mod index;
pub mod session;
pub mod substitute;

pub use index::{DuplicateIndex, IndexError};
pub use session::{
    process_directory, ScanSession, ScanSummary, SessionConfig, SessionError, SubstitutionEvent,
};
pub use substitute::{HardLinker, Linker, SubstituteError, SubstituteOutcome, Substituter};
