//! Console reporting using indicatif.
//!
//! This module provides the [`Progress`] struct which implements
//! [`ProgressCallback`] to show a spinner on stderr while a scan runs and
//! print one line per substitution on stdout.
//!
//! The substitution lines use the same `Duplicate: <dup> -> <rep>` format as
//! the action log, so console output mirrors the log file.

use std::path::Path;
use std::time::Duration;

use bytesize::ByteSize;
use indicatif::{ProgressBar, ProgressStyle};
use yansi::Paint;

use crate::action_log::LogEntry;
use crate::dedupe::{ScanSummary, SubstitutionEvent};

/// Receives progress updates from a scan session.
pub trait ProgressCallback {
    /// Called once before the walk starts.
    fn on_start(&self, _root: &Path) {}

    /// Called for each file reported by the walker.
    ///
    /// # Arguments
    ///
    /// * `visited` - Files seen so far, including this one
    /// * `path` - Path being processed
    fn on_file(&self, visited: usize, path: &Path);

    /// Called after each substitution.
    fn on_substitution(&self, event: &SubstitutionEvent);

    /// Called once when the walk ends.
    fn on_finish(&self, _summary: &ScanSummary) {}
}

/// Spinner and substitution printer.
pub struct Progress {
    bar: ProgressBar,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is drawn or printed.
    ///
    /// # Examples
    ///
    /// ```
    /// use linkdupe::progress::Progress;
    ///
    /// let progress = Progress::new(true);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            let bar = ProgressBar::new_spinner();
            bar.set_style(Self::spinner_style());
            bar
        };
        Self { bar, quiet }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}] {pos} files")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
    }

    /// Print the end-of-scan summary to stdout.
    pub fn print_summary(&self, summary: &ScanSummary) {
        if self.quiet {
            return;
        }
        let headline = format_summary(summary);
        let problems = format_problems(summary);
        self.bar.suspend(|| {
            if summary.interrupted {
                println!("{}", headline.yellow().bold());
            } else {
                println!("{}", headline.green().bold());
            }
            if let Some(problems) = problems {
                println!("{}", problems.yellow());
            }
        });
    }
}

impl ProgressCallback for Progress {
    fn on_start(&self, root: &Path) {
        if self.quiet {
            return;
        }
        self.bar.set_message(format!("Scanning {}", root.display()));
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    fn on_file(&self, visited: usize, path: &Path) {
        if self.quiet {
            return;
        }
        self.bar.set_position(visited as u64);
        self.bar.set_message(truncate_path(path, 40));
    }

    fn on_substitution(&self, event: &SubstitutionEvent) {
        if self.quiet {
            return;
        }
        let line = LogEntry {
            duplicate: event.duplicate.clone(),
            representative: event.representative.clone(),
        };
        self.bar.suspend(|| println!("{}", line));
    }

    fn on_finish(&self, _summary: &ScanSummary) {
        self.bar.finish_and_clear();
    }
}

/// One-line description of what a scan did.
#[must_use]
pub fn format_summary(summary: &ScanSummary) -> String {
    let verb = if summary.dry_run {
        "Would link"
    } else {
        "Linked"
    };
    let noun = if summary.substitutions == 1 {
        "duplicate"
    } else {
        "duplicates"
    };
    let prefix = if summary.interrupted {
        "Interrupted. "
    } else {
        ""
    };

    format!(
        "{}{} {} {}, {} reclaimable ({} files scanned)",
        prefix,
        verb,
        summary.substitutions,
        noun,
        ByteSize::b(summary.bytes_reclaimed),
        summary.files_visited
    )
}

/// Description of skipped files and abandoned substitutions, if any.
#[must_use]
pub fn format_problems(summary: &ScanSummary) -> Option<String> {
    if summary.skipped == 0 && summary.abandoned() == 0 {
        return None;
    }
    Some(format!(
        "{} unreadable entries skipped, {} substitutions abandoned (run with -v for details)",
        summary.skipped,
        summary.abandoned()
    ))
}

/// Truncate a path for display in the spinner.
fn truncate_path(path: &Path, max_len: usize) -> String {
    let full = path.to_string_lossy();
    if full.chars().count() <= max_len {
        return full.into_owned();
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len + 4 > max_len {
        let tail: String = file_name
            .chars()
            .skip(name_len.saturating_sub(max_len.saturating_sub(3)))
            .collect();
        return format!("...{}", tail);
    }

    format!(".../{}", file_name)
}
