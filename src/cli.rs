//! Command-line interface definitions for linkdupe.
//!
//! This module defines all CLI arguments and options using the clap derive
//! API. There are no subcommands: linkdupe takes exactly one directory.
//!
//! # Example
//!
//! ```bash
//! # Replace every duplicate under ~/Photos with a hard link
//! linkdupe ~/Photos
//!
//! # See what would happen without touching anything
//! linkdupe --dry-run ~/Photos
//!
//! # Only consider files of 1 MiB or more, skipping hidden entries
//! linkdupe --min-size 1MiB --skip-hidden ~/Photos
//!
//! # Verbose mode for debugging
//! linkdupe -v ~/Photos
//! ```

use clap::Parser;
use std::path::PathBuf;

use crate::scanner::FingerprintAlgorithm;

/// Replace duplicate files with hard links to a single copy.
///
/// linkdupe walks a directory tree, fingerprints every regular file and
/// replaces each later copy of the same content with a hard link to the
/// first one. Every substitution is appended to an action log.
#[derive(Debug, Parser)]
#[command(name = "linkdupe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to deduplicate
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (TOML)
    ///
    /// Defaults to config.toml in the platform configuration directory.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Action log file (appended to, never truncated)
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Maximum number of log entries kept in memory before the oldest are dropped
    #[arg(long, value_name = "N")]
    pub log_capacity: Option<usize>,

    /// Content fingerprint algorithm
    #[arg(long, value_enum)]
    pub algorithm: Option<FingerprintAlgorithm>,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Minimum file size to consider (e.g., 1KB, 1MB, 1GB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Glob patterns to ignore (can be specified multiple times)
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Also skip whatever the .gitignore at the root of PATH matches
    #[arg(long)]
    pub respect_gitignore: bool,

    /// Report what would be linked without changing any file or writing the log
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use linkdupe::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
