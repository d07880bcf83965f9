//! linkdupe - Hard-link Duplicate File Deduplicator
//!
//! Walks a directory tree, fingerprints every regular file (BLAKE3 or
//! SHA-256) and replaces each later copy of already-seen content with a hard
//! link to the first copy. Substitutions never remove a duplicate before its
//! replacement link exists, and each one is recorded in an append-only
//! action log.

pub mod action_log;
pub mod cli;
pub mod config;
pub mod dedupe;
pub mod error;
pub mod logging;
pub mod progress;
pub mod scanner;
pub mod signal;

use anyhow::Context;

use crate::action_log::ActionLog;
use crate::cli::Cli;
use crate::config::Config;
use crate::dedupe::ScanSession;
use crate::error::ExitCode;
use crate::progress::Progress;

/// Run one deduplication pass as described by `cli`.
///
/// Returns [`ExitCode::Interrupted`] if Ctrl+C stopped the scan, otherwise
/// [`ExitCode::Success`], however many substitutions were made or
/// abandoned.
///
/// # Errors
///
/// Fails if the configuration cannot be loaded, the root is not a usable
/// directory, or the action log cannot be opened.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let config = Config::load(&cli).context("Failed to load configuration")?;
    log::debug!("Configuration: {:?}", config);

    let mut session = ScanSession::new(&cli.path, config.session_config())
        .with_context(|| format!("Cannot scan {}", cli.path.display()))?;

    let mut action_log = if config.dry_run {
        ActionLog::in_memory(config.log_capacity)
    } else {
        ActionLog::open(&config.log_file, config.log_capacity)
            .context("Cannot open action log")?
    };

    let shutdown = match signal::install_handler() {
        Ok(handler) => {
            session = session.with_shutdown_flag(handler.get_flag());
            Some(handler)
        }
        Err(e) => {
            log::warn!("{}; Ctrl+C will not flush the action log", e);
            None
        }
    };

    let progress = Progress::new(cli.quiet);
    let summary = session.run(&mut action_log, Some(&progress));

    match action_log.flush() {
        Ok(written) => log::debug!("Action log: {} new entries", written),
        Err(e) => log::error!("{}; substitutions were only reported on the console", e),
    }

    progress.print_summary(&summary);

    let interrupted =
        summary.interrupted || shutdown.is_some_and(|h| h.is_shutdown_requested());
    Ok(if interrupted {
        ExitCode::Interrupted
    } else {
        ExitCode::Success
    })
}
