//! Diagnostic logging setup.
//!
//! Diagnostics (skipped files, failed links, missing representatives) go to
//! stderr through the `log` facade. They are kept apart from the action
//! log, which only ever holds substitutions.
//!
//! `RUST_LOG` wins when set. Otherwise `--quiet` means errors only, `-v`
//! debug, `-vv` trace, and the default is info.

use std::io::Write;

use env_logger::{Builder, Env};
use log::LevelFilter;

/// Install the stderr logger for the given `-v` count and `--quiet` flag.
///
/// Only the first call in a process has any effect.
pub fn init_logging(verbose: u8, quiet: bool) {
    let level = level_for(verbose, quiet);
    let env = Env::default().default_filter_or(level.to_string());

    // Debug builds add timestamps, and module paths too under -v
    let timestamps = cfg!(debug_assertions);
    let modules = timestamps && verbose > 0;

    let mut builder = Builder::from_env(env);
    builder.format(move |buf, record| {
        let style = buf.default_level_style(record.level());
        if timestamps {
            let now = buf.timestamp_seconds();
            write!(buf, "{now} ")?;
        }
        write!(buf, "{style}{:<5}{style:#} ", record.level())?;
        if modules {
            write!(buf, "[{}] ", record.module_path().unwrap_or("?"))?;
        }
        writeln!(buf, "{}", record.args())
    });

    if builder.try_init().is_ok() {
        log::debug!("Diagnostics enabled up to {}", log::max_level());
    }
}

fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}
