//! Ctrl+C handling.
//!
//! An interrupt must not lose the substitutions already made, so the hook
//! installed here only raises a flag. The walker stops at the next entry,
//! the session returns with `interrupted` set, and `run_app` still flushes
//! the action log before exiting with code 130.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Flag raised by the Ctrl+C hook.
#[derive(Debug, Clone)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Whether Ctrl+C has been pressed since the handler was handed out.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// The shared flag, for [`crate::dedupe::ScanSession::with_shutdown_flag`].
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

/// The Ctrl+C hook could not be installed.
#[derive(Debug, thiserror::Error)]
#[error("Failed to install signal handler: {0}")]
pub struct SignalError(#[from] ctrlc::Error);

static INSTALLED: OnceLock<Arc<AtomicBool>> = OnceLock::new();

/// Install the Ctrl+C hook, or reuse the one already installed.
///
/// The process-wide hook can only be set once, so later calls hand out the
/// same flag, lowered again for the new run.
///
/// # Errors
///
/// Returns [`SignalError`] if a Ctrl+C hook was registered elsewhere.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(flag) = INSTALLED.get() {
        flag.store(false, Ordering::SeqCst);
        return Ok(ShutdownHandler {
            flag: Arc::clone(flag),
        });
    }

    let flag = Arc::new(AtomicBool::new(false));
    let raised = Arc::clone(&flag);
    let installed = ctrlc::set_handler(move || {
        raised.store(true, Ordering::SeqCst);
        let _ = writeln!(std::io::stderr(), "\nInterrupted. Flushing action log...");
        log::info!("Shutdown signal received");
    });

    match (installed, INSTALLED.get()) {
        (Ok(()), _) => {
            let flag = INSTALLED.get_or_init(|| flag);
            Ok(ShutdownHandler {
                flag: Arc::clone(flag),
            })
        }
        // Another thread won the race to install the same hook
        (Err(_), Some(existing)) => Ok(ShutdownHandler {
            flag: Arc::clone(existing),
        }),
        (Err(e), None) => Err(SignalError(e)),
    }
}
