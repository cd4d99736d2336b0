use std::sync::atomic::{AtomicBool, Ordering};

use console::Term;

/// Global shutdown flag, checked by the harvester between identifiers.
static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// The flag to hand to [`gleaner::harvest::Harvester::with_stop_flag`].
pub(crate) fn stop_flag() -> &'static AtomicBool {
    &SHUTDOWN_REQUESTED
}

#[inline]
fn request_shutdown() {
    SHUTDOWN_REQUESTED.store(true, Ordering::Release);
}

/// Set up the Ctrl+C handler for graceful shutdown.
///
/// The first Ctrl+C lets the identifier in flight finish so no record is
/// left half written; a second one exits immediately.
pub(crate) fn setup_shutdown_handler() {
    tokio::spawn(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            return;
        }

        let is_tty = Term::stdout().is_term();
        if is_tty {
            eprintln!("\n\nShutdown requested, finishing the current repository...");
            eprintln!("Press Ctrl+C again to force quit.");
        } else {
            tracing::warn!("Shutdown requested, finishing the current repository");
        }

        request_shutdown();

        if tokio::signal::ctrl_c().await.is_ok() {
            if is_tty {
                eprintln!("Force quit!");
            }
            std::process::exit(130);
        }
    });
}
