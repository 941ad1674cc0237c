use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Cancels the returned token on Ctrl+C or SIGTERM.
///
/// In-flight history fetches observe the token between pages and during
/// pacing; the HTTP server uses it for graceful shutdown.
pub fn setup_signal_handler() -> Result<CancellationToken> {
    let token = CancellationToken::new();
    let handle = token.clone();

    ctrlc::set_handler(move || {
        if handle.is_cancelled() {
            eprintln!("\nForced exit");
            std::process::exit(130);
        }
        warn!("interrupt received, stopping");
        handle.cancel();
    })
    .context("Error setting Ctrl-C handler")?;

    Ok(token)
}
