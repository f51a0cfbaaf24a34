//! Process shutdown signal.

use tokio::signal::unix::{SignalKind, signal};
use tokio_util::sync::CancellationToken;

/// Listen for SIGTERM and SIGINT.
///
/// Returns a token that is cancelled when either signal arrives. The HTTP
/// server drains on it; the pool is stopped afterwards by `main`.
pub fn install_shutdown_handler() -> std::io::Result<CancellationToken> {
    let token = CancellationToken::new();
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = sigterm.recv() => {
                tracing::info!(signal = "SIGTERM", "Received terminate, graceful shutdown");
            }
            _ = sigint.recv() => {
                tracing::info!(signal = "SIGINT", "Received interrupt, graceful shutdown");
            }
        }
        trigger.cancel();
    });

    Ok(token)
}
