//! Signal handling for graceful server shutdown.
//!
//! Provides cross-platform signal handling so the server can shut down
//! gracefully when receiving termination signals.

use session_core::ShutdownState;
use tokio::signal;
use tracing::info;

/// Sets up graceful shutdown signal handling for the application.
///
/// Listens for termination signals (SIGINT, SIGTERM on Unix; Ctrl+C on
/// Windows) and returns when one is received, along with a shutdown state
/// for coordinating graceful shutdown across components.
///
/// # Returns
///
/// `Ok(shutdown_state)` when a shutdown signal is received, or an error if
/// signal handling setup failed.
pub async fn setup_signal_handlers() -> Result<ShutdownState, Box<dyn std::error::Error>> {
    let shutdown_state = ShutdownState::new();

    #[cfg(unix)]
    {
        use signal::unix::{signal, SignalKind};

        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = sigint.recv() => (),
            _ = sigterm.recv() => ()
        }
    }

    #[cfg(windows)]
    signal::ctrl_c().await?;

    shutdown_state.initiate_shutdown();
    info!("📡 Received shutdown signal - initiating graceful shutdown");
    Ok(shutdown_state)
}
