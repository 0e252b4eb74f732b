//! Shutdown coordination for one `serve` call.
//!
//! ```text
//! token cancelled (caller or failed task) ─┐
//! first signal ────────────────────────────┴→ graceful_shutdown (stop accepting, drain)
//!     → server closed            → Ok
//!     → grace period elapsed     → force close, ShutdownTimeout
//!     → second signal            → force close, ForcedShutdown
//! ```

use std::time::Duration;

use axum_server::Handle;
use tokio_util::sync::CancellationToken;

use crate::lifecycle::serve::ServeError;
use crate::lifecycle::signals::Signals;

/// Latches shared by the two tasks of a `serve` call.
#[derive(Debug, Clone)]
pub(crate) struct Shutdown {
    /// Cancelled to begin shutdown.
    pub token: CancellationToken,
    /// Cancelled once the accept loop has stopped.
    pub closed: CancellationToken,
}

impl Shutdown {
    pub fn new(parent: &CancellationToken) -> Self {
        Self {
            token: parent.child_token(),
            closed: CancellationToken::new(),
        }
    }
}

/// Wait for a shutdown trigger, then drain the server within `grace`.
pub(crate) async fn drain(
    handle: Handle,
    shutdown: Shutdown,
    mut signals: Signals,
    grace: Duration,
) -> Result<(), ServeError> {
    tokio::select! {
        _ = shutdown.token.cancelled() => {
            tracing::info!("Shutdown requested");
        }
        signal = signals.recv() => {
            tracing::info!(signal = %signal, "Shutdown signal received");
            shutdown.token.cancel();
        }
        _ = shutdown.closed.cancelled() => {
            return Ok(());
        }
    }

    tracing::info!(grace = ?grace, connections = handle.connection_count(), "Draining connections");
    handle.graceful_shutdown(None);

    tokio::select! {
        _ = shutdown.closed.cancelled() => {
            tracing::info!("Server closed");
            Ok(())
        }
        _ = tokio::time::sleep(grace) => {
            tracing::warn!(
                grace = ?grace,
                connections = handle.connection_count(),
                "Shutdown grace period elapsed, closing connections"
            );
            handle.shutdown();
            Err(ServeError::ShutdownTimeout(grace))
        }
        signal = signals.recv() => {
            tracing::warn!(signal = %signal, "Second signal received, closing connections");
            handle.shutdown();
            Err(ServeError::ForcedShutdown(signal))
        }
    }
}
