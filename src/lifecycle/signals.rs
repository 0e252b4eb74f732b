//! OS signal handling.
//!
//! # Responsibilities
//! - Subscribe to SIGINT and SIGTERM (Ctrl-C on other platforms)
//! - Translate deliveries into `ShutdownSignal` values
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Subscriptions live in a `Signals` value owned by one `serve` call and
//!   are released when it is dropped
//! - A second SIGTERM/SIGINT during draining triggers forced shutdown
//!
//! # Limitations
//! - Tokio never uninstalls a process signal handler. Once the first `serve`
//!   call has registered, SIGINT and SIGTERM no longer terminate the process
//!   by default, even after `serve` returns. Deliveries with no live
//!   `Signals` value are dropped.

use std::fmt;
use std::io;

/// A termination request delivered to the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => f.write_str("SIGINT"),
            ShutdownSignal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Active signal subscriptions.
#[derive(Debug)]
pub struct Signals {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl Signals {
    #[cfg(unix)]
    pub fn register() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    #[cfg(not(unix))]
    pub fn register() -> io::Result<Self> {
        Ok(Self {})
    }

    /// Wait for the next termination signal.
    #[cfg(unix)]
    pub async fn recv(&mut self) -> ShutdownSignal {
        tokio::select! {
            Some(()) = self.interrupt.recv() => ShutdownSignal::Interrupt,
            Some(()) = self.terminate.recv() => ShutdownSignal::Terminate,
            else => std::future::pending().await,
        }
    }

    /// Wait for the next termination signal.
    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> ShutdownSignal {
        match tokio::signal::ctrl_c().await {
            Ok(()) => ShutdownSignal::Interrupt,
            Err(err) => {
                tracing::error!(error = %err, "Ctrl-C listener failed");
                std::future::pending().await
            }
        }
    }
}
