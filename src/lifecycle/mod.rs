//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! serve (serve.rs):
//!     options → validate → bind → spawn accept task + shutdown task → join
//!
//! Shutdown (shutdown.rs):
//!     trigger → stop accepting → drain connections (bounded) → return
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//!     second SIGTERM/SIGINT → force close
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then listener, then tasks
//! - Ordered shutdown: stop accept, drain, close
//! - Shutdown has timeout: forced close after the grace period

pub mod serve;
pub(crate) mod shutdown;
pub mod signals;

pub use serve::{serve, ServeError};
pub use signals::{ShutdownSignal, Signals};
