//! Network layer.
//!
//! # Data Flow
//! ```text
//! ServeConfig::addr()
//!     → listener.rs (bind, non-blocking std socket)
//!     → tls.rs (optional mutual TLS server config)
//!     → connection.rs (HTTP/1 and HTTP/2 timeouts on the hyper builder)
//!     → lifecycle::serve (accept loop)
//! ```

pub mod connection;
pub mod listener;
pub mod tls;

pub use listener::{bind, ListenerError};
pub use tls::{load_mutual_tls, TlsError};
