//! TCP listener binding.
//!
//! # Responsibilities
//! - Bind to the configured address before any task starts
//! - Hand a non-blocking std listener to the server runtime
//!
//! # Design Decisions
//! - Binding happens synchronously inside `serve`, so an address conflict is
//!   returned directly instead of surfacing from the accept task

use std::net::TcpListener;

use thiserror::Error;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("listening on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Bind `addr` and switch the socket to non-blocking mode.
pub fn bind(addr: &str) -> Result<TcpListener, ListenerError> {
    let bind_err = |source| ListenerError::Bind {
        addr: addr.to_owned(),
        source,
    };

    let listener = TcpListener::bind(addr).map_err(bind_err)?;
    listener.set_nonblocking(true).map_err(bind_err)?;

    let local_addr = listener.local_addr().map_err(bind_err)?;
    tracing::info!(address = %local_addr, "Listener bound");
    Ok(listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_reports_conflict() {
        let first = bind("127.0.0.1:0").unwrap();
        let taken = first.local_addr().unwrap().to_string();

        let err = bind(&taken).unwrap_err();
        assert!(err.to_string().starts_with(&format!("listening on {taken}")));
    }
}
