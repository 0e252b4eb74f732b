//! Per-connection protocol settings.
//!
//! # Responsibilities
//! - Apply the read timeout to HTTP/1 header reads
//! - Apply the idle timeout as the HTTP/2 keep-alive interval
//!
//! # Design Decisions
//! - Both protocols share hyper-util's auto builder, so one connection
//!   accepts HTTP/1.1 and HTTP/2 alike
//! - The write timeout is not a connection setting; it bounds each request
//!   through a tower-http timeout layer in `lifecycle::serve`

use hyper_util::rt::{TokioExecutor, TokioTimer};
use hyper_util::server::conn::auto::Builder;

use crate::config::ServeConfig;

/// Apply `config`'s timeouts to the connection builder.
pub fn tune(builder: &mut Builder<TokioExecutor>, config: &ServeConfig) {
    builder
        .http1()
        .timer(TokioTimer::new())
        .keep_alive(true)
        .header_read_timeout(config.read_timeout);

    builder
        .http2()
        .timer(TokioTimer::new())
        .keep_alive_interval(config.idle_timeout)
        .keep_alive_timeout(config.read_timeout);

    tracing::debug!(
        read_timeout = ?config.read_timeout,
        idle_timeout = ?config.idle_timeout,
        "Connection builder tuned"
    );
}
