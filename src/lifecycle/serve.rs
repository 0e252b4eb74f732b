//! The serving lifecycle.
//!
//! # Responsibilities
//! - Build and validate the server config from options
//! - Bind the listener and run the accept loop
//! - Stop on caller cancellation or a termination signal, draining within
//!   the configured grace period
//!
//! # Design Decisions
//! - Exactly two tasks per call, joined in a `JoinSet`: accept and shutdown
//! - The first failing task cancels the shared token so the other winds down
//! - A clean stop after shutdown has begun is not an error
//! - Dropping the returned future aborts both tasks and releases the signal
//!   subscriptions

use std::io;
use std::net::TcpListener;
use std::time::Duration;

use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;

use crate::config::{ConfigError, ServeConfig, ServeOption};
use crate::http::request::MakeRequestUuidV4;
use crate::lifecycle::shutdown::{self, Shutdown};
use crate::lifecycle::signals::{ShutdownSignal, Signals};
use crate::net::connection;
use crate::net::listener::{self, ListenerError};

#[derive(Debug, Error)]
pub enum ServeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Listen(#[from] ListenerError),

    #[error("installing signal handlers: {0}")]
    Signal(#[source] io::Error),

    #[error("serving: {0}")]
    Accept(#[source] io::Error),

    #[error("shutdown did not finish within {0:?}")]
    ShutdownTimeout(Duration),

    #[error("forced shutdown after a second {0}")]
    ForcedShutdown(ShutdownSignal),

    #[error("server task failed: {0}")]
    Join(#[from] JoinError),
}

/// Serve `handler` until `ctx` is cancelled or the process is asked to stop.
///
/// Returns once both the accept loop and the shutdown task have finished:
/// `Ok(())` after a clean drain, otherwise the first error reported.
pub async fn serve<H>(
    ctx: CancellationToken,
    handler: H,
    options: impl IntoIterator<Item = ServeOption>,
) -> Result<(), ServeError>
where
    H: Into<axum::Router>,
{
    let mut config = ServeConfig::from_options(options);
    config.validate()?;

    let listener = listener::bind(&config.addr())?;
    let signals = Signals::register().map_err(ServeError::Signal)?;
    let app = with_edge_layers(handler.into(), &config);

    let handle = Handle::new();
    let shutdown = Shutdown::new(&ctx);
    let grace = config.shutdown_timeout;

    let mut tasks = JoinSet::new();
    tasks.spawn(accept(listener, app, config, handle.clone(), shutdown.closed.clone()));
    tasks.spawn(shutdown::drain(handle, shutdown.clone(), signals, grace));

    let mut first_error = None;
    while let Some(joined) = tasks.join_next().await {
        let Err(err) = joined.map_err(ServeError::from).and_then(|result| result) else {
            continue;
        };
        shutdown.token.cancel();
        match first_error {
            None => first_error = Some(err),
            Some(_) => tracing::debug!(error = %err, "Additional serve error"),
        }
    }

    match first_error {
        Some(err) => {
            tracing::error!(error = %err, "Server stopped with error");
            Err(err)
        }
        None => {
            tracing::info!("Server stopped");
            Ok(())
        }
    }
}

/// Request ID on every request and response, and the write timeout.
#[allow(deprecated)]
fn with_edge_layers(router: axum::Router, config: &ServeConfig) -> axum::Router {
    router
        .layer(TimeoutLayer::new(config.write_timeout))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
}

async fn accept(
    listener: TcpListener,
    app: axum::Router,
    config: ServeConfig,
    handle: Handle,
    closed: CancellationToken,
) -> Result<(), ServeError> {
    let _closed = closed.drop_guard();
    let service = app.into_make_service();

    let result = match config.tls_config() {
        Some(tls) => {
            tracing::info!(address = %config.addr(), tls = true, "HTTP server starting");
            let mut server =
                axum_server::from_tcp_rustls(listener, RustlsConfig::from_config(tls)).handle(handle);
            connection::tune(server.http_builder(), &config);
            server.serve(service).await
        }
        None => {
            tracing::info!(address = %config.addr(), tls = false, "HTTP server starting");
            let mut server = axum_server::from_tcp(listener).handle(handle);
            connection::tune(server.http_builder(), &config);
            server.serve(service).await
        }
    };

    result.map_err(ServeError::Accept)
}
