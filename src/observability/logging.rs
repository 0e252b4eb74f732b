//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber
//! - Record per-request duration and status
//! - Emit one structured event per request
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured filter
//! - JSON format for production, human-readable format for development
//! - The status is observed through an `Interceptor`, so the writer underneath
//!   stays reachable for body limits

use std::time::{Duration, Instant};

use axum::extract::Request;
use axum::http::StatusCode;
use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;
use crate::http::handler::{Endpoint, Middleware};
use crate::http::request::RequestExt;
use crate::http::writer::{Interceptor, ResponseWriter};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter {filter:?}: {source}")]
    Filter {
        filter: String,
        #[source]
        source: ParseError,
    },

    #[error("installing subscriber: {0}")]
    Install(#[from] TryInitError),
}

/// Install the global subscriber described by `config`.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter).map_err(|source| LoggingError::Filter {
            filter: config.filter.clone(),
            source,
        })?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()?;
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()?;
    }
    Ok(())
}

/// What a handler did with its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseRecord {
    pub duration: Duration,
    pub status: StatusCode,
}

/// Run `endpoint` and capture its duration and status.
///
/// A handler that never writes a status is recorded as `200 OK`, which is
/// what the client receives.
pub async fn record_response(
    endpoint: &Endpoint,
    w: &mut dyn ResponseWriter,
    r: &mut Request,
) -> ResponseRecord {
    let start = Instant::now();
    let mut status = None;
    {
        let mut interceptor = Interceptor::new(w).on_write_header(|code| {
            status.get_or_insert(code);
        });
        endpoint.call(&mut interceptor, r).await;
    }

    ResponseRecord {
        duration: start.elapsed(),
        status: status.unwrap_or(StatusCode::OK),
    }
}

/// Log every request at INFO once its handler returns.
pub fn request_logger() -> Middleware {
    Middleware::new(|next| {
        Endpoint::new(move |w, r| {
            let next = next.clone();
            Box::pin(async move {
                let record = record_response(&next, w, r).await;
                tracing::info!(
                    path = %r.uri(),
                    method = %r.method(),
                    duration = ?record.duration,
                    status = record.status.as_u16(),
                    request_id = r.request_id().unwrap_or("-"),
                    "request"
                );
            })
        })
    })
}
