//! HTTP serving toolkit.
//!
//! - [`serve`] runs an axum-compatible handler with graceful shutdown on
//!   caller cancellation or SIGINT/SIGTERM
//! - [`Router`] registers chained [`Handler`]s under method + pattern keys,
//!   with scoped groups and ordered [`Middleware`]
//! - [`Responder`] builds terminal text, JSON, redirect and error responses
//!
//! ```ignore
//! let mut router = Router::with_error_logging(tracing::info_span!("api"), |w, _, _, err| {
//!     tracing::error!(error = %err, "request failed");
//!     w.write_header(StatusCode::INTERNAL_SERVER_ERROR);
//! });
//! router.use_middleware([request_logger()]);
//! router.get("/health", |rs| rs.text(StatusCode::OK, "ok"));
//!
//! serve(CancellationToken::new(), router, [ServeOption::port(8080)]).await?;
//! ```

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod pipeline;
pub mod store;

pub use config::{ServeConfig, ServeOption};
pub use http::{Endpoint, Flow, Handler, Middleware, Responder, Router};
pub use lifecycle::{serve, ServeError};
pub use observability::request_logger;
