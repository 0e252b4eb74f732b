//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! main → logging::init (EnvFilter + fmt/json subscriber)
//!
//! every request
//!     → logging::request_logger (Interceptor captures status, Instant captures duration)
//!     → one INFO "request" event with path, method, duration, status, request_id
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows from the edge layer into every request event

pub mod logging;

pub use logging::{init, record_response, request_logger, LoggingError, ResponseRecord};
