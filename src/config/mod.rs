//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (read & deserialize into AppConfig)
//!     → schema.rs (ServerSection → ServeOption list)
//!
//! caller options (ServeOption::port, ServeOption::tls, ...)
//!     → options.rs (apply in order onto a zero ServeConfig)
//!     → validation.rs (backfill defaults, semantic checks)
//!     → ServeConfig (validated, never mutated again)
//! ```
//!
//! # Design Decisions
//! - A zero field means "use the default"; defaults are backfilled at validation
//! - TLS material is loaded when its option is built and carried as an
//!   explicit `Result`, surfaced once at validation
//! - File config never overrides a field with a zero value

pub mod loader;
pub mod options;
pub mod schema;
pub mod serve;
pub mod validation;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::net::tls::TlsError;

pub use loader::load_config;
pub use options::ServeOption;
pub use schema::{AppConfig, LoggingConfig, ServerSection, TlsSection};
pub use serve::{ServeConfig, TlsMaterial};

/// Errors produced while building or loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("port must be greater than 0")]
    Port,

    #[error("{0} timeout must be greater than 0")]
    Timeout(&'static str),

    #[error("tls must be configured correctly if provided: {0}")]
    Tls(#[source] Arc<TlsError>),

    #[error("reading config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
