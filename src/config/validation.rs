//! Configuration validation.
//!
//! # Responsibilities
//! - Backfill zero fields with defaults
//! - Check value ranges (port and timeouts > 0)
//! - Surface a TLS load failure carried by the config
//!
//! # Design Decisions
//! - Runs once, immediately before the config is used
//! - Returns the first problem found

use std::sync::Arc;

use crate::config::serve::{
    ServeConfig, DEFAULT_IDLE_TIMEOUT, DEFAULT_PORT, DEFAULT_READ_TIMEOUT,
    DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_WRITE_TIMEOUT,
};
use crate::config::ConfigError;

impl ServeConfig {
    /// Fill zero fields with defaults, then check the result.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.backfill_defaults();

        if self.port == 0 {
            return Err(ConfigError::Port);
        }
        for (name, timeout) in [
            ("idle", self.idle_timeout),
            ("read", self.read_timeout),
            ("write", self.write_timeout),
            ("shutdown", self.shutdown_timeout),
        ] {
            if timeout.is_zero() {
                return Err(ConfigError::Timeout(name));
            }
        }
        if let Some(Err(err)) = &self.tls {
            return Err(ConfigError::Tls(Arc::clone(err)));
        }
        Ok(())
    }

    fn backfill_defaults(&mut self) {
        if self.port == 0 {
            self.port = DEFAULT_PORT;
        }
        if self.idle_timeout.is_zero() {
            self.idle_timeout = DEFAULT_IDLE_TIMEOUT;
        }
        if self.read_timeout.is_zero() {
            self.read_timeout = DEFAULT_READ_TIMEOUT;
        }
        if self.write_timeout.is_zero() {
            self.write_timeout = DEFAULT_WRITE_TIMEOUT;
        }
        if self.shutdown_timeout.is_zero() {
            self.shutdown_timeout = DEFAULT_SHUTDOWN_TIMEOUT;
        }
    }
}
