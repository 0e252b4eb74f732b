//! Server configuration value.

use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use crate::net::tls::TlsError;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of loading TLS material: a ready rustls config or the load error.
pub type TlsMaterial = Result<Arc<rustls::ServerConfig>, Arc<TlsError>>;

/// Listener address, timeouts and TLS for one `serve` call.
///
/// `ServeConfig::default()` is the zero value: every field unset. Zero
/// fields are replaced with defaults by [`ServeConfig::validate`].
#[derive(Clone, Default)]
pub struct ServeConfig {
    /// Interface to bind. Empty means all IPv4 interfaces.
    pub host: String,
    pub port: u16,
    /// HTTP/2 keep-alive ping interval.
    pub idle_timeout: Duration,
    /// Time allowed to receive request headers.
    pub read_timeout: Duration,
    /// Time allowed to produce a response.
    pub write_timeout: Duration,
    /// Grace period for draining connections on shutdown.
    pub shutdown_timeout: Duration,
    pub(crate) tls: Option<TlsMaterial>,
}

impl ServeConfig {
    /// Config with every field set to its default.
    pub fn default_config() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            tls: None,
        }
    }

    /// Copy every non-zero field of `other` onto `self`. TLS is left alone.
    pub fn override_with(&mut self, other: &ServeConfig) {
        if !other.host.is_empty() {
            self.host.clone_from(&other.host);
        }
        if other.port != 0 {
            self.port = other.port;
        }
        if !other.idle_timeout.is_zero() {
            self.idle_timeout = other.idle_timeout;
        }
        if !other.read_timeout.is_zero() {
            self.read_timeout = other.read_timeout;
        }
        if !other.write_timeout.is_zero() {
            self.write_timeout = other.write_timeout;
        }
        if !other.shutdown_timeout.is_zero() {
            self.shutdown_timeout = other.shutdown_timeout;
        }
    }

    /// `host:port`, with IPv6 hosts bracketed.
    pub fn addr(&self) -> String {
        match self.host.as_str() {
            "" => format!("0.0.0.0:{}", self.port),
            host if host.parse::<IpAddr>().is_ok_and(|ip| ip.is_ipv6()) => {
                format!("[{host}]:{}", self.port)
            }
            host => format!("{host}:{}", self.port),
        }
    }

    /// The loaded TLS config, if TLS was configured and loaded cleanly.
    pub fn tls_config(&self) -> Option<Arc<rustls::ServerConfig>> {
        match &self.tls {
            Some(Ok(config)) => Some(Arc::clone(config)),
            _ => None,
        }
    }

    pub(crate) fn set_tls(&mut self, material: TlsMaterial) {
        self.tls = Some(material);
    }
}

impl fmt::Debug for ServeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tls = match &self.tls {
            None => "none",
            Some(Ok(_)) => "loaded",
            Some(Err(_)) => "failed",
        };
        f.debug_struct("ServeConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("idle_timeout", &self.idle_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("write_timeout", &self.write_timeout)
            .field("shutdown_timeout", &self.shutdown_timeout)
            .field("tls", &tls)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_zero() {
        let config = ServeConfig::default();
        assert_eq!(config.port, 0);
        assert!(config.host.is_empty());
        assert!(config.idle_timeout.is_zero());
        assert!(config.tls_config().is_none());
    }

    #[test]
    fn test_override_copies_only_non_zero_fields() {
        let mut config = ServeConfig::default_config();
        config.override_with(&ServeConfig {
            host: "127.0.0.1".into(),
            read_timeout: Duration::from_secs(1),
            ..ServeConfig::default()
        });

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.read_timeout, Duration::from_secs(1));
        assert_eq!(config.write_timeout, DEFAULT_WRITE_TIMEOUT);
    }

    #[test]
    fn test_override_with_zero_is_noop() {
        let mut config = ServeConfig::default_config();
        config.override_with(&ServeConfig::default());
        assert_eq!(format!("{config:?}"), format!("{:?}", ServeConfig::default_config()));
    }

    #[test]
    fn test_addr_formats() {
        let mut config = ServeConfig::default_config();
        assert_eq!(config.addr(), "0.0.0.0:8080");

        config.host = "localhost".into();
        assert_eq!(config.addr(), "localhost:8080");

        config.host = "::1".into();
        config.port = 9000;
        assert_eq!(config.addr(), "[::1]:9000");
    }
}
