//! Options that build a [`ServeConfig`].

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::serve::{ServeConfig, TlsMaterial};
use crate::net::tls::load_mutual_tls;

/// One change to a [`ServeConfig`], applied in order by [`ServeConfig::from_options`].
#[derive(Debug, Clone)]
pub enum ServeOption {
    Host(String),
    Port(u16),
    IdleTimeout(Duration),
    ReadTimeout(Duration),
    WriteTimeout(Duration),
    ShutdownTimeout(Duration),
    Tls(TlsMaterial),
    /// Copy the non-zero fields of a whole config.
    Config(ServeConfig),
    /// Apply several options in order.
    Options(Vec<ServeOption>),
}

impl ServeOption {
    pub fn host(host: impl Into<String>) -> Self {
        Self::Host(host.into())
    }

    pub fn port(port: u16) -> Self {
        Self::Port(port)
    }

    pub fn idle_timeout(timeout: Duration) -> Self {
        Self::IdleTimeout(timeout)
    }

    pub fn read_timeout(timeout: Duration) -> Self {
        Self::ReadTimeout(timeout)
    }

    pub fn write_timeout(timeout: Duration) -> Self {
        Self::WriteTimeout(timeout)
    }

    pub fn shutdown_timeout(timeout: Duration) -> Self {
        Self::ShutdownTimeout(timeout)
    }

    /// Mutual TLS from PEM files: a server certificate chain and key, plus the
    /// CA bundle client certificates must chain to.
    ///
    /// The files are read immediately. A load failure does not fail here; it
    /// is reported when the resulting config is validated.
    pub fn tls(ca: impl AsRef<Path>, cert: impl AsRef<Path>, key: impl AsRef<Path>) -> Self {
        let material = load_mutual_tls(ca.as_ref(), cert.as_ref(), key.as_ref())
            .map(Arc::new)
            .map_err(|err| {
                tracing::debug!(error = %err, "TLS material failed to load");
                Arc::new(err)
            });
        Self::Tls(material)
    }

    pub fn config(config: ServeConfig) -> Self {
        Self::Config(config)
    }

    pub fn options(options: impl IntoIterator<Item = ServeOption>) -> Self {
        Self::Options(options.into_iter().collect())
    }

    pub fn apply(self, config: &mut ServeConfig) {
        match self {
            Self::Host(host) => config.host = host,
            Self::Port(port) => config.port = port,
            Self::IdleTimeout(timeout) => config.idle_timeout = timeout,
            Self::ReadTimeout(timeout) => config.read_timeout = timeout,
            Self::WriteTimeout(timeout) => config.write_timeout = timeout,
            Self::ShutdownTimeout(timeout) => config.shutdown_timeout = timeout,
            Self::Tls(material) => config.set_tls(material),
            Self::Config(other) => config.override_with(&other),
            Self::Options(options) => {
                for option in options {
                    option.apply(config);
                }
            }
        }
    }
}

impl ServeConfig {
    /// Apply `options` in order to the zero config.
    pub fn from_options(options: impl IntoIterator<Item = ServeOption>) -> Self {
        let mut config = ServeConfig::default();
        for option in options {
            option.apply(&mut config);
        }
        config
    }
}
