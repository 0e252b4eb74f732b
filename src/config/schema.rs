//! Configuration file schema.
//!
//! All types derive Serde traits for deserialization from TOML. Every field
//! has a default so a minimal (or empty) file is valid.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::options::ServeOption;
use crate::config::serve::ServeConfig;

/// Root of the configuration file.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSection,
    pub logging: LoggingConfig,
}

/// `[server]`: listener address, timeouts and TLS. Zero means default.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    pub idle_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub write_timeout_secs: u64,
    pub shutdown_timeout_secs: u64,

    /// Mutual TLS; plain HTTP when absent.
    pub tls: Option<TlsSection>,
}

/// `[server.tls]`: PEM file paths.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsSection {
    /// CA bundle client certificates must chain to.
    pub ca_path: PathBuf,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

impl ServerSection {
    /// Options equivalent to this section.
    ///
    /// TLS files are loaded here, so a bad path shows up when the resulting
    /// config is validated.
    pub fn to_options(&self) -> Vec<ServeOption> {
        let mut options = vec![ServeOption::config(ServeConfig {
            host: self.host.clone(),
            port: self.port,
            idle_timeout: Duration::from_secs(self.idle_timeout_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            write_timeout: Duration::from_secs(self.write_timeout_secs),
            shutdown_timeout: Duration::from_secs(self.shutdown_timeout_secs),
            ..ServeConfig::default()
        })];
        if let Some(tls) = &self.tls {
            options.push(ServeOption::tls(&tls.ca_path, &tls.cert_path, &tls.key_path));
        }
        options
    }
}

/// `[logging]`
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, used when `RUST_LOG` is unset.
    pub filter: String,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "hio=info,tower_http=info".to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 0);
        assert!(config.server.tls.is_none());
        assert_eq!(config.logging.filter, "hio=info,tower_http=info");
        assert!(!config.logging.json);
    }

    #[test]
    fn test_section_becomes_overriding_options() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            host = "127.0.0.1"
            port = 9090
            write_timeout_secs = 30

            [logging]
            json = true
            "#,
        )
        .unwrap();

        let mut serve = ServeConfig::from_options(config.server.to_options());
        serve.validate().unwrap();
        assert_eq!(serve.addr(), "127.0.0.1:9090");
        assert_eq!(serve.write_timeout, Duration::from_secs(30));
        assert_eq!(serve.read_timeout, Duration::from_secs(5));
        assert!(config.logging.json);
    }
}
