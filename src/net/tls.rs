//! TLS configuration and certificate loading.
//!
//! # Design Decisions
//! - Client certificates are required and verified against the supplied CA
//! - TLS 1.2 is the minimum version
//! - `h2` and `http/1.1` are advertised through ALPN
//! - The ring crypto provider is selected explicitly, so no process-wide
//!   default provider has to be installed

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use rustls::server::{VerifierBuilderError, WebPkiClientVerifier};
use rustls::{RootCertStore, ServerConfig};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unable to append certs from PEM: no certificates in {}", .0.display())]
    NoCertificates(PathBuf),

    #[error("no private key in {}", .0.display())]
    NoPrivateKey(PathBuf),

    #[error("building client verifier: {0}")]
    Verifier(#[from] VerifierBuilderError),

    #[error(transparent)]
    Rustls(#[from] rustls::Error),
}

/// Load a mutually-authenticated server config from PEM files.
pub fn load_mutual_tls(ca: &Path, cert: &Path, key: &Path) -> Result<ServerConfig, TlsError> {
    let chain = read_certs(cert)?;
    let key = read_key(key)?;

    let mut roots = RootCertStore::empty();
    for ca_cert in read_certs(ca)? {
        roots.add(ca_cert)?;
    }

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(roots), Arc::clone(&provider)).build()?;

    let mut config = ServerConfig::builder_with_provider(provider)
        .with_protocol_versions(&[&rustls::version::TLS13, &rustls::version::TLS12])?
        .with_client_cert_verifier(verifier)
        .with_single_cert(chain, key)?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];

    tracing::info!(cert = %cert.display(), ca = %ca.display(), "Mutual TLS configured");
    Ok(config)
}

fn open(path: &Path) -> Result<BufReader<File>, TlsError> {
    File::open(path).map(BufReader::new).map_err(|source| TlsError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn read_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsError> {
    let mut reader = open(path)?;
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| TlsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificates(path.to_path_buf()));
    }
    Ok(certs)
}

fn read_key(path: &Path) -> Result<PrivateKeyDer<'static>, TlsError> {
    let mut reader = open(path)?;
    rustls_pemfile::private_key(&mut reader)
        .map_err(|source| TlsError::Read {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| TlsError::NoPrivateKey(path.to_path_buf()))
}
