//! TLS client setup for HTTPS probes.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, RootCertStore};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

use crate::config::ProbeTlsConfig;
use crate::net::error::ProbeError;

/// TLS client could not be configured.
#[derive(Debug, Error)]
pub enum TlsSetupError {
    #[error("failed to read CA bundle {path:?}: {source}")]
    ReadCa { path: PathBuf, source: io::Error },

    #[error("no certificates found in {path:?}")]
    EmptyCa { path: PathBuf },

    #[error("invalid TLS server name {0:?}")]
    ServerName(String),

    #[error("TLS configuration error: {0}")]
    Rustls(#[from] rustls::Error),
}

/// Wraps probe connections in TLS.
#[derive(Clone)]
pub struct TlsProbe {
    connector: TlsConnector,
    server_name: ServerName<'static>,
}

impl std::fmt::Debug for TlsProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsProbe")
            .field("server_name", &self.server_name)
            .finish()
    }
}

impl TlsProbe {
    pub fn from_config(config: &ProbeTlsConfig) -> Result<Self, TlsSetupError> {
        let client_config = if config.verify {
            verified_client_config(config.ca_path.as_deref())?
        } else {
            tracing::warn!("HTTPS probes will not verify server certificates");
            unverified_client_config()?
        };

        let server_name = ServerName::try_from(config.server_name.clone())
            .map_err(|_| TlsSetupError::ServerName(config.server_name.clone()))?;

        Ok(Self {
            connector: TlsConnector::from(Arc::new(client_config)),
            server_name,
        })
    }

    /// Run the client handshake over an established connection.
    pub async fn handshake(&self, stream: TcpStream) -> Result<TlsStream<TcpStream>, ProbeError> {
        self.connector
            .connect(self.server_name.clone(), stream)
            .await
            .map_err(ProbeError::Tls)
    }
}

fn verified_client_config(ca_path: Option<&Path>) -> Result<ClientConfig, TlsSetupError> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    if let Some(path) = ca_path {
        let added = add_pem_bundle(&mut roots, path)?;
        tracing::info!(path = ?path, certificates = added, "Loaded probe CA bundle");
    }

    let mut config = ClientConfig::builder_with_provider(
        rustls::crypto::ring::default_provider().into(),
    )
    .with_safe_default_protocol_versions()?
    .with_root_certificates(roots)
    .with_no_client_auth();
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Ok(config)
}

fn unverified_client_config() -> Result<ClientConfig, TlsSetupError> {
    let mut config = ClientConfig::builder_with_provider(
        rustls::crypto::ring::default_provider().into(),
    )
    .with_safe_default_protocol_versions()?
    .dangerous()
    .with_custom_certificate_verifier(Arc::new(danger::NoVerifier))
    .with_no_client_auth();
    config.alpn_protocols = vec![b"http/1.1".to_vec()];
    Ok(config)
}

fn add_pem_bundle(roots: &mut RootCertStore, path: &Path) -> Result<usize, TlsSetupError> {
    let read_err = |source| TlsSetupError::ReadCa {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(read_err)?;
    let mut reader = BufReader::new(file);

    let mut added = 0;
    for cert in rustls_pemfile::certs(&mut reader) {
        roots.add(cert.map_err(read_err)?)?;
        added += 1;
    }

    if added == 0 {
        return Err(TlsSetupError::EmptyCa {
            path: path.to_path_buf(),
        });
    }
    Ok(added)
}

mod danger {
    use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
    use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
    use rustls::{DigitallySignedStruct, Error, SignatureScheme};

    /// Accepts any server certificate. Only used when `verify = false`.
    #[derive(Debug)]
    pub struct NoVerifier;

    impl ServerCertVerifier for NoVerifier {
        fn verify_server_cert(
            &self,
            _end_entity: &CertificateDer<'_>,
            _intermediates: &[CertificateDer<'_>],
            _server_name: &ServerName<'_>,
            _ocsp_response: &[u8],
            _now: UnixTime,
        ) -> Result<ServerCertVerified, Error> {
            Ok(ServerCertVerified::assertion())
        }

        fn verify_tls12_signature(
            &self,
            _message: &[u8],
            _cert: &CertificateDer<'_>,
            _dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, Error> {
            Ok(HandshakeSignatureValid::assertion())
        }

        fn verify_tls13_signature(
            &self,
            _message: &[u8],
            _cert: &CertificateDer<'_>,
            _dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, Error> {
            Ok(HandshakeSignatureValid::assertion())
        }

        fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
            rustls::crypto::ring::default_provider()
                .signature_verification_algorithms
                .supported_schemes()
        }
    }
}
