//! Opportunistic download of a live server's certificate.
//!
//! Used only to copy a CN from a real deployment (`--server HOST:PORT`), so
//! the handshake here deliberately accepts whatever the peer presents.

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::debug;

use crate::error::{CaError, Result};
use crate::factory::subject_cn_from_der;

/// Leaf certificate captured from a remote server.
#[derive(Debug, Clone)]
pub struct RemoteCert {
    /// DER encoding of the leaf.
    pub der: Vec<u8>,
    /// Subject CN of the leaf.
    pub cn: String,
}

/// Connect to `HOST:PORT`, complete a TLS handshake without validating
/// anything, and return the peer's leaf certificate.
pub async fn fetch_server_cert(target: &str) -> Result<RemoteCert> {
    let (host, port_str) = target
        .rsplit_once(':')
        .ok_or_else(|| CaError::Fetch(format!("expected HOST:PORT, got '{target}'")))?;
    let port: u16 = port_str
        .parse()
        .map_err(|_| CaError::Fetch(format!("bad port in '{target}'")))?;

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = rustls::ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| CaError::Fetch(e.to_string()))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyServerCert { provider }))
        .with_no_client_auth();

    let server_name = ServerName::try_from(host.to_string())
        .map_err(|_| CaError::Fetch(format!("bad host name '{host}'")))?;

    let tcp = TcpStream::connect((host, port))
        .await
        .map_err(|e| CaError::Fetch(format!("connect {target}: {e}")))?;
    let tls = TlsConnector::from(Arc::new(config))
        .connect(server_name, tcp)
        .await
        .map_err(|e| CaError::Fetch(format!("handshake with {target}: {e}")))?;

    let der = tls
        .get_ref()
        .1
        .peer_certificates()
        .and_then(|certs| certs.first())
        .map(|cert| cert.as_ref().to_vec())
        .ok_or_else(|| CaError::Fetch(format!("{target} presented no certificate")))?;

    let cn = subject_cn_from_der(&der)?;
    debug!(target, cn = %cn, "fetched remote server certificate");
    Ok(RemoteCert { der, cn })
}

/// Verifier that trusts anything; fine here because nothing security
/// relevant depends on the fetched certificate.
#[derive(Debug)]
struct AcceptAnyServerCert {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
