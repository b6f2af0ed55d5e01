//! In-process test clients ("hammers") that bang on the audit listener
//! with well-defined validation behaviors.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{CertificateError, ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tokio_rustls::TlsConnector;

/// How a hammer treats the server.
pub enum Hammer {
    /// Connects over plain TCP and hangs up without speaking TLS.
    PlainTcp,
    /// Completes the handshake no matter what is served, sends nothing.
    NonValidating,
    /// Validates the served chain against one trusted CA (name checks
    /// deliberately skipped; the audit varies CNs on purpose).
    ChainValidating { ca_pem: String },
    /// Like `NonValidating`, but volunteers a client certificate.
    WithClientCert { cert_pem: String, key_pem: String },
}

/// Run `attempts` sequential connections against `addr`.
pub async fn run_hammer(addr: SocketAddr, attempts: usize, hammer: Hammer) {
    let config = match &hammer {
        Hammer::PlainTcp => None,
        Hammer::NonValidating => Some(non_validating_config()),
        Hammer::ChainValidating { ca_pem } => Some(chain_validating_config(ca_pem)),
        Hammer::WithClientCert { cert_pem, key_pem } => {
            Some(client_cert_config(cert_pem, key_pem))
        }
    };

    for _ in 0..attempts {
        match &config {
            None => {
                // Connect, then hang up before any TLS record.
                if let Ok(stream) = TcpStream::connect(addr).await {
                    drop(stream);
                }
                // Give the listener a moment so connects stay ordered.
                sleep(Duration::from_millis(10)).await;
            }
            Some(config) => one_tls_attempt(addr, config.clone()).await,
        }
    }
}

async fn one_tls_attempt(addr: SocketAddr, config: Arc<ClientConfig>) {
    let Ok(tcp) = TcpStream::connect(addr).await else {
        return;
    };
    let connector = TlsConnector::from(config);
    let server_name = ServerName::try_from("audited.test").expect("valid name");
    match timeout(Duration::from_secs(5), connector.connect(server_name, tcp)).await {
        Ok(Ok(mut tls)) => {
            // Hold the connection until the server gives up on us.
            let mut buf = [0_u8; 256];
            let _ = timeout(Duration::from_secs(5), async {
                loop {
                    match tls.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(_) => {}
                    }
                }
            })
            .await;
        }
        // Rejected the served chain (our alert is already on the wire) or
        // timed out; either way the server has its verdict.
        Ok(Err(_)) | Err(_) => {}
    }
}

fn provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

fn non_validating_config() -> Arc<ClientConfig> {
    let provider = provider();
    let config = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .expect("default versions")
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnything { provider }))
        .with_no_client_auth();
    Arc::new(config)
}

fn chain_validating_config(ca_pem: &str) -> Arc<ClientConfig> {
    let provider = provider();
    let mut roots = RootCertStore::empty();
    let mut reader = ca_pem.as_bytes();
    for cert in rustls_pemfile::certs(&mut reader) {
        roots.add(cert.expect("valid CA pem")).expect("CA added");
    }
    let inner = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider.clone())
        .build()
        .expect("verifier");
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .expect("default versions")
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(ChainOnly { inner }))
        .with_no_client_auth();
    Arc::new(config)
}

fn client_cert_config(cert_pem: &str, key_pem: &str) -> Arc<ClientConfig> {
    let provider = provider();
    let mut cert_reader = cert_pem.as_bytes();
    let chain: Vec<CertificateDer<'static>> = rustls_pemfile::certs(&mut cert_reader)
        .collect::<Result<_, _>>()
        .expect("valid client cert pem");
    let mut key_reader = key_pem.as_bytes();
    let key: PrivateKeyDer<'static> = rustls_pemfile::private_key(&mut key_reader)
        .expect("valid client key pem")
        .expect("client key present");
    let config = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .expect("default versions")
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnything { provider }))
        .with_client_auth_cert(chain, key)
        .expect("client auth config");
    Arc::new(config)
}

/// The non-validating client's "validator".
#[derive(Debug)]
struct AcceptAnything {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AcceptAnything {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
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
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
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

/// Full webpki chain validation, name checks skipped.
///
/// Any trust failure is reported as an unknown CA so the alert on the
/// wire is the one a typical validating client sends when it does not
/// trust the presented chain.
#[derive(Debug)]
struct ChainOnly {
    inner: Arc<WebPkiServerVerifier>,
}

impl ServerCertVerifier for ChainOnly {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        match self
            .inner
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
        {
            Ok(verified) => Ok(verified),
            Err(rustls::Error::InvalidCertificate(
                CertificateError::NotValidForName
                | CertificateError::NotValidForNameContext { .. },
            )) => Ok(ServerCertVerified::assertion()),
            Err(_) => Err(rustls::Error::InvalidCertificate(
                CertificateError::UnknownIssuer,
            )),
        }
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}
