//! Server-side TLS context assembly and alert naming.

use std::sync::Arc;

use rustls::client::danger::HandshakeSignatureValid;
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, UnixTime};
use rustls::server::danger::{ClientCertVerified, ClientCertVerifier};
use rustls::{AlertDescription, DigitallySignedStruct, DistinguishedName, SignatureScheme};

use badcert_ca::CertNKey;
use badcert_core::CipherClass;
use badcert_core::TlsProto;

use crate::error::{Result, SrvError};
use crate::plan::HandlerKind;

/// Protocol versions offered by certificate-probing profiles.
static ALL_PROTOCOL_VERSIONS: &[&rustls::SupportedProtocolVersion] =
    &[&rustls::version::TLS13, &rustls::version::TLS12];

/// Build the rustls server context for one profile.
///
/// The context always *requests* a client certificate but never requires
/// one, and accepts whatever arrives: the audit records the fact that a
/// client volunteered a certificate, nothing more.
pub(crate) fn server_config(
    certnkey: &CertNKey,
    handler: HandlerKind,
) -> Result<Arc<rustls::ServerConfig>> {
    let mut chain: Vec<CertificateDer<'static>> = Vec::new();
    for pem in certnkey.serving_chain_pem() {
        let mut reader = pem.as_bytes();
        for cert in rustls_pemfile::certs(&mut reader) {
            chain.push(cert.map_err(|e| {
                SrvError::Config(format!("profile '{}': bad certificate pem: {e}", certnkey.cn))
            })?);
        }
    }
    if chain.is_empty() {
        return Err(SrvError::Config(format!(
            "profile '{}' has no certificate",
            certnkey.cn
        )));
    }

    let mut key_reader = certnkey.key_pem.as_bytes();
    let key: PrivateKeyDer<'static> = rustls_pemfile::private_key(&mut key_reader)
        .map_err(|e| SrvError::Config(format!("profile '{}': bad key pem: {e}", certnkey.cn)))?
        .ok_or_else(|| SrvError::Config(format!("profile '{}' has no key", certnkey.cn)))?;

    let provider = match handler {
        HandlerKind::Certificate => Arc::new(rustls::crypto::ring::default_provider()),
        HandlerKind::ProtocolProbe { cipher, .. } => Arc::new(CryptoProvider {
            cipher_suites: suites_for(cipher),
            ..rustls::crypto::ring::default_provider()
        }),
    };
    let versions: &[&rustls::SupportedProtocolVersion] = match handler {
        HandlerKind::Certificate => ALL_PROTOCOL_VERSIONS,
        HandlerKind::ProtocolProbe { proto: TlsProto::Tls12, .. } => &[&rustls::version::TLS12],
        HandlerKind::ProtocolProbe { proto: TlsProto::Tls13, .. } => &[&rustls::version::TLS13],
    };

    let verifier = ObservingClientAuth {
        provider: provider.clone(),
    };
    let config = rustls::ServerConfig::builder_with_provider(provider)
        .with_protocol_versions(versions)?
        .with_client_cert_verifier(Arc::new(verifier))
        .with_single_cert(chain, key)?;

    Ok(Arc::new(config))
}

/// Cipher suites making up one bulk-cipher family, across key-exchange
/// variants so the profile works with both RSA and ECDSA leaves.
fn suites_for(cipher: CipherClass) -> Vec<rustls::SupportedCipherSuite> {
    use rustls::crypto::ring::cipher_suite as suites;
    match cipher {
        CipherClass::Aes128Gcm => vec![
            suites::TLS13_AES_128_GCM_SHA256,
            suites::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
            suites::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
        ],
        CipherClass::Aes256Gcm => vec![
            suites::TLS13_AES_256_GCM_SHA384,
            suites::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
            suites::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
        ],
        CipherClass::ChaCha20 => vec![
            suites::TLS13_CHACHA20_POLY1305_SHA256,
            suites::TLS_ECDHE_ECDSA_WITH_CHACHA20_POLY1305_SHA256,
            suites::TLS_ECDHE_RSA_WITH_CHACHA20_POLY1305_SHA256,
        ],
    }
}

/// snake_case name of a TLS alert, as printed in result lines.
pub(crate) fn alert_name(alert: AlertDescription) -> String {
    match alert {
        AlertDescription::CloseNotify => "close_notify".into(),
        AlertDescription::UnexpectedMessage => "unexpected_message".into(),
        AlertDescription::BadRecordMac => "bad_record_mac".into(),
        AlertDescription::HandshakeFailure => "handshake_failure".into(),
        AlertDescription::BadCertificate => "bad_certificate".into(),
        AlertDescription::UnsupportedCertificate => "unsupported_certificate".into(),
        AlertDescription::CertificateRevoked => "certificate_revoked".into(),
        AlertDescription::CertificateExpired => "certificate_expired".into(),
        AlertDescription::CertificateUnknown => "certificate_unknown".into(),
        AlertDescription::IllegalParameter => "illegal_parameter".into(),
        AlertDescription::UnknownCA => "unknown_ca".into(),
        AlertDescription::AccessDenied => "access_denied".into(),
        AlertDescription::DecodeError => "decode_error".into(),
        AlertDescription::DecryptError => "decrypt_error".into(),
        AlertDescription::ProtocolVersion => "protocol_version".into(),
        AlertDescription::InsufficientSecurity => "insufficient_security".into(),
        AlertDescription::InternalError => "internal_error".into(),
        AlertDescription::UserCanceled => "user_canceled".into(),
        AlertDescription::NoRenegotiation => "no_renegotiation".into(),
        AlertDescription::UnsupportedExtension => "unsupported_extension".into(),
        other => format!("alert_{}", u8::from(other)),
    }
}

/// Requests a client certificate, requires none, accepts anything.
#[derive(Debug)]
struct ObservingClientAuth {
    provider: Arc<CryptoProvider>,
}

impl ClientCertVerifier for ObservingClientAuth {
    fn offer_client_auth(&self) -> bool {
        true
    }

    fn client_auth_mandatory(&self) -> bool {
        false
    }

    fn root_hint_subjects(&self) -> &[DistinguishedName] {
        &[]
    }

    fn verify_client_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _now: UnixTime,
    ) -> std::result::Result<ClientCertVerified, rustls::Error> {
        Ok(ClientCertVerified::assertion())
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
