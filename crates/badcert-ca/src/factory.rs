//! Certificate factory: keypairs, requests, self-signing and CA-mode
//! signing.

use std::path::Path;
use std::sync::Arc;

use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair,
    KeyUsagePurpose, SerialNumber, PKCS_ECDSA_P256_SHA256, PKCS_RSA_SHA256,
};
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use tracing::{debug, info};
use uuid::Uuid;

use badcert_core::KeyAlgorithm;

use crate::bag::FileBag;
use crate::certnkey::{CertNKey, Signer};
use crate::error::{CaError, Result};

/// RSA modulus width for generated keys.
const RSA_BITS: usize = 2048;

/// Validity of generated leaves and intermediates, days.
const LEAF_VALIDITY_DAYS: i64 = 365;

/// Validity of generated CAs, days.
const CA_VALIDITY_DAYS: i64 = 3650;

/// A certificate request: subject, parameters and the keypair to certify.
///
/// Produced by [`CertFactory::mk_cert_request`] and consumed by exactly one
/// signing operation.
pub struct CertRequest {
    cn: String,
    params: CertificateParams,
    key: KeyPair,
}

/// Generates and signs certificate material for one audit run.
///
/// All PEMs are persisted to the run's [`FileBag`] so external tooling can
/// inspect what was served.
#[derive(Debug, Clone)]
pub struct CertFactory {
    bag: FileBag,
    algorithm: KeyAlgorithm,
}

impl CertFactory {
    pub fn new(bag: FileBag, algorithm: KeyAlgorithm) -> Self {
        Self { bag, algorithm }
    }

    /// Generate a keypair with the factory's algorithm.
    ///
    /// RSA keys come from the `rsa` crate and are imported into rcgen as
    /// PKCS#8; rcgen's ring backend signs with existing RSA keys but cannot
    /// generate them.
    pub fn mk_keypair(&self) -> Result<KeyPair> {
        match self.algorithm {
            KeyAlgorithm::Rsa2048 => {
                let key = RsaPrivateKey::new(&mut rand::rngs::OsRng, RSA_BITS)
                    .map_err(|e| CaError::KeyGen(e.to_string()))?;
                let pem = key
                    .to_pkcs8_pem(LineEnding::LF)
                    .map_err(|e| CaError::KeyGen(e.to_string()))?;
                Ok(KeyPair::from_pkcs8_pem_and_sign_algo(&pem, &PKCS_RSA_SHA256)?)
            }
            KeyAlgorithm::EcdsaP256 => Ok(KeyPair::generate_for(&PKCS_ECDSA_P256_SHA256)?),
        }
    }

    /// Build a request for a leaf (or intermediate) with a single CN.
    ///
    /// The CN is also placed in the SAN: modern validators ignore the
    /// subject CN entirely, and the audit is about trust, not name checks.
    pub fn mk_cert_request(&self, cn: &str) -> Result<CertRequest> {
        let key = self.mk_keypair()?;
        let mut params = CertificateParams::new(vec![cn.to_string()])?;
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, cn);
        params.distinguished_name = dn;
        params.serial_number = Some(next_serial());
        params.not_before = time::OffsetDateTime::now_utc();
        params.not_after = time::OffsetDateTime::now_utc() + time::Duration::days(LEAF_VALIDITY_DAYS);
        Ok(CertRequest {
            cn: cn.to_string(),
            params,
            key,
        })
    }

    /// Issue a certificate whose issuer is its own subject.
    pub fn self_sign(&self, request: CertRequest) -> Result<Arc<CertNKey>> {
        let CertRequest { cn, mut params, key } = request;
        params.is_ca = IsCa::NoCa;
        let cert = params.self_signed(&key)?;
        debug!(cn = %cn, "issued self-signed certificate");
        self.persist(cn, cert.pem(), key.serialize_pem(), Vec::new(), Signer { cert, key }.into())
    }

    /// Issue a certificate signed by `issuer`, CA-mode.
    ///
    /// `basic_constraints` controls the extension on the *issued*
    /// certificate: `None` omits it entirely, `Some(false)` writes
    /// `CA:FALSE`, `Some(true)` writes `CA:TRUE`. That knob is what lets
    /// the plan craft intermediates a correct validator must reject.
    /// Issued certificates carry no KeyUsage extension, leaving
    /// BasicConstraints as the only signal a validator can act on.
    pub fn sign(
        &self,
        request: CertRequest,
        issuer: &CertNKey,
        basic_constraints: Option<bool>,
    ) -> Result<Arc<CertNKey>> {
        let CertRequest { cn, mut params, key } = request;
        params.is_ca = match basic_constraints {
            None => IsCa::NoCa,
            Some(false) => IsCa::ExplicitNoCa,
            Some(true) => IsCa::Ca(BasicConstraints::Unconstrained),
        };
        let (issuer_cert, issuer_key) = issuer.signing_parts()?;
        let cert = params.signed_by(&key, issuer_cert, issuer_key)?;
        debug!(cn = %cn, issuer = %issuer.cn, ?basic_constraints, "issued certificate");

        let mut chain = issuer.chain_pem.clone();
        chain.push(issuer.cert_pem.clone());
        self.persist(cn, cert.pem(), key.serialize_pem(), chain, Signer { cert, key }.into())
    }

    /// Mint a self-signed CA certificate.
    ///
    /// Used when no user CA is supplied and by the test suite to create
    /// one; a CA keypair is generated at most once per run.
    pub fn mk_ca(&self, cn: &str) -> Result<Arc<CertNKey>> {
        let key = self.mk_keypair()?;
        let mut params = CertificateParams::new(Vec::<String>::new())?;
        let mut dn = DistinguishedName::new();
        dn.push(DnType::CommonName, cn);
        params.distinguished_name = dn;
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        params.serial_number = Some(next_serial());
        params.not_before = time::OffsetDateTime::now_utc();
        params.not_after = time::OffsetDateTime::now_utc() + time::Duration::days(CA_VALIDITY_DAYS);
        let cert = params.self_signed(&key)?;
        debug!(cn = %cn, "minted CA");
        self.persist(cn.to_string(), cert.pem(), key.serialize_pem(), Vec::new(), Signer { cert, key }.into())
    }

    /// Load a user-supplied CA certificate and key.
    ///
    /// The user's own bytes are what later appears in served chains; the
    /// rcgen signing handle is rebuilt from the PEM (same key, same
    /// subject). Parse failures here abort the run before it listens.
    pub fn load_user_ca(&self, cert_path: &Path, key_path: &Path) -> Result<Arc<CertNKey>> {
        let cert_pem = read_pem(cert_path)?;
        let key_pem = read_pem(key_path)?;

        let cn = subject_cn_from_pem(&cert_pem)?;
        let key = KeyPair::from_pem(&key_pem)
            .map_err(|e| CaError::Pem(format!("{}: {e}", key_path.display())))?;
        let params = CertificateParams::from_ca_cert_pem(&cert_pem)
            .map_err(|e| CaError::Pem(format!("{}: {e}", cert_path.display())))?;
        let cert = params.self_signed(&key)?;

        info!(cn = %cn, path = %cert_path.display(), "user CA loaded");
        self.persist(cn, cert_pem, key_pem, Vec::new(), Signer { cert, key }.into())
    }

    /// Load an exact certificate + key the user wants presented verbatim.
    ///
    /// Never used as an issuer, so only the serving side of the material
    /// is validated.
    pub fn load_user_cert(&self, cert_path: &Path, key_path: &Path) -> Result<Arc<CertNKey>> {
        let cert_pem = read_pem(cert_path)?;
        let key_pem = read_pem(key_path)?;

        let cn = subject_cn_from_pem(&cert_pem)?;
        let mut key_reader = key_pem.as_bytes();
        rustls_pemfile::private_key(&mut key_reader)
            .map_err(|e| CaError::Pem(format!("{}: {e}", key_path.display())))?
            .ok_or_else(|| CaError::Pem(format!("{}: no private key found", key_path.display())))?;

        info!(cn = %cn, path = %cert_path.display(), "user certificate loaded");
        self.persist(cn, cert_pem, key_pem, Vec::new(), None)
    }

    fn persist(
        &self,
        cn: String,
        cert_pem: String,
        key_pem: String,
        chain_pem: Vec<String>,
        signer: Option<Signer>,
    ) -> Result<Arc<CertNKey>> {
        let mut bundle = cert_pem.clone();
        for link in chain_pem.iter().rev() {
            bundle.push_str(link);
        }
        let cert_path = self.bag.write_temp(&format!("{cn}-cert.pem"), bundle.as_bytes())?;
        let key_path = self.bag.write_temp(&format!("{cn}-key.pem"), key_pem.as_bytes())?;

        Ok(Arc::new(CertNKey {
            cn,
            cert_pem,
            key_pem,
            chain_pem,
            cert_path,
            key_path,
            signer,
        }))
    }
}

fn read_pem(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| CaError::Pem(format!("{}: {e}", path.display())))
}

fn next_serial() -> SerialNumber {
    (Uuid::new_v4().as_u128() as u64).into()
}

/// DER of the first certificate in a PEM bundle.
pub(crate) fn first_cert_der(pem: &str) -> Result<Vec<u8>> {
    let mut reader = pem.as_bytes();
    let cert = rustls_pemfile::certs(&mut reader)
        .next()
        .ok_or_else(|| CaError::Pem("no certificate found".into()))?
        .map_err(|e| CaError::Pem(e.to_string()))?;
    Ok(cert.as_ref().to_vec())
}

/// Subject CN of a DER-encoded certificate.
pub(crate) fn subject_cn_from_der(der: &[u8]) -> Result<String> {
    let (_, cert) = x509_parser::parse_x509_certificate(der)
        .map_err(|e| CaError::Pem(format!("bad certificate: {e}")))?;
    let cn = cert
        .subject()
        .iter_common_name()
        .next()
        .and_then(|attr| attr.as_str().ok())
        .map(str::to_string)
        .ok_or_else(|| CaError::Pem("certificate has no subject CN".into()));
    cn
}

/// Subject CN of the first certificate in a PEM bundle.
pub(crate) fn subject_cn_from_pem(pem: &str) -> Result<String> {
    subject_cn_from_der(&first_cert_der(pem)?)
}
