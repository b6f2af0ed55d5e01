//! Certificate + key bundles.

use std::path::PathBuf;

use crate::error::{CaError, Result};

/// Signing handles kept alongside material that can act as an issuer.
///
/// For generated certificates these are the originals; for a user-loaded CA
/// they are rebuilt from the PEM (same key, same subject), while the
/// user's own bytes stay what gets presented on the wire.
pub(crate) struct Signer {
    pub cert: rcgen::Certificate,
    pub key: rcgen::KeyPair,
}

/// An immutable bundle of leaf certificate, private key and issuer chain.
///
/// Shared by every profile that needs it; the dispatcher never copies
/// certificate material, only `Arc`s. PEMs are persisted to the file bag
/// for the duration of the run.
pub struct CertNKey {
    /// Subject CN.
    pub cn: String,
    /// Leaf certificate, PEM.
    pub cert_pem: String,
    /// Private key, PEM.
    pub key_pem: String,
    /// Issuer chain, root first (`issuer.chain ++ [issuer.cert]`). Empty
    /// for self-signed and user-loaded material.
    pub chain_pem: Vec<String>,
    /// Where the certificate bundle was persisted.
    pub cert_path: PathBuf,
    /// Where the private key was persisted.
    pub key_path: PathBuf,

    pub(crate) signer: Option<Signer>,
}

impl CertNKey {
    /// The chain to install on a TLS server: leaf first, then issuers from
    /// the leaf towards the root.
    pub fn serving_chain_pem(&self) -> Vec<String> {
        let mut chain = Vec::with_capacity(1 + self.chain_pem.len());
        chain.push(self.cert_pem.clone());
        chain.extend(self.chain_pem.iter().rev().cloned());
        chain
    }

    pub(crate) fn signing_parts(&self) -> Result<(&rcgen::Certificate, &rcgen::KeyPair)> {
        self.signer
            .as_ref()
            .map(|s| (&s.cert, &s.key))
            .ok_or_else(|| CaError::NotAnIssuer(self.cn.clone()))
    }
}

// Key material stays out of logs.
impl std::fmt::Debug for CertNKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertNKey")
            .field("cn", &self.cn)
            .field("chain_len", &self.chain_pem.len())
            .field("cert_path", &self.cert_path)
            .field("key_path", &self.key_path)
            .finish_non_exhaustive()
    }
}
