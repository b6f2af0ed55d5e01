//! Error types for certificate material handling.

use thiserror::Error;

/// Result type alias for badcert-ca operations.
pub type Result<T> = std::result::Result<T, CaError>;

/// Errors that can occur while generating or loading certificate material.
///
/// All of these are fatal at plan-build time: a run that cannot materialize
/// its profiles must not start listening.
#[derive(Error, Debug)]
pub enum CaError {
    /// Key generation failed.
    #[error("key generation failed: {0}")]
    KeyGen(String),

    /// Certificate construction or signing failed.
    #[error("certificate generation failed: {0}")]
    CertGen(#[from] rcgen::Error),

    /// User-supplied PEM material could not be parsed.
    #[error("pem parse error: {0}")]
    Pem(String),

    /// The certificate named as issuer cannot sign.
    #[error("certificate '{0}' cannot be used as an issuer")]
    NotAnIssuer(String),

    /// Fetching a remote server certificate failed.
    #[error("certificate fetch failed: {0}")]
    Fetch(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
