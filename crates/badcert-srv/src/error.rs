//! Error types for the audit engine.

use thiserror::Error;

/// Result type alias for badcert-srv operations.
pub type Result<T> = std::result::Result<T, SrvError>;

/// Errors that can occur while setting up or running an audit.
///
/// Only configuration and startup problems surface through `start()`;
/// anything that happens to an individual connection during the run is an
/// [`crate::event::AuditEvent`], not an error.
#[derive(Error, Debug)]
pub enum SrvError {
    /// Options are inconsistent with each other or with loaded material.
    #[error("configuration error: {0}")]
    Config(String),

    /// The listener could not be set up.
    #[error("server error: {0}")]
    Server(String),

    /// A server-side TLS context could not be assembled from a profile.
    #[error("tls error: {0}")]
    Tls(#[from] rustls::Error),

    /// Certificate material generation or loading failed.
    #[error("certificate error: {0}")]
    Ca(#[from] badcert_ca::CaError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Engine bug or unexpected runtime failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<badcert_core::AuditError> for SrvError {
    fn from(e: badcert_core::AuditError) -> Self {
        Self::Config(e.to_string())
    }
}
