//! Error type shared by the option and plan layers.

use thiserror::Error;

/// Result type alias for badcert core operations.
pub type Result<T> = std::result::Result<T, AuditError>;

/// Errors produced while interpreting user-facing audit options.
#[derive(Error, Debug)]
pub enum AuditError {
    /// Options are inconsistent or incomplete.
    #[error("configuration error: {0}")]
    Config(String),

    /// A listen or target address could not be parsed.
    #[error("invalid address '{0}'")]
    InvalidAddress(String),

    /// An unknown audit module was requested with `-m`.
    #[error("unknown audit module '{0}' (expected sslcert or sslproto)")]
    UnknownModule(String),
}
