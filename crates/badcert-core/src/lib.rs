//! Core types for badcert, a tool that audits the certificate-validation
//! behavior of TLS clients.
//!
//! badcert acts as a deliberately-misbehaving TLS server: each connection
//! from the client under audit is answered with a different bogus server
//! certificate, and the observable reaction of the client is recorded as a
//! per-connection verdict.
//!
//! This crate holds the shared vocabulary of the tool:
//!
//! - **[`ProfileSpec`]**: what a single server-side test configuration means
//!   to a human (self-signed, CA-signed, intermediate-CA variants, ...)
//! - **[`Outcome`]**: the classification of what a client did on the wire
//! - **[`ClientId`]**: the identity of a client under audit (its IP address)
//! - **[`Options`]**: the user-facing knobs consumed by the plan builders

mod error;
mod options;
pub mod types;

pub use error::{AuditError, Result};
pub use options::{ModuleId, Options, parse_listen};
pub use types::*;

/// CN used on generated leaves in addition to any user-requested CN.
///
/// A client that accepts a certificate for a name nobody owns accepts
/// anything.
pub const DEFAULT_CN: &str = "nonexistent.gremwell.com";

/// Default listen endpoint.
pub const DEFAULT_LISTEN: &str = "0.0.0.0:8443";

/// Test name used when the user does not supply one with `-N`.
pub const DEFAULT_TEST_NAME: &str = "untitled";
