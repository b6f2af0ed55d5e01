//! # badcert-ca
//!
//! In-process mini-CA for the badcert TLS client auditor.
//!
//! Every audit run generates its certificate material on the fly: the run
//! must be hermetic and reproducible, and it must exercise *structural*
//! chain variants (intermediates with `CA:FALSE` or without BasicConstraints
//! at all) that no public CA will ever issue.
//!
//! The pieces:
//!
//! - [`CertFactory`]: keypairs, certificate requests, self-signing and
//!   CA-mode signing with explicit control over BasicConstraints
//! - [`CertNKey`]: an immutable certificate + key + issuer-chain bundle,
//!   shared between profiles via `Arc`
//! - [`FileBag`]: the sandboxed temp-file store all PEMs are persisted to
//!   for the duration of a run
//! - [`fetch_server_cert`]: opportunistic TLS client used to copy the CN of
//!   a live server

mod bag;
mod certnkey;
mod error;
mod factory;
mod fetch;

pub use bag::FileBag;
pub use certnkey::CertNKey;
pub use error::{CaError, Result};
pub use factory::{CertFactory, CertRequest};
pub use fetch::{fetch_server_cert, RemoteCert};
