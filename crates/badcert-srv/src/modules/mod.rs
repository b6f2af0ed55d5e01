//! Audit modules and plan assembly.
//!
//! Two modules exist: `sslcert` (certificate-trust probing, the default)
//! and `sslproto` (protocol/cipher sweep, selected with `-m sslproto`).

pub mod sslcert;
pub mod sslproto;

use std::sync::Arc;

use badcert_ca::{CertFactory, CertNKey};
use badcert_core::{ModuleId, Options};

use crate::error::Result;
use crate::plan::Plan;

/// Enumerate and materialize the profile plan for a run.
///
/// Order is stable for identical inputs: expectations and the printed
/// matrix depend on it.
pub fn build_plan(
    factory: &CertFactory,
    options: &Options,
    user_ca: Option<&CertNKey>,
    user_cert: Option<Arc<CertNKey>>,
    discovered_cn: Option<&str>,
) -> Result<Plan> {
    let profiles = match options.module {
        None | Some(ModuleId::SslCert) => {
            sslcert::profiles(factory, options, user_ca, user_cert, discovered_cn)?
        }
        Some(ModuleId::SslProto) => sslproto::profiles(factory)?,
    };
    Ok(Plan::new(profiles))
}
