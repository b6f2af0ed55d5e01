//! The `sslcert` module: certificate-trust probing.
//!
//! Enumeration order is part of the observable contract. For a run with a
//! user CN and a user CA it produces:
//!
//! ```text
//! self_signed(default), self_signed(user),
//! signed(default, ca), signed(user, ca),
//! imca_signed(default, none/false/true, ca),
//! imca_signed(user,    none/false/true, ca)
//! ```

use std::sync::Arc;

use tracing::debug;

use badcert_ca::{CertFactory, CertNKey};
use badcert_core::{ImCaVariant, Options, ProfileSpec, DEFAULT_CN};

use crate::error::Result;
use crate::plan::{HandlerKind, Profile};

/// Enumerate the certificate-trust profiles for `options`.
pub fn profiles(
    factory: &CertFactory,
    options: &Options,
    user_ca: Option<&CertNKey>,
    user_cert: Option<Arc<CertNKey>>,
    discovered_cn: Option<&str>,
) -> Result<Vec<Arc<Profile>>> {
    let mut profiles: Vec<Arc<Profile>> = Vec::new();

    // The user's exact material is one profile of its own.
    if let Some(certnkey) = user_cert {
        let spec = ProfileSpec::UserSupplied { cn: certnkey.cn.clone() };
        profiles.push(Arc::new(Profile::new(spec, certnkey, HandlerKind::Certificate)?));
    }

    let mut cns: Vec<String> = Vec::new();
    if !options.no_default_cn {
        cns.push(DEFAULT_CN.to_string());
    }
    if let Some(cn) = &options.user_cn {
        cns.push(cn.clone());
    } else if let Some(cn) = discovered_cn {
        cns.push(cn.to_string());
    }
    debug!(cns = ?cns, "enumerating sslcert profiles");

    if !options.no_self_signed {
        for cn in &cns {
            let request = factory.mk_cert_request(cn)?;
            let certnkey = factory.self_sign(request)?;
            let spec = ProfileSpec::SelfSigned { cn: cn.clone() };
            profiles.push(Arc::new(Profile::new(spec, certnkey, HandlerKind::Certificate)?));
        }
    }

    if let Some(ca) = user_ca {
        if !options.no_user_cert_signed {
            for cn in &cns {
                let request = factory.mk_cert_request(cn)?;
                let certnkey = factory.sign(request, ca, None)?;
                let spec = ProfileSpec::Signed {
                    cn: cn.clone(),
                    ca_cn: ca.cn.clone(),
                };
                profiles.push(Arc::new(Profile::new(spec, certnkey, HandlerKind::Certificate)?));
            }
        }

        // One intermediate per variant, shared by every CN that chains
        // through it.
        let mut intermediates = Vec::with_capacity(ImCaVariant::ALL.len());
        for variant in ImCaVariant::ALL {
            let request = factory.mk_cert_request(variant.im_ca_cn())?;
            let intermediate = factory.sign(request, ca, variant.basic_constraints())?;
            intermediates.push((variant, intermediate));
        }

        for cn in &cns {
            for (variant, intermediate) in &intermediates {
                let request = factory.mk_cert_request(cn)?;
                let certnkey = factory.sign(request, intermediate, None)?;
                let spec = ProfileSpec::ImCaSigned {
                    cn: cn.clone(),
                    variant: *variant,
                    ca_cn: ca.cn.clone(),
                };
                profiles.push(Arc::new(Profile::new(spec, certnkey, HandlerKind::Certificate)?));
            }
        }
    }

    Ok(profiles)
}
