//! The `sslproto` module: protocol/cipher sweep.
//!
//! Not part of the default plan; selected with `-m sslproto`. Every sweep
//! entry serves the same throwaway self-signed leaf, so a connecting
//! client reveals which protocol/cipher combinations it is willing to
//! negotiate independently of trust decisions.

use std::sync::Arc;

use badcert_ca::CertFactory;
use badcert_core::{CipherClass, ProfileSpec, TlsProto};

use crate::error::Result;
use crate::plan::{HandlerKind, Profile};

/// CN on the sweep's throwaway certificate.
pub const SSLPROTO_CN: &str = "sslproto";

/// Enumerate the protocol-sweep profiles.
pub fn profiles(factory: &CertFactory) -> Result<Vec<Arc<Profile>>> {
    let request = factory.mk_cert_request(SSLPROTO_CN)?;
    let certnkey = factory.self_sign(request)?;

    let mut profiles = Vec::new();
    for proto in TlsProto::ALL {
        for cipher in CipherClass::ALL {
            let spec = ProfileSpec::Proto { proto, cipher };
            let handler = HandlerKind::ProtocolProbe { proto, cipher };
            profiles.push(Arc::new(Profile::new(spec, certnkey.clone(), handler)?));
        }
    }
    Ok(profiles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use badcert_ca::FileBag;
    use badcert_core::KeyAlgorithm;

    #[test]
    fn test_sweep_grid() {
        let factory = CertFactory::new(FileBag::new().unwrap(), KeyAlgorithm::EcdsaP256);
        let profiles = profiles(&factory).unwrap();

        assert_eq!(profiles.len(), 6);
        assert_eq!(
            profiles[0].spec,
            ProfileSpec::Proto {
                proto: TlsProto::Tls12,
                cipher: CipherClass::Aes128Gcm,
            }
        );
        assert_eq!(
            profiles[5].spec,
            ProfileSpec::Proto {
                proto: TlsProto::Tls13,
                cipher: CipherClass::ChaCha20,
            }
        );

        // One throwaway certificate shared by the whole sweep.
        for profile in &profiles {
            assert!(Arc::ptr_eq(&profile.certnkey, &profiles[0].certnkey));
            assert_eq!(profile.certnkey.cn, SSLPROTO_CN);
        }
    }
}
