//! User-facing audit options.
//!
//! The CLI (or an embedding GUI) parses its own surface and hands the audit
//! engine one [`Options`] value. The profile factories branch on these
//! fields when enumerating the plan.

use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::AuditError;
use crate::types::KeyAlgorithm;
use crate::{DEFAULT_LISTEN, DEFAULT_TEST_NAME};

/// Audit modules selectable with `-m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleId {
    /// Certificate-trust probing (the default module).
    SslCert,
    /// Protocol/cipher sweep with a throwaway self-signed certificate.
    SslProto,
}

impl FromStr for ModuleId {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sslcert" => Ok(Self::SslCert),
            "sslproto" => Ok(Self::SslProto),
            other => Err(AuditError::UnknownModule(other.to_string())),
        }
    }
}

impl std::fmt::Display for ModuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SslCert => write!(f, "sslcert"),
            Self::SslProto => write!(f, "sslproto"),
        }
    }
}

/// Everything the audit engine needs to know about a run.
#[derive(Debug, Clone)]
pub struct Options {
    /// Listen endpoint for the audit listener.
    pub listen: SocketAddr,

    /// Restrict the run to one audit module; `None` selects the default
    /// plan (the `sslcert` module).
    pub module: Option<ModuleId>,

    /// Stop after this many clients completed the full plan.
    pub nclients: usize,

    /// Free-form label included in every result line.
    pub test_name: String,

    /// Debug verbosity as given with `-d`.
    pub debug_level: u8,

    /// CN to put on generated leaves instead of a discovered one.
    pub user_cn: Option<String>,

    /// `HOST:PORT` of a live server whose certificate CN is copied.
    pub server: Option<String>,

    /// Exact certificate to present as one profile.
    pub user_cert: Option<PathBuf>,
    /// Private key belonging to `user_cert`.
    pub user_key: Option<PathBuf>,

    /// CA certificate used to sign generated leaves and intermediates.
    pub user_ca_cert: Option<PathBuf>,
    /// Private key belonging to `user_ca_cert`.
    pub user_ca_key: Option<PathBuf>,

    /// Do not add [`crate::DEFAULT_CN`] to the CN list.
    pub no_default_cn: bool,
    /// Skip the self-signed profiles.
    pub no_self_signed: bool,
    /// Skip the profiles signed directly by the user CA.
    pub no_user_cert_signed: bool,

    /// Key algorithm for generated material.
    pub key_algorithm: KeyAlgorithm,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.parse().expect("valid default addr"),
            module: None,
            nclients: 1,
            test_name: String::from(DEFAULT_TEST_NAME),
            debug_level: 0,
            user_cn: None,
            server: None,
            user_cert: None,
            user_key: None,
            user_ca_cert: None,
            user_ca_key: None,
            no_default_cn: false,
            no_self_signed: false,
            no_user_cert_signed: false,
            key_algorithm: KeyAlgorithm::default(),
        }
    }
}

impl Options {
    /// Check cross-field consistency that the flag parser cannot express.
    pub fn validate(&self) -> Result<(), AuditError> {
        if self.user_cert.is_some() != self.user_key.is_some() {
            return Err(AuditError::Config(
                "--user-cert and --user-key must be given together".into(),
            ));
        }
        if self.user_ca_cert.is_some() != self.user_ca_key.is_some() {
            return Err(AuditError::Config(
                "--user-ca-cert and --user-ca-key must be given together".into(),
            ));
        }
        if self.nclients == 0 {
            return Err(AuditError::Config("-c must be at least 1".into()));
        }
        Ok(())
    }
}

/// Parse the `-l` argument: either `PORT` or `HOST:PORT`.
///
/// A bare port binds the wildcard address; a host part may be an IP
/// literal or a resolvable name.
pub fn parse_listen(s: &str) -> Result<SocketAddr, AuditError> {
    if let Ok(port) = s.parse::<u16>() {
        return Ok(SocketAddr::new(IpAddr::from([0, 0, 0, 0]), port));
    }
    if let Ok(addr) = s.parse::<SocketAddr>() {
        return Ok(addr);
    }
    s.to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| AuditError::InvalidAddress(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listen_bare_port() {
        let addr = parse_listen("8443").unwrap();
        assert_eq!(addr.port(), 8443);
        assert!(addr.ip().is_unspecified());
    }

    #[test]
    fn test_parse_listen_host_port() {
        let addr = parse_listen("127.0.0.1:9999").unwrap();
        assert_eq!(addr.port(), 9999);
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
    }

    #[test]
    fn test_parse_listen_rejects_garbage() {
        assert!(parse_listen("nonsense").is_err());
        assert!(parse_listen("1.2.3.4:").is_err());
    }

    #[test]
    fn test_module_id_roundtrip() {
        assert_eq!("sslcert".parse::<ModuleId>().unwrap(), ModuleId::SslCert);
        assert_eq!("sslproto".parse::<ModuleId>().unwrap(), ModuleId::SslProto);
        assert!("dummy".parse::<ModuleId>().is_err());
    }

    #[test]
    fn test_validate_requires_paired_cert_and_key() {
        let options = Options {
            user_ca_cert: Some(PathBuf::from("ca.pem")),
            ..Options::default()
        };
        assert!(options.validate().is_err());

        let options = Options {
            user_cert: Some(PathBuf::from("cert.pem")),
            user_key: Some(PathBuf::from("key.pem")),
            ..Options::default()
        };
        options.validate().unwrap();
    }
}
