//! Command-line argument definitions using clap.

use std::path::PathBuf;

use clap::Parser;

use badcert_core::{parse_listen, AuditError, ModuleId, Options, DEFAULT_LISTEN, DEFAULT_TEST_NAME};

/// Audit the certificate-validation behavior of TLS clients.
///
/// badcert listens as a deliberately-misbehaving TLS server. Point the
/// client under test at it, let it connect once per profile, and read the
/// resulting matrix to see which bogus certificates the client accepts.
#[derive(Parser, Debug)]
#[command(name = "badcert")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Listening [HOST:]PORT
    #[arg(short = 'l', value_name = "[HOST:]PORT", default_value = DEFAULT_LISTEN)]
    pub listen: String,

    /// Audit module (sslcert, sslproto); by default sslcert
    #[arg(short = 'm', value_name = "MODULE")]
    pub module: Option<String>,

    /// Number of clients to handle before quitting
    #[arg(short = 'c', value_name = "N", default_value_t = 1)]
    pub nclients: usize,

    /// User-specified name of the test
    #[arg(short = 'N', value_name = "NAME")]
    pub test_name: Option<String>,

    /// Debug level
    #[arg(short = 'd', value_name = "LEVEL", default_value_t = 0)]
    pub debug_level: u8,

    /// Use specified CN on generated certificates
    #[arg(long = "user-cn", value_name = "CN")]
    pub user_cn: Option<String>,

    /// HOST:PORT to fetch the certificate CN from
    #[arg(long, value_name = "HOST:PORT")]
    pub server: Option<String>,

    /// A file with a user-supplied certificate, presented as one profile
    #[arg(long = "user-cert", value_name = "FILE", requires = "user_key")]
    pub user_cert: Option<PathBuf>,

    /// A file with the key for --user-cert
    #[arg(long = "user-key", value_name = "FILE", requires = "user_cert")]
    pub user_key: Option<PathBuf>,

    /// A file with a CA certificate used to sign generated certificates
    #[arg(long = "user-ca-cert", value_name = "FILE", requires = "user_ca_key")]
    pub user_ca_cert: Option<PathBuf>,

    /// A file with the key for --user-ca-cert
    #[arg(long = "user-ca-key", value_name = "FILE", requires = "user_ca_cert")]
    pub user_ca_key: Option<PathBuf>,

    /// Do not use the built-in default CN
    #[arg(long = "no-default-cn")]
    pub no_default_cn: bool,

    /// Don't try self-signed certificates
    #[arg(long = "no-self-signed")]
    pub no_self_signed: bool,

    /// Do not sign server certificates with the user-supplied CA
    #[arg(long = "no-user-cert-signed")]
    pub no_user_cert_signed: bool,
}

impl Cli {
    /// Translate the flag surface into engine options.
    pub fn to_options(&self) -> Result<Options, AuditError> {
        let module = match &self.module {
            Some(name) => Some(name.parse::<ModuleId>()?),
            None => None,
        };
        let options = Options {
            listen: parse_listen(&self.listen)?,
            module,
            nclients: self.nclients,
            test_name: self
                .test_name
                .clone()
                .unwrap_or_else(|| DEFAULT_TEST_NAME.to_string()),
            debug_level: self.debug_level,
            user_cn: self.user_cn.clone(),
            server: self.server.clone(),
            user_cert: self.user_cert.clone(),
            user_key: self.user_key.clone(),
            user_ca_cert: self.user_ca_cert.clone(),
            user_ca_key: self.user_ca_key.clone(),
            no_default_cn: self.no_default_cn,
            no_self_signed: self.no_self_signed,
            no_user_cert_signed: self.no_user_cert_signed,
            ..Options::default()
        };
        options.validate()?;
        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["badcert"]).unwrap();
        let options = cli.to_options().unwrap();
        assert_eq!(options.listen.port(), 8443);
        assert_eq!(options.nclients, 1);
        assert_eq!(options.test_name, DEFAULT_TEST_NAME);
        assert!(options.module.is_none());
        assert!(!options.no_default_cn);
    }

    #[test]
    fn test_bare_port_listen() {
        let cli = Cli::try_parse_from(["badcert", "-l", "9999"]).unwrap();
        let options = cli.to_options().unwrap();
        assert_eq!(options.listen.port(), 9999);
        assert!(options.listen.ip().is_unspecified());
    }

    #[test]
    fn test_full_flag_surface() {
        let cli = Cli::try_parse_from([
            "badcert",
            "-l",
            "127.0.0.1:4433",
            "-m",
            "sslcert",
            "-c",
            "5",
            "-N",
            "nightly run",
            "-d",
            "2",
            "--user-cn",
            "victim.example.com",
            "--user-ca-cert",
            "ca.pem",
            "--user-ca-key",
            "ca.key",
            "--no-default-cn",
        ])
        .unwrap();
        let options = cli.to_options().unwrap();
        assert_eq!(options.listen.to_string(), "127.0.0.1:4433");
        assert_eq!(options.module, Some(ModuleId::SslCert));
        assert_eq!(options.nclients, 5);
        assert_eq!(options.test_name, "nightly run");
        assert_eq!(options.debug_level, 2);
        assert_eq!(options.user_cn.as_deref(), Some("victim.example.com"));
        assert!(options.no_default_cn);
    }

    #[test]
    fn test_unknown_module_rejected() {
        let cli = Cli::try_parse_from(["badcert", "-m", "dummy"]).unwrap();
        assert!(cli.to_options().is_err());
    }

    #[test]
    fn test_user_cert_requires_key() {
        assert!(Cli::try_parse_from(["badcert", "--user-cert", "c.pem"]).is_err());
        assert!(Cli::try_parse_from(["badcert", "--user-ca-key", "k.pem"]).is_err());
    }
}
