//! Audit profile descriptions.
//!
//! A [`ProfileSpec`] is what one server-side test configuration *means*:
//! which CN the leaf carries, who signed it, and through which kind of
//! intermediate. Its `Display` form is the label printed in result lines,
//! so it must stay injective within a run.

/// Key algorithm for generated certificate material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyAlgorithm {
    /// RSA 2048-bit, the algorithm audited clients most commonly see.
    #[default]
    Rsa2048,
    /// ECDSA P-256, much faster to generate; used by the test suite.
    EcdsaP256,
}

/// BasicConstraints variant carried by a synthesized intermediate CA.
///
/// Probes whether the client enforces the extension: a validator that
/// accepts a chain through a `CA:FALSE` (or extension-free) intermediate is
/// broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImCaVariant {
    /// No BasicConstraints extension at all.
    NoConstraints,
    /// BasicConstraints present with `CA:FALSE`.
    CaFalse,
    /// BasicConstraints present with `CA:TRUE` (the only valid intermediate).
    CaTrue,
}

impl ImCaVariant {
    /// All variants in plan-enumeration order.
    pub const ALL: [Self; 3] = [Self::NoConstraints, Self::CaFalse, Self::CaTrue];

    /// The `BasicConstraints:CA` value to put on the issued certificate.
    pub const fn basic_constraints(self) -> Option<bool> {
        match self {
            Self::NoConstraints => None,
            Self::CaFalse => Some(false),
            Self::CaTrue => Some(true),
        }
    }

    /// CN given to the synthesized intermediate for this variant.
    pub const fn im_ca_cn(self) -> &'static str {
        match self {
            Self::NoConstraints => "im-ca-none",
            Self::CaFalse => "im-ca-false",
            Self::CaTrue => "im-ca-true",
        }
    }
}

/// TLS protocol versions covered by the `sslproto` sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsProto {
    Tls12,
    Tls13,
}

impl TlsProto {
    /// Sweep order.
    pub const ALL: [Self; 2] = [Self::Tls12, Self::Tls13];
}

impl std::fmt::Display for TlsProto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tls12 => write!(f, "tls1.2"),
            Self::Tls13 => write!(f, "tls1.3"),
        }
    }
}

/// Bulk-cipher families covered by the `sslproto` sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherClass {
    Aes128Gcm,
    Aes256Gcm,
    ChaCha20,
}

impl CipherClass {
    /// Sweep order.
    pub const ALL: [Self; 3] = [Self::Aes128Gcm, Self::Aes256Gcm, Self::ChaCha20];
}

impl std::fmt::Display for CipherClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Aes128Gcm => write!(f, "aes128-gcm"),
            Self::Aes256Gcm => write!(f, "aes256-gcm"),
            Self::ChaCha20 => write!(f, "chacha20"),
        }
    }
}

/// Human-meaningful description of one audit profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSpec {
    /// Leaf signed by itself.
    SelfSigned { cn: String },

    /// Leaf signed directly by a CA.
    Signed { cn: String, ca_cn: String },

    /// Leaf signed by a synthesized intermediate, itself signed by a CA.
    ImCaSigned {
        cn: String,
        variant: ImCaVariant,
        ca_cn: String,
    },

    /// The exact certificate and key the user supplied on the command line.
    UserSupplied { cn: String },

    /// Protocol/cipher sweep entry; the leaf is a throwaway self-signed.
    Proto {
        proto: TlsProto,
        cipher: CipherClass,
    },
}

impl std::fmt::Display for ProfileSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfSigned { cn } => write!(f, "self_signed({cn})"),
            Self::Signed { cn, ca_cn } => write!(f, "signed({cn}, {ca_cn})"),
            Self::ImCaSigned { cn, variant, ca_cn } => {
                write!(f, "imca_signed({cn}, {}, {ca_cn})", variant.im_ca_cn())
            }
            Self::UserSupplied { cn } => write!(f, "user_supplied({cn})"),
            Self::Proto { proto, cipher } => write!(f, "sslproto({proto}, {cipher})"),
        }
    }
}
