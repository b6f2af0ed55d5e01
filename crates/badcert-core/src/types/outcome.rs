//! Classification of a single audited connection.

/// What a client observably did when offered one profile.
///
/// These tags are the only behaviors a client's validator can exhibit on
/// the wire before any application-layer exchange, and they are sufficient
/// to decide whether the client accepted the presented chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The handshake failed; `alert` is the snake_case TLS alert name the
    /// peer sent (`unknown_ca` when the client rejected our chain), or a
    /// stable reason string when the failure produced no alert.
    HandshakeError { alert: String },

    /// The TCP connection closed before a TLS exchange completed, e.g. a
    /// plain-TCP client poking the port.
    UnexpectedEof,

    /// Handshake succeeded but the peer sent nothing within the
    /// post-handshake window. `data` carries any partial bytes captured.
    ConnectedReadTimeout { data: Option<Vec<u8>> },

    /// Handshake succeeded and the peer sent application data.
    ConnectedGotRequest { data: Vec<u8> },

    /// Handshake succeeded and the peer volunteered a client certificate
    /// chain (DER, leaf first).
    ConnectedSentClientCert { chain: Vec<Vec<u8>> },
}

impl Outcome {
    /// Relaxed comparison used by audit expectations.
    ///
    /// Tags must agree; `HandshakeError` additionally compares the alert
    /// name. Captured payload bytes never participate: any two timeouts
    /// match, as do any two captured requests or client-cert chains.
    pub fn matches(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::HandshakeError { alert: a }, Self::HandshakeError { alert: b }) => a == b,
            (Self::UnexpectedEof, Self::UnexpectedEof)
            | (Self::ConnectedReadTimeout { .. }, Self::ConnectedReadTimeout { .. })
            | (Self::ConnectedGotRequest { .. }, Self::ConnectedGotRequest { .. })
            | (Self::ConnectedSentClientCert { .. }, Self::ConnectedSentClientCert { .. }) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HandshakeError { alert } => write!(f, "HandshakeError({alert})"),
            Self::UnexpectedEof => write!(f, "UnexpectedEOF"),
            Self::ConnectedReadTimeout { data: None } => write!(f, "ConnectedReadTimeout"),
            Self::ConnectedReadTimeout { data: Some(data) } => {
                write!(f, "ConnectedReadTimeout({} bytes)", data.len())
            }
            Self::ConnectedGotRequest { data } => {
                write!(f, "ConnectedGotRequest({} bytes)", data.len())
            }
            Self::ConnectedSentClientCert { chain } => {
                write!(f, "ConnectedSentClientCert({} certs)", chain.len())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unknown_ca() -> Outcome {
        Outcome::HandshakeError { alert: "unknown_ca".into() }
    }

    #[test]
    fn test_matches_is_tag_based() {
        let timeout_none = Outcome::ConnectedReadTimeout { data: None };
        let timeout_some = Outcome::ConnectedReadTimeout { data: Some(vec![1, 2]) };
        assert!(timeout_none.matches(&timeout_some));
        assert_ne!(timeout_none, timeout_some);

        let req_a = Outcome::ConnectedGotRequest { data: b"GET /".to_vec() };
        let req_b = Outcome::ConnectedGotRequest { data: b"HELO".to_vec() };
        assert!(req_a.matches(&req_b));

        assert!(!timeout_none.matches(&req_a));
        assert!(!unknown_ca().matches(&Outcome::UnexpectedEof));
    }

    #[test]
    fn test_matches_compares_alert_names() {
        let expired = Outcome::HandshakeError { alert: "certificate_expired".into() };
        assert!(unknown_ca().matches(&unknown_ca()));
        assert!(!unknown_ca().matches(&expired));
    }

    #[test]
    fn test_display_forms() {
        assert_eq!(unknown_ca().to_string(), "HandshakeError(unknown_ca)");
        assert_eq!(Outcome::UnexpectedEof.to_string(), "UnexpectedEOF");
        assert_eq!(
            Outcome::ConnectedReadTimeout { data: None }.to_string(),
            "ConnectedReadTimeout"
        );
        assert_eq!(
            Outcome::ConnectedGotRequest { data: vec![0; 17] }.to_string(),
            "ConnectedGotRequest(17 bytes)"
        );
    }
}
