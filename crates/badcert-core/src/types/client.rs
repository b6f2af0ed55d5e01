//! Client identity.

use std::net::{IpAddr, SocketAddr};

/// Identity of a client under audit.
///
/// Derived from the peer IP address only. All TCP connections arriving from
/// one IP belong to one client and advance through the audit plan together;
/// the source port is deliberately ignored because every reconnect uses a
/// fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub IpAddr);

impl From<SocketAddr> for ClientId {
    fn from(addr: SocketAddr) -> Self {
        Self(addr.ip())
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_id_ignores_port() {
        let a = ClientId::from("10.0.0.1:1234".parse::<SocketAddr>().unwrap());
        let b = ClientId::from("10.0.0.1:5678".parse::<SocketAddr>().unwrap());
        let c = ClientId::from("10.0.0.2:1234".parse::<SocketAddr>().unwrap());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
