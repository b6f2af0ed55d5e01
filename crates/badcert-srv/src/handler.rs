//! Per-connection TLS handshake driver and outcome classifier.

use std::io::ErrorKind;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsAcceptor;
use tracing::{debug, trace};

use badcert_core::Outcome;

use crate::config::AuditorConfig;
use crate::error::Result;
use crate::plan::Profile;
use crate::tls;

/// Drive the handshake for one accepted connection and classify what the
/// peer did.
///
/// Per-connection failures are outcomes, never errors; an `Err` from here
/// means the engine itself is broken.
pub(crate) async fn probe(
    stream: TcpStream,
    profile: &Profile,
    config: &AuditorConfig,
) -> Result<Outcome> {
    let acceptor = TlsAcceptor::from(profile.tls_config());

    let mut tls = match timeout(config.handshake_timeout, acceptor.accept(stream)).await {
        Err(_) => {
            trace!(profile = %profile, "handshake timed out");
            return Ok(Outcome::HandshakeError { alert: "timeout".into() });
        }
        Ok(Err(e)) => return Ok(classify_handshake_error(&e)),
        Ok(Ok(tls)) => tls,
    };

    // The client committed to the chain. Did it also volunteer a cert?
    let client_chain: Vec<Vec<u8>> = tls
        .get_ref()
        .1
        .peer_certificates()
        .map(|certs| certs.iter().map(|c| c.as_ref().to_vec()).collect())
        .unwrap_or_default();
    if !client_chain.is_empty() {
        let _ = tls.shutdown().await;
        return Ok(Outcome::ConnectedSentClientCert { chain: client_chain });
    }

    let mut buf = vec![0_u8; config.probe_limit];
    let outcome = match timeout(config.read_timeout, tls.read(&mut buf)).await {
        Ok(Ok(n)) if n > 0 => {
            buf.truncate(n);
            Outcome::ConnectedGotRequest { data: buf }
        }
        // Timeout, clean close or reset: connected, but no request observed.
        _ => Outcome::ConnectedReadTimeout { data: None },
    };
    let _ = tls.shutdown().await;
    Ok(outcome)
}

/// Map a failed handshake onto the outcome taxonomy.
fn classify_handshake_error(error: &std::io::Error) -> Outcome {
    if let Some(tls_error) = error
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>())
    {
        let alert = match tls_error {
            rustls::Error::AlertReceived(alert) => tls::alert_name(*alert),
            // The peer spoke, but not TLS.
            rustls::Error::InvalidMessage(_) => "not_tls".into(),
            // No common version or suite; we sent the alert, not the peer.
            rustls::Error::PeerIncompatible(_) => "incompatible".into(),
            rustls::Error::PeerMisbehaved(_) => "peer_misbehaved".into(),
            other => {
                debug!(error = %other, "unclassified handshake failure");
                "failed".into()
            }
        };
        return Outcome::HandshakeError { alert };
    }

    match error.kind() {
        ErrorKind::UnexpectedEof
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::BrokenPipe => Outcome::UnexpectedEof,
        kind => {
            debug!(error = %error, "handshake io failure");
            Outcome::HandshakeError { alert: kind.to_string() }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_eof_kinds() {
        for kind in [
            ErrorKind::UnexpectedEof,
            ErrorKind::ConnectionReset,
            ErrorKind::ConnectionAborted,
        ] {
            let error = std::io::Error::new(kind, "gone");
            assert_eq!(classify_handshake_error(&error), Outcome::UnexpectedEof);
        }
    }

    #[test]
    fn test_classify_alert() {
        let error = std::io::Error::new(
            ErrorKind::InvalidData,
            rustls::Error::AlertReceived(rustls::AlertDescription::UnknownCA),
        );
        assert_eq!(
            classify_handshake_error(&error),
            Outcome::HandshakeError { alert: "unknown_ca".into() }
        );
    }

    #[test]
    fn test_classify_garbage() {
        let error = std::io::Error::new(
            ErrorKind::InvalidData,
            rustls::Error::InvalidMessage(rustls::InvalidMessage::InvalidContentType),
        );
        assert_eq!(
            classify_handshake_error(&error),
            Outcome::HandshakeError { alert: "not_tls".into() }
        );
    }
}
