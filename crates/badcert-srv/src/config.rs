//! Runtime tunables for the audit engine.

use std::time::Duration;

/// Knobs that bound the engine's blocking points.
///
/// Defaults are what the CLI runs with; the test suite shrinks the
/// timeouts so a full matrix completes in seconds.
#[derive(Debug, Clone)]
pub struct AuditorConfig {
    /// How long one TLS handshake may take.
    pub handshake_timeout: Duration,

    /// Post-handshake window in which the peer may send data.
    pub read_timeout: Duration,

    /// Upper bound on captured post-handshake bytes.
    pub probe_limit: usize,

    /// Capacity of the bounded result queue.
    pub queue_capacity: usize,

    /// How long a producer waits on a full result queue before dropping
    /// the event instead of stalling the listener.
    pub queue_send_timeout: Duration,

    /// Poll interval of the result reader; bounds how quickly a stop
    /// request is observed.
    pub queue_read_timeout: Duration,

    /// How long shutdown waits for the dispatcher and its workers.
    pub join_timeout: Duration,
}

impl Default for AuditorConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_secs(5),
            read_timeout: Duration::from_secs(5),
            probe_limit: 1024,
            queue_capacity: 128,
            queue_send_timeout: Duration::from_secs(1),
            queue_read_timeout: Duration::from_millis(100),
            join_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AuditorConfig::default();
        assert_eq!(config.handshake_timeout, Duration::from_secs(5));
        assert_eq!(config.read_timeout, Duration::from_secs(5));
        assert!(config.queue_read_timeout <= Duration::from_millis(100));
        assert!(config.queue_capacity > 0);
    }
}
