//! Line-oriented stdout sink.

use tracing::{error, info};

use badcert_srv::{AuditEvent, ConnectionResult, EventSink};

/// Prints one fixed-column line per audited connection:
///
/// ```text
/// <test_name:25> <client_ip:port:22> <profile_label:70> <outcome>
/// ```
///
/// Start/end markers and internal errors go to the log on stderr so stdout
/// stays machine-consumable.
pub struct TextSink {
    test_name: String,
}

impl TextSink {
    pub fn new(test_name: String) -> Self {
        Self { test_name }
    }
}

impl EventSink for TextSink {
    fn handle_event(&mut self, event: &AuditEvent) {
        match event {
            AuditEvent::ClientConnectionResult(result) => {
                println!("{}", format_result_line(&self.test_name, result));
            }
            AuditEvent::ClientAuditStart(client) => {
                info!(client = %client, "client audit started");
            }
            AuditEvent::ClientAuditEnd(client) => {
                info!(client = %client, "client audit finished");
            }
            AuditEvent::InternalError { client, message } => match client {
                Some(client) => error!(client = %client, "internal_error({message})"),
                None => error!("internal_error({message})"),
            },
        }
    }
}

/// Render one result line.
pub fn format_result_line(test_name: &str, result: &ConnectionResult) -> String {
    let peer = result.peer.to_string();
    let profile = result.profile.to_string();
    format!(
        "{test_name:<25} {peer:<22} {profile:<70} {}",
        result.outcome
    )
}
