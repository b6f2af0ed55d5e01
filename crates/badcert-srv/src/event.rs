//! Audit events and the sink contract.

use std::net::SocketAddr;
use std::sync::Arc;

use badcert_core::{ClientId, Outcome};

use crate::plan::Profile;

/// One classified connection.
#[derive(Debug, Clone)]
pub struct ConnectionResult {
    /// Which client the connection belonged to.
    pub client: ClientId,
    /// The connection's actual peer address (IP and ephemeral port).
    pub peer: SocketAddr,
    /// The profile the connection was audited against.
    pub profile: Arc<Profile>,
    /// What the client did.
    pub outcome: Outcome,
}

/// Everything the engine reports about a run.
///
/// For a single client the sink observes a strict sequence: one
/// `ClientAuditStart`, one `ClientConnectionResult` per plan entry in plan
/// order, one `ClientAuditEnd`. Events of distinct clients interleave
/// arbitrarily.
#[derive(Debug, Clone)]
pub enum AuditEvent {
    /// First connection from a new client arrived.
    ClientAuditStart(ClientId),

    /// One connection was audited and classified.
    ClientConnectionResult(ConnectionResult),

    /// The client has been offered every profile in the plan.
    ClientAuditEnd(ClientId),

    /// A worker failed in a way that is not a client behavior. The run
    /// continues.
    InternalError {
        client: Option<ClientId>,
        message: String,
    },
}

/// Consumer of audit events.
///
/// Implementations live outside the engine: the CLI prints result lines,
/// a GUI forwards them to its widgets, tests collect them.
pub trait EventSink: Send {
    fn handle_event(&mut self, event: &AuditEvent);
}
