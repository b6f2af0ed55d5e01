//! Connection dispatcher: accepts, tracks clients, serializes per-client
//! work.
//!
//! Serialization falls out of queue FIFO: each client gets one worker task
//! fed through one queue, so a client's next connection is never audited
//! before the previous one was classified and the cursor advanced. Distinct
//! clients run fully in parallel.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, trace, warn};

use badcert_core::ClientId;

use crate::config::AuditorConfig;
use crate::event::{AuditEvent, ConnectionResult};
use crate::handler;
use crate::plan::Plan;

type ClientQueue = mpsc::UnboundedSender<(TcpStream, SocketAddr)>;
type ClientMap = Arc<Mutex<HashMap<ClientId, ClientQueue>>>;

pub(crate) struct Dispatcher {
    plan: Arc<Plan>,
    config: Arc<AuditorConfig>,
    nclients: usize,
    events: mpsc::Sender<AuditEvent>,
    completed: Arc<AtomicUsize>,
    clients: ClientMap,
}

impl Dispatcher {
    pub fn new(
        plan: Arc<Plan>,
        config: Arc<AuditorConfig>,
        nclients: usize,
        events: mpsc::Sender<AuditEvent>,
        completed: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            plan,
            config,
            nclients,
            events,
            completed,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Accept until enough clients completed or stop is signalled, then
    /// drain in-flight workers within the join timeout.
    pub async fn run(self, listener: TcpListener, mut stop: watch::Receiver<bool>) {
        let mut workers = JoinSet::new();

        loop {
            if *stop.borrow() || self.completed.load(Ordering::SeqCst) >= self.nclients {
                break;
            }
            tokio::select! {
                changed = stop.changed() => {
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => self.dispatch(stream, peer, &mut workers).await,
                    Err(e) => {
                        // Per-connection accept errors don't end the run.
                        warn!(error = %e, "accept failed");
                        sleep(Duration::from_millis(100)).await;
                    }
                }
            }
        }

        drop(listener);
        // Unblock idle workers; ones mid-handshake finish within their
        // timeouts.
        lock(&self.clients).clear();

        debug!("draining in-flight workers");
        let deadline = Instant::now() + self.config.join_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match timeout(remaining, workers.join_next()).await {
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(_) => {
                    warn!("workers did not drain within join timeout");
                    workers.abort_all();
                    break;
                }
            }
        }
        debug!("dispatcher stopped");
    }

    /// Route one accepted connection to its client's worker.
    async fn dispatch(&self, stream: TcpStream, peer: SocketAddr, workers: &mut JoinSet<()>) {
        let client = ClientId::from(peer);
        trace!(client = %client, peer = %peer, "connection accepted");

        let mut conn = Some((stream, peer));
        // Two rounds: the worker may have just finished its plan and
        // dropped the queue, in which case a fresh cursor is created.
        for _ in 0..2 {
            let (queue, is_new) = {
                let mut clients = lock(&self.clients);
                match clients.get(&client) {
                    Some(queue) => (queue.clone(), false),
                    None => {
                        let (tx, rx) = mpsc::unbounded_channel();
                        clients.insert(client, tx.clone());
                        workers.spawn(client_worker(ClientWorker {
                            client,
                            rx,
                            plan: self.plan.clone(),
                            config: self.config.clone(),
                            events: self.events.clone(),
                            completed: self.completed.clone(),
                            clients: self.clients.clone(),
                        }));
                        (tx, true)
                    }
                }
            };

            if is_new {
                debug!(client = %client, "new client");
                publish(&self.events, &self.config, AuditEvent::ClientAuditStart(client)).await;
            }

            let Some(payload) = conn.take() else { return };
            match queue.send(payload) {
                Ok(()) => return,
                Err(mpsc::error::SendError(payload)) => {
                    let mut clients = lock(&self.clients);
                    if let Some(stale) = clients.get(&client) {
                        if stale.same_channel(&queue) {
                            clients.remove(&client);
                        }
                    }
                    conn = Some(payload);
                }
            }
        }
        warn!(client = %client, "dropping connection, no worker queue available");
    }
}

struct ClientWorker {
    client: ClientId,
    rx: mpsc::UnboundedReceiver<(TcpStream, SocketAddr)>,
    plan: Arc<Plan>,
    config: Arc<AuditorConfig>,
    events: mpsc::Sender<AuditEvent>,
    completed: Arc<AtomicUsize>,
    clients: ClientMap,
}

/// Walk the plan for one client, one queued connection per profile.
async fn client_worker(mut worker: ClientWorker) {
    for index in 0..worker.plan.len() {
        let Some((stream, peer)) = worker.rx.recv().await else {
            debug!(client = %worker.client, "queue closed before plan completion");
            return;
        };
        let Some(profile) = worker.plan.get(index).cloned() else {
            return;
        };
        trace!(client = %worker.client, profile = %profile, "auditing connection");

        let result =
            AssertUnwindSafe(handler::probe(stream, &profile, &worker.config)).catch_unwind().await;
        let event = match result {
            Ok(Ok(outcome)) => AuditEvent::ClientConnectionResult(ConnectionResult {
                client: worker.client,
                peer,
                profile,
                outcome,
            }),
            Ok(Err(e)) => AuditEvent::InternalError {
                client: Some(worker.client),
                message: e.to_string(),
            },
            Err(_) => AuditEvent::InternalError {
                client: Some(worker.client),
                message: "connection worker panicked".into(),
            },
        };
        publish(&worker.events, &worker.config, event).await;
    }

    publish(&worker.events, &worker.config, AuditEvent::ClientAuditEnd(worker.client)).await;
    worker.completed.fetch_add(1, Ordering::SeqCst);
    lock(&worker.clients).remove(&worker.client);
    info!(client = %worker.client, "client audit complete");
}

/// Push an event into the bounded result queue; wait briefly on overflow,
/// then drop rather than stall the listener.
async fn publish(events: &mpsc::Sender<AuditEvent>, config: &AuditorConfig, event: AuditEvent) {
    use mpsc::error::SendTimeoutError;

    match events.send_timeout(event, config.queue_send_timeout).await {
        Ok(()) => {}
        Err(SendTimeoutError::Timeout(event)) => {
            warn!(event = ?event, "result queue full, dropping event");
        }
        Err(SendTimeoutError::Closed(_)) => {
            debug!("result queue closed, dropping event");
        }
    }
}

fn lock(clients: &ClientMap) -> std::sync::MutexGuard<'_, HashMap<ClientId, ClientQueue>> {
    clients.lock().unwrap_or_else(PoisonError::into_inner)
}
