//! Audit run lifecycle.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use badcert_ca::{fetch_server_cert, CertFactory, FileBag};
use badcert_core::Options;

use crate::config::AuditorConfig;
use crate::dispatcher::Dispatcher;
use crate::error::{Result, SrvError};
use crate::event::{AuditEvent, EventSink};
use crate::modules;
use crate::plan::Plan;

/// Handle for requesting a stop from outside the run loop (another task, a
/// signal handler, a GUI button).
#[derive(Debug, Clone)]
pub struct StopHandle(watch::Sender<bool>);

impl StopHandle {
    /// Signal the run to stop. Non-blocking, idempotent, never fails.
    pub fn stop(&self) {
        let _ = self.0.send(true);
    }
}

/// Owns one audit run: plan, listener, dispatcher, result forwarding.
///
/// Only configuration and startup problems propagate out of [`start`];
/// everything that happens to individual connections afterwards is
/// reported through the sink.
///
/// [`start`]: Controller::start
pub struct Controller {
    options: Options,
    config: Arc<AuditorConfig>,
    bag: FileBag,
    plan: Option<Arc<Plan>>,
    local_addr: Option<SocketAddr>,
    stop_tx: watch::Sender<bool>,
    stop_rx: watch::Receiver<bool>,
    events_rx: Option<mpsc::Receiver<AuditEvent>>,
    dispatcher: Option<JoinHandle<()>>,
    completed: Arc<AtomicUsize>,
}

impl Controller {
    pub fn new(options: Options) -> Result<Self> {
        Self::with_config(options, AuditorConfig::default())
    }

    pub fn with_config(options: Options, config: AuditorConfig) -> Result<Self> {
        options.validate()?;
        let bag = FileBag::new().map_err(SrvError::Ca)?;
        let (stop_tx, stop_rx) = watch::channel(false);
        Ok(Self {
            options,
            config: Arc::new(config),
            bag,
            plan: None,
            local_addr: None,
            stop_tx,
            stop_rx,
            events_rx: None,
            dispatcher: None,
            completed: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Materialize the plan, bind the listener and spawn the dispatcher.
    ///
    /// Fails fast: bad PEM material, an unreachable `--server` target or a
    /// bind failure all abort before anything listens.
    pub async fn start(&mut self) -> Result<()> {
        let factory = CertFactory::new(self.bag.clone(), self.options.key_algorithm);

        let user_ca = match (&self.options.user_ca_cert, &self.options.user_ca_key) {
            (Some(cert), Some(key)) => Some(factory.load_user_ca(cert, key)?),
            _ => None,
        };
        let user_cert = match (&self.options.user_cert, &self.options.user_key) {
            (Some(cert), Some(key)) => Some(factory.load_user_cert(cert, key)?),
            _ => None,
        };
        let discovered_cn = match &self.options.server {
            Some(target) => Some(fetch_server_cert(target).await?.cn),
            None => None,
        };

        let plan = Arc::new(modules::build_plan(
            &factory,
            &self.options,
            user_ca.as_deref(),
            user_cert,
            discovered_cn.as_deref(),
        )?);
        if plan.is_empty() {
            return Err(SrvError::Config(
                "audit plan is empty; every profile class is disabled".into(),
            ));
        }
        info!(profiles = plan.len(), "audit plan materialized");
        for profile in plan.iter() {
            debug!(profile = %profile, "plan entry");
        }

        let listener = TcpListener::bind(self.options.listen)
            .await
            .map_err(|e| SrvError::Server(format!("bind {}: {e}", self.options.listen)))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| SrvError::Server(e.to_string()))?;
        info!(addr = %local_addr, "audit listener bound");

        let (events_tx, events_rx) = mpsc::channel(self.config.queue_capacity);
        let dispatcher = Dispatcher::new(
            plan.clone(),
            self.config.clone(),
            self.options.nclients,
            events_tx,
            self.completed.clone(),
        );
        self.dispatcher = Some(tokio::spawn(dispatcher.run(listener, self.stop_rx.clone())));

        self.plan = Some(plan);
        self.local_addr = Some(local_addr);
        self.events_rx = Some(events_rx);
        Ok(())
    }

    /// Address the listener actually bound, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// The materialized plan, once started.
    pub fn plan(&self) -> Option<&Arc<Plan>> {
        self.plan.as_ref()
    }

    /// Where this run's temporary PEM files live.
    pub fn file_bag_path(&self) -> Option<PathBuf> {
        self.bag.path()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(self.stop_tx.clone())
    }

    /// Forward events to the sink until `nclients` completed or a stop was
    /// requested, then shut down and clean up.
    pub async fn run(mut self, sink: &mut dyn EventSink) -> Result<()> {
        let Some(mut events) = self.events_rx.take() else {
            self.shutdown().await;
            return Err(SrvError::Internal("run() called before start()".into()));
        };

        let mut finished = 0_usize;
        let stopped = loop {
            if finished >= self.options.nclients {
                break false;
            }
            if *self.stop_rx.borrow() {
                break true;
            }
            match timeout(self.config.queue_read_timeout, events.recv()).await {
                Ok(Some(event)) => {
                    if matches!(event, AuditEvent::ClientAuditEnd(_)) {
                        finished += 1;
                    }
                    sink.handle_event(&event);
                }
                Ok(None) => break *self.stop_rx.borrow(),
                Err(_) => {}
            }
        };

        if stopped {
            info!(clients = finished, "audit stopped");
        } else {
            info!(clients = finished, "audit complete");
        }
        self.shutdown().await;
        Ok(())
    }

    /// Tear down without running: used on startup-error paths.
    pub async fn stop(mut self) {
        self.shutdown().await;
    }

    async fn shutdown(&mut self) {
        let _ = self.stop_tx.send(true);
        if let Some(handle) = self.dispatcher.take() {
            if timeout(self.config.join_timeout, handle).await.is_err() {
                warn!("dispatcher did not finish within join timeout");
            }
        }
        self.bag.close();
    }
}
