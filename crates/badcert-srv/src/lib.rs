//! badcert-srv: the audit engine.
//!
//! A [`Controller`] owns one audit run: it materializes the profile plan,
//! binds the listener, and hands accepted connections to the dispatcher.
//! The dispatcher tracks clients by IP, serializes each client's
//! connections against the plan, and publishes [`AuditEvent`]s into a
//! bounded queue that the controller forwards to an [`EventSink`].
//!
//! # Flow
//!
//! ```text
//! Options ──> modules::build_plan ──> Plan (materialized certs)
//!                                       │
//! client ──TCP──> dispatcher ──> per-client worker ──> handler (TLS)
//!                                       │
//!                                  AuditEvent ──> Controller ──> EventSink
//! ```

pub mod config;
pub mod controller;
pub mod event;
pub mod modules;
pub mod plan;

mod dispatcher;
mod error;
mod handler;
mod tls;

pub use config::AuditorConfig;
pub use controller::{Controller, StopHandle};
pub use error::{Result, SrvError};
pub use event::{AuditEvent, ConnectionResult, EventSink};
pub use plan::{HandlerKind, Plan, Profile};
