//! # badcert-cli
//!
//! Command-line front end for the badcert audit engine.
//!
//! Parses the flag surface, initializes logging, runs one audit and prints
//! one result line per audited connection to stdout. Exit codes: `0` when
//! the plan completed or the run was stopped cleanly, `1` for startup and
//! configuration errors, `2` for internal failures.

pub mod cli;
pub mod output;

pub use cli::run;
