//! CLI entry point: parse flags, run one audit, map errors to exit codes.

pub mod args;

use std::process::ExitCode;

use clap::error::ErrorKind as ClapErrorKind;
use clap::Parser;
use thiserror::Error;
use tracing::{error, info};

use badcert_srv::Controller;

use crate::output::TextSink;

/// Failures of a CLI run, split by exit code.
#[derive(Error, Debug)]
enum CliError {
    /// Bad flags, bad PEM material, bind failure: exit code 1.
    #[error("{0}")]
    Startup(String),

    /// The engine failed mid-run: exit code 2.
    #[error("{0}")]
    Internal(String),
}

/// Run the CLI application.
pub async fn run() -> ExitCode {
    let cli = match args::Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion) => {
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(1);
        }
    };

    init_tracing(cli.debug_level);

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(CliError::Startup(message)) => {
            error!(message = %message, "startup failed");
            ExitCode::from(1)
        }
        Err(CliError::Internal(message)) => {
            error!(message = %message, "audit failed");
            ExitCode::from(2)
        }
    }
}

async fn execute(cli: args::Cli) -> Result<(), CliError> {
    let options = cli
        .to_options()
        .map_err(|e| CliError::Startup(e.to_string()))?;
    let test_name = options.test_name.clone();

    let mut controller =
        Controller::new(options).map_err(|e| CliError::Startup(e.to_string()))?;
    controller
        .start()
        .await
        .map_err(|e| CliError::Startup(e.to_string()))?;

    // Ctrl-C turns into a clean stop: the run winds down, reports what it
    // has, and deletes its temp files.
    let stop = controller.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, stopping audit");
            stop.stop();
        }
    });

    let mut sink = TextSink::new(test_name);
    controller
        .run(&mut sink)
        .await
        .map_err(|e| CliError::Internal(e.to_string()))
}

fn init_tracing(debug_level: u8) {
    let default_filter = match debug_level {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    // Diagnostics go to stderr; stdout carries only result lines.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
