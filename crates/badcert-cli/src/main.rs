//! badcert - audit the certificate validation of TLS clients.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    badcert_cli::run().await
}
