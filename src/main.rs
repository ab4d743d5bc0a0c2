use std::process::ExitCode;

use clap::Parser;
use staged_fetch::app::{self, CliArgs};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // Usage errors exit with 2, --help and --version with 0.
            let _ = e.print();
            return ExitCode::from(e.exit_code() as u8);
        }
    };

    if app::run(args).await {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
