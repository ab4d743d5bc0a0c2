//! Command-line front end: one source, one target, Ctrl-C cancels.

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{error, info};
use url::Url;

use crate::application::{Updater, UpdaterConfig};
use crate::domain::{TransferRequest, TransferState};
use crate::ui::{ConsoleProgress, OutputMode};

/// Fetch SOURCE into scratch storage, then atomically replace TARGET.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(author, version, about)]
pub struct CliArgs {
    /// Emit progress as JSON lines instead of a progress bar.
    #[arg(long)]
    pub json: bool,

    /// URL or local path to fetch.
    #[arg(value_parser = source_location)]
    pub source: Url,

    /// File to replace once the transfer succeeded.
    pub target: PathBuf,
}

impl CliArgs {
    pub fn mode(&self) -> OutputMode {
        if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        }
    }
}

/// Accepts a URL or a plain local path.
fn source_location(raw: &str) -> Result<Url, String> {
    // Single-letter schemes are Windows drive letters, not URLs.
    if let Ok(url) = Url::parse(raw) {
        if url.scheme().len() > 1 {
            return Ok(url);
        }
    }

    let path = Path::new(raw);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| format!("cannot resolve {}: {}", raw, e))?
            .join(path)
    };
    Url::from_file_path(&absolute).map_err(|_| format!("invalid source location: {}", raw))
}

/// Runs one update; returns whether the target was replaced.
pub async fn run(args: CliArgs) -> bool {
    let config = UpdaterConfig::from_env();
    let request = match TransferRequest::new(args.source.clone(), &args.target, &config.scratch_dir) {
        Ok(request) => request,
        Err(e) => {
            error!(error = %e, "invalid request");
            return false;
        }
    };

    let updater = Updater::new(request, &config);
    let cancel = updater.cancel_handle();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received");
            cancel.cancel();
        }
    });

    let mut sink = ConsoleProgress::stderr(args.mode());
    let state = updater
        .run(&mut sink, |updater, err| match err {
            None => info!(
                target_path = %updater.request().target_path().display(),
                "target replaced"
            ),
            Some(e) => error!(kind = ?e.kind(), error = %e, "update failed"),
        })
        .await;

    interrupt.abort();
    state == TransferState::Succeeded
}
