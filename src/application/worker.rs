//! Transfer worker: copies the source into the staging file on its own task.
//!
//! The worker never touches the target path. Everything it has to say goes
//! through the event queue, ending with exactly one [`WorkerEvent::Done`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};
use url::Url;

use crate::domain::{CompletionResult, ProgressEvent, TransferError, TransferRequest, UpdateError};
use crate::source::{Fetch, FetchStream};

#[derive(Debug)]
pub enum WorkerEvent {
    Progress(ProgressEvent),
    Done(CompletionResult),
}

/// Starts copying `request.source()` into `request.staging_path()` and
/// returns immediately.
pub fn start(
    request: &TransferRequest,
    fetcher: Arc<dyn Fetch>,
    events: mpsc::Sender<WorkerEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    let source = request.source().clone();
    let staging = request.staging_path().to_path_buf();

    tokio::spawn(async move {
        let worker = TransferWorker {
            fetcher,
            source,
            staging,
            events,
            cancel,
        };
        let result = worker.copy_to_staging().await;
        // The receiver is gone only if the coordinator was dropped mid-run.
        let _ = worker.events.send(WorkerEvent::Done(result)).await;
    })
}

struct TransferWorker {
    fetcher: Arc<dyn Fetch>,
    source: Url,
    staging: PathBuf,
    events: mpsc::Sender<WorkerEvent>,
    cancel: CancellationToken,
}

impl TransferWorker {
    async fn copy_to_staging(&self) -> CompletionResult {
        let FetchStream { total, mut body } = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(UpdateError::Cancelled),
            opened = self.fetcher.open(&self.source) => opened?,
        };

        let mut file = create_staging(&self.staging).await?;
        let bytes_total = total.unwrap_or(0);
        let mut transferred: u64 = 0;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(UpdateError::Cancelled),
                next = body.next() => next,
            };
            let Some(chunk) = next else { break };
            let chunk = chunk?;

            if self.cancel.is_cancelled() {
                return Err(UpdateError::Cancelled);
            }
            file.write_all(&chunk).await.map_err(TransferError::from)?;
            transferred += chunk.len() as u64;
            trace!(transferred, bytes_total, "chunk staged");

            self.report(ProgressEvent {
                bytes_transferred: transferred,
                bytes_total,
            })
            .await?;
        }

        if bytes_total > 0 && transferred != bytes_total {
            return Err(TransferError::Incomplete {
                expected: bytes_total,
                received: transferred,
            }
            .into());
        }

        file.flush().await.map_err(TransferError::from)?;
        file.sync_all().await.map_err(TransferError::from)?;
        debug!(staging = %self.staging.display(), transferred, "staging file complete");

        Ok(())
    }

    async fn report(&self, event: ProgressEvent) -> CompletionResult {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(UpdateError::Cancelled),
            sent = self.events.send(WorkerEvent::Progress(event)) => {
                sent.map_err(|_| UpdateError::Cancelled)
            }
        }
    }
}

async fn create_staging(staging: &Path) -> Result<tokio::fs::File, TransferError> {
    if let Some(parent) = staging.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    // Truncates whatever an earlier aborted run left behind.
    Ok(tokio::fs::File::create(staging).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceClient;

    fn request_for(source: &Path, scratch: &Path, target: &Path) -> TransferRequest {
        TransferRequest::new(Url::from_file_path(source).unwrap(), target, scratch).unwrap()
    }

    async fn drain(mut rx: mpsc::Receiver<WorkerEvent>) -> (Vec<ProgressEvent>, CompletionResult) {
        let mut progress = Vec::new();
        while let Some(event) = rx.recv().await {
            match event {
                WorkerEvent::Progress(p) => progress.push(p),
                WorkerEvent::Done(result) => return (progress, result),
            }
        }
        panic!("worker exited without a completion event");
    }

    #[tokio::test]
    async fn test_copies_into_staging_only() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.bin");
        let payload = vec![7u8; 20_000];
        std::fs::write(&source, &payload).unwrap();
        let scratch = dir.path().join("scratch");
        let target = dir.path().join("out").join("data.bin");

        let request = request_for(&source, &scratch, &target);
        let (tx, rx) = mpsc::channel(4);
        start(
            &request,
            Arc::new(SourceClient::default()),
            tx,
            CancellationToken::new(),
        );

        let (progress, result) = drain(rx).await;
        assert!(result.is_ok());
        assert_eq!(std::fs::read(request.staging_path()).unwrap(), payload);
        assert!(!target.exists());

        assert!(!progress.is_empty());
        assert!(progress
            .windows(2)
            .all(|w| w[0].bytes_transferred <= w[1].bytes_transferred));
        let last = progress.last().unwrap();
        assert_eq!(last.bytes_transferred, 20_000);
        assert_eq!(last.bytes_total, 20_000);
    }

    #[tokio::test]
    async fn test_overwrites_stale_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.bin");
        std::fs::write(&source, b"new").unwrap();
        let scratch = dir.path().join("scratch");
        std::fs::create_dir_all(&scratch).unwrap();
        std::fs::write(scratch.join("data.bin"), b"stale leftover bytes").unwrap();

        let request = request_for(&source, &scratch, &dir.path().join("data.bin"));
        let (tx, rx) = mpsc::channel(4);
        start(
            &request,
            Arc::new(SourceClient::default()),
            tx,
            CancellationToken::new(),
        );

        let (_, result) = drain(rx).await;
        assert!(result.is_ok());
        assert_eq!(std::fs::read(request.staging_path()).unwrap(), b"new");
    }

    #[tokio::test]
    async fn test_cancelled_before_open() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("source.bin");
        std::fs::write(&source, b"payload").unwrap();
        let request = request_for(&source, &dir.path().join("scratch"), &dir.path().join("t.bin"));

        let cancel = CancellationToken::new();
        cancel.cancel();
        let (tx, rx) = mpsc::channel(4);
        start(&request, Arc::new(SourceClient::default()), tx, cancel);

        let (progress, result) = drain(rx).await;
        assert!(progress.is_empty());
        assert!(matches!(result, Err(UpdateError::Cancelled)));
    }

    #[tokio::test]
    async fn test_missing_source_is_transfer_error() {
        let dir = tempfile::tempdir().unwrap();
        let request = request_for(
            &dir.path().join("absent.bin"),
            &dir.path().join("scratch"),
            &dir.path().join("t.bin"),
        );

        let (tx, rx) = mpsc::channel(4);
        start(
            &request,
            Arc::new(SourceClient::default()),
            tx,
            CancellationToken::new(),
        );

        let (_, result) = drain(rx).await;
        assert!(matches!(
            result,
            Err(UpdateError::Transfer(TransferError::Io(_)))
        ));
    }
}
