use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::commit;
use super::config::UpdaterConfig;
use super::pulse::PulseTimer;
use super::worker::{self, WorkerEvent};
use crate::domain::{
    CompletionResult, ProgressEvent, ProgressUpdate, TransferError, TransferRequest,
    TransferState, UpdateError,
};
use crate::source::{Fetch, SourceClient};

/// Receives everything the caller should render.
pub trait ProgressSink: Send {
    fn update(&mut self, update: ProgressUpdate);

    /// Terminal notification, delivered once after the last update.
    fn finished(&mut self, _error: Option<&UpdateError>) {}
}

/// Idempotent cancel trigger for a running [`Updater`].
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Fetches one resource into staging and, only once that succeeded,
/// atomically replaces the target with it.
pub struct Updater {
    request: TransferRequest,
    pulse_interval: Duration,
    event_capacity: usize,
    fetcher: Arc<dyn Fetch>,
    state: TransferState,
    cancel_requested: CancellationToken,
    size_known: bool,
}

impl Updater {
    /// Clears any staging file left at the derived path by an earlier run.
    ///
    /// Nothing is spawned yet: `state()` stays `Idle` until [`run`](Self::run)
    /// starts the worker and the activity pulse. `config.scratch_dir` is not
    /// read here, the staging path is already fixed by `request`.
    pub fn new(request: TransferRequest, config: &UpdaterConfig) -> Self {
        discard_stale_staging(&request);
        Self {
            request,
            pulse_interval: config.pulse_interval,
            event_capacity: config.event_capacity,
            fetcher: Arc::new(SourceClient::default()),
            state: TransferState::Idle,
            cancel_requested: CancellationToken::new(),
            size_known: false,
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetch>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            token: self.cancel_requested.clone(),
        }
    }

    pub fn request(&self) -> &TransferRequest {
        &self.request
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    /// Drives the transfer to a terminal state.
    ///
    /// This future is the control context: every state change, sink update and
    /// the `finished` call happen here, never on the worker task. `finished`
    /// is invoked exactly once, with `None` on success. The state moves from
    /// `Idle` to `Pulsing` as soon as this starts.
    pub async fn run<S, F>(mut self, sink: &mut S, finished: F) -> TransferState
    where
        S: ProgressSink + ?Sized,
        F: FnOnce(&Updater, Option<&UpdateError>),
    {
        let (tx, mut rx) = mpsc::channel(self.event_capacity.max(1));
        let worker_cancel = CancellationToken::new();
        let cancel_requested = self.cancel_requested.clone();

        info!(
            source = %self.request.source(),
            target_path = %self.request.target_path().display(),
            "starting update"
        );
        let worker = worker::start(
            &self.request,
            Arc::clone(&self.fetcher),
            tx,
            worker_cancel.clone(),
        );
        let mut pulse = PulseTimer::start(self.pulse_interval);
        self.state = TransferState::Pulsing;

        let transfer = loop {
            let cancelling = self.state == TransferState::Cancelling;
            tokio::select! {
                biased;
                _ = cancel_requested.cancelled(), if !cancelling => {
                    self.begin_cancel(&mut pulse, &worker_cancel);
                }
                event = rx.recv() => match event {
                    Some(WorkerEvent::Progress(progress)) => {
                        self.on_progress(progress, &mut pulse, sink);
                    }
                    Some(WorkerEvent::Done(result)) => break result,
                    None => {
                        break Err(UpdateError::from(TransferError::Io(io::Error::other(
                            "transfer worker stopped without reporting",
                        ))))
                    }
                },
                _ = pulse.tick(), if pulse.is_active() => {
                    sink.update(ProgressUpdate::Pulse);
                }
            }
        };

        pulse.stop();
        if let Err(e) = worker.await {
            debug!(error = %e, "transfer worker task did not join cleanly");
        }

        let outcome = match transfer {
            Ok(()) => self.commit().await,
            Err(e) => Err(e),
        };
        self.finish(outcome, sink, finished)
    }

    fn begin_cancel(&mut self, pulse: &mut PulseTimer, worker_cancel: &CancellationToken) {
        info!(target_path = %self.request.target_path().display(), "cancelling update");
        pulse.stop();
        self.state = TransferState::Cancelling;
        worker_cancel.cancel();
    }

    fn on_progress<S>(&mut self, progress: ProgressEvent, pulse: &mut PulseTimer, sink: &mut S)
    where
        S: ProgressSink + ?Sized,
    {
        if pulse.stop() {
            debug!("first progress received, activity pulse stopped");
        }
        if self.state == TransferState::Pulsing {
            self.state = TransferState::InProgress;
        }
        self.size_known = progress.bytes_total > 0;
        sink.update(ProgressUpdate::from(progress));
    }

    async fn commit(&self) -> CompletionResult {
        let staging = self.request.staging_path();
        let target = self.request.target_path();
        commit::replace(staging, target)
            .await
            .map_err(|source| UpdateError::Commit {
                path: target.to_path_buf(),
                source,
            })
    }

    fn finish<S, F>(mut self, outcome: CompletionResult, sink: &mut S, finished: F) -> TransferState
    where
        S: ProgressSink + ?Sized,
        F: FnOnce(&Updater, Option<&UpdateError>),
    {
        match &outcome {
            Ok(()) => {
                if self.size_known {
                    sink.update(ProgressUpdate::Fraction(1.0));
                }
                self.state = TransferState::Succeeded;
                info!(target_path = %self.request.target_path().display(), "update complete");
            }
            Err(e) => {
                self.state = TransferState::Failed;
                warn!(
                    target_path = %self.request.target_path().display(),
                    staging = %self.request.staging_path().display(),
                    error = %e,
                    "update failed, target left untouched"
                );
            }
        }

        let error = outcome.as_ref().err();
        sink.finished(error);
        finished(&self, error);
        self.state
    }
}

fn discard_stale_staging(request: &TransferRequest) {
    let staging = request.staging_path();
    match std::fs::remove_file(staging) {
        Ok(()) => debug!(staging = %staging.display(), "removed stale staging file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => debug!(
            staging = %staging.display(),
            error = %e,
            "could not remove stale staging file"
        ),
    }
}
