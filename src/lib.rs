//! Fetch a resource into a staging file, then atomically replace the target.
//!
//! The [`Updater`] runs a background [`worker`](application::worker) that
//! copies the source into scratch storage while the caller's task forwards
//! progress to a [`ProgressSink`]. The target is replaced only after the whole
//! transfer succeeded; on any failure, cancellation included, it is left as it
//! was.

pub mod app;
pub mod application;
pub mod domain;
pub mod source;
pub mod ui;
pub mod utils;

pub use application::{CancelHandle, ProgressSink, Updater, UpdaterConfig};
pub use domain::{
    CompletionResult, ErrorKind, ProgressEvent, ProgressUpdate, RequestError, TransferError,
    TransferRequest, TransferState, UpdateError,
};
pub use source::{Fetch, FetchStream, SourceClient, SourceConfig};
