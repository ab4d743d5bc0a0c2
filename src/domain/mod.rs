pub mod error;
pub mod model;

pub use error::{ErrorKind, RequestError, TransferError, UpdateError};
pub use model::{CompletionResult, ProgressEvent, ProgressUpdate, TransferRequest, TransferState};
