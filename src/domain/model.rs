use std::path::{Path, PathBuf};

use url::Url;

use super::error::{RequestError, UpdateError};
use crate::utils::staging_path_for;

/// One resource to fetch and the two local paths it passes through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    source: Url,
    staging_path: PathBuf,
    target_path: PathBuf,
}

impl TransferRequest {
    /// Stages under `scratch_dir`, named after the target's base name.
    pub fn new(
        source: Url,
        target_path: impl Into<PathBuf>,
        scratch_dir: impl AsRef<Path>,
    ) -> Result<Self, RequestError> {
        let target_path = target_path.into();
        let staging_path = staging_path_for(&target_path, scratch_dir.as_ref())
            .ok_or_else(|| RequestError::NoFileName(target_path.clone()))?;
        Self::with_staging_path(source, target_path, staging_path)
    }

    /// Uses an explicit staging path, e.g. a per-request unique name.
    pub fn with_staging_path(
        source: Url,
        target_path: impl Into<PathBuf>,
        staging_path: impl Into<PathBuf>,
    ) -> Result<Self, RequestError> {
        let target_path = target_path.into();
        let staging_path = staging_path.into();
        if target_path.file_name().is_none() {
            return Err(RequestError::NoFileName(target_path));
        }
        if staging_path == target_path {
            return Err(RequestError::StagingIsTarget(staging_path));
        }
        Ok(Self {
            source,
            staging_path,
            target_path,
        })
    }

    pub fn source(&self) -> &Url {
        &self.source
    }

    pub fn staging_path(&self) -> &Path {
        &self.staging_path
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Idle,
    Pulsing,
    InProgress,
    Cancelling,
    Succeeded,
    Failed,
}

impl TransferState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TransferState::Succeeded | TransferState::Failed)
    }
}

/// Raw byte counts reported by the worker. `bytes_total == 0` means unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    pub bytes_transferred: u64,
    pub bytes_total: u64,
}

impl ProgressEvent {
    /// Completed fraction clamped to `[0, 1]`, or `None` when the size is unknown.
    pub fn fraction(&self) -> Option<f64> {
        if self.bytes_total == 0 {
            return None;
        }
        Some((self.bytes_transferred as f64 / self.bytes_total as f64).clamp(0.0, 1.0))
    }
}

/// What the progress sink is asked to render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressUpdate {
    /// Indeterminate activity.
    Pulse,
    Fraction(f64),
}

impl From<ProgressEvent> for ProgressUpdate {
    fn from(event: ProgressEvent) -> Self {
        match event.fraction() {
            Some(fraction) => ProgressUpdate::Fraction(fraction),
            None => ProgressUpdate::Pulse,
        }
    }
}

pub type CompletionResult = Result<(), UpdateError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> Url {
        Url::parse("https://example.org/schedule.xml").unwrap()
    }

    #[test]
    fn test_staging_derived_from_base_name() {
        let request = TransferRequest::new(source(), "/data/schedule.xml", "/tmp/scratch").unwrap();
        assert_eq!(
            request.staging_path(),
            Path::new("/tmp/scratch/schedule.xml")
        );
        assert_eq!(request.target_path(), Path::new("/data/schedule.xml"));
    }

    #[test]
    fn test_rejects_target_without_file_name() {
        let err = TransferRequest::new(source(), "/", "/tmp").unwrap_err();
        assert_eq!(err, RequestError::NoFileName(PathBuf::from("/")));
    }

    #[test]
    fn test_rejects_scratch_dir_equal_to_target_dir() {
        let err = TransferRequest::new(source(), "/data/out.bin", "/data").unwrap_err();
        assert!(matches!(err, RequestError::StagingIsTarget(_)));
    }

    #[test]
    fn test_fraction_unknown_total() {
        let event = ProgressEvent {
            bytes_transferred: 512,
            bytes_total: 0,
        };
        assert_eq!(event.fraction(), None);
        assert_eq!(ProgressUpdate::from(event), ProgressUpdate::Pulse);
    }

    #[test]
    fn test_fraction_is_clamped() {
        let event = ProgressEvent {
            bytes_transferred: 150,
            bytes_total: 100,
        };
        assert_eq!(event.fraction(), Some(1.0));

        let half = ProgressEvent {
            bytes_transferred: 50,
            bytes_total: 100,
        };
        assert_eq!(ProgressUpdate::from(half), ProgressUpdate::Fraction(0.5));
    }

    #[test]
    fn test_terminal_states() {
        assert!(TransferState::Succeeded.is_terminal());
        assert!(TransferState::Failed.is_terminal());
        assert!(!TransferState::Cancelling.is_terminal());
    }
}
