use std::env;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PULSE_INTERVAL: Duration = Duration::from_millis(100);
const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Tuning for an [`Updater`](super::Updater).
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    /// How often activity pulses are emitted before real progress arrives.
    pub pulse_interval: Duration,
    /// Directory holding staging files. Kept apart from the target directory.
    pub scratch_dir: PathBuf,
    /// Bound of the worker to coordinator event queue.
    pub event_capacity: usize,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            pulse_interval: DEFAULT_PULSE_INTERVAL,
            scratch_dir: env::temp_dir(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl UpdaterConfig {
    /// Defaults overridden by `STAGED_FETCH_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let positive = |name: &str| {
            lookup(name)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|v| *v > 0)
        };

        Self {
            pulse_interval: positive("STAGED_FETCH_PULSE_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.pulse_interval),
            scratch_dir: lookup("STAGED_FETCH_SCRATCH_DIR")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.scratch_dir),
            event_capacity: positive("STAGED_FETCH_EVENT_CAPACITY")
                .map(|v| v as usize)
                .unwrap_or(defaults.event_capacity),
        }
    }
}
