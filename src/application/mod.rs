pub mod commit;
pub mod config;
pub mod coordinator;
pub mod pulse;
pub mod worker;

pub use config::UpdaterConfig;
pub use coordinator::{CancelHandle, ProgressSink, Updater};
