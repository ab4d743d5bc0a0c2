use std::time::Duration;

/// Configuration for the source client
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub user_agent: String,
    pub connect_timeout: Option<Duration>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("staged-fetch/", env!("CARGO_PKG_VERSION")).to_string(),
            connect_timeout: Some(Duration::from_secs(30)),
        }
    }
}
