pub mod client;
pub mod models;

pub use client::{Fetch, FetchStream, SourceClient};
pub use models::SourceConfig;
