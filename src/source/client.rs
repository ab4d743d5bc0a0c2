use std::io;

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt, TryStreamExt};
use reqwest::Client;
use tokio_util::io::ReaderStream;
use tracing::debug;
use url::Url;

use super::models::SourceConfig;
use crate::domain::TransferError;

pub type Result<T> = std::result::Result<T, TransferError>;

/// An opened source: its body and, when the source announces it, its size.
pub struct FetchStream {
    pub total: Option<u64>,
    pub body: BoxStream<'static, Result<Bytes>>,
}

/// Opens a source location as a byte stream.
pub trait Fetch: Send + Sync {
    fn open<'a>(&'a self, source: &'a Url) -> BoxFuture<'a, Result<FetchStream>>;
}

/// Reads `http(s)://` and `file://` locations.
#[derive(Clone, Default)]
pub struct SourceClient {
    config: SourceConfig,
}

impl SourceClient {
    pub fn new(config: SourceConfig) -> Self {
        Self { config }
    }

    async fn open_http(&self, source: &Url) -> Result<FetchStream> {
        let mut builder = Client::builder().user_agent(self.config.user_agent.as_str());
        if let Some(timeout) = self.config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder.build()?;

        let response = client.get(source.clone()).send().await?.error_for_status()?;

        let total = response.content_length();
        let body = response
            .bytes_stream()
            .map_err(TransferError::Request)
            .boxed();

        Ok(FetchStream { total, body })
    }

    async fn open_file(&self, source: &Url) -> Result<FetchStream> {
        let path = source.to_file_path().map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a local file location: {}", source),
            )
        })?;

        let file = tokio::fs::File::open(&path).await?;
        let total = file.metadata().await?.len();
        let body = ReaderStream::new(file).map_err(TransferError::Io).boxed();

        Ok(FetchStream {
            total: Some(total),
            body,
        })
    }
}

impl Fetch for SourceClient {
    fn open<'a>(&'a self, source: &'a Url) -> BoxFuture<'a, Result<FetchStream>> {
        async move {
            let opened = match source.scheme() {
                "http" | "https" => self.open_http(source).await?,
                "file" => self.open_file(source).await?,
                other => return Err(TransferError::UnsupportedScheme(other.to_string())),
            };
            debug!(%source, total = ?opened.total, "source opened");
            Ok(opened)
        }
        .boxed()
    }
}
