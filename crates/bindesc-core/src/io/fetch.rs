//! Byte sources for artifact downloads.
//!
//! The download pipeline only needs "open this URL as a stream of chunks";
//! [`Fetcher`] is that seam, with [`HttpFetcher`] as the real implementation.

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::Client;

use super::download::DownloadError;

/// A stream of body chunks.
pub type ByteStream = BoxStream<'static, Result<Bytes, DownloadError>>;

/// An opened response: its announced size (if any) and the body stream.
pub struct FetchResponse {
    pub content_length: Option<u64>,
    pub body: ByteStream,
}

impl std::fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchResponse")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Open `url` for reading. Non-success statuses are errors.
    async fn open(&self, url: &str) -> Result<FetchResponse, DownloadError>;
}

/// HTTP(S) fetcher backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, DownloadError> {
        let client = Client::builder().user_agent(crate::USER_AGENT).build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Fetcher for HttpFetcher {
    async fn open(&self, url: &str) -> Result<FetchResponse, DownloadError> {
        tracing::debug!(url, "GET");
        let response = self.client.get(url).send().await?.error_for_status()?;
        let content_length = response.content_length();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(DownloadError::from))
            .boxed();
        Ok(FetchResponse {
            content_length,
            body,
        })
    }
}
