use std::io;
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;

use crate::{DownloadError, DownloadFailureKind};

/// Body of a successful download, yielded chunk by chunk.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// Timeouts and redirect policy shared by every HTTP client of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
        }
    }
}

impl DownloadSettings {
    pub(crate) fn build_client(&self) -> Result<reqwest::Client, reqwest::Error> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(self.redirect_limit))
            .build()
    }
}

/// Fetches the raw bytes behind an image URL.
#[async_trait::async_trait]
pub trait Downloader: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ByteStream, DownloadError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestDownloader {
    client: reqwest::Client,
}

impl ReqwestDownloader {
    pub fn new(settings: &DownloadSettings) -> Result<Self, DownloadError> {
        let client = settings
            .build_client()
            .map_err(|err| DownloadError::new(DownloadFailureKind::Network, err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Downloader for ReqwestDownloader {
    async fn fetch(&self, url: &str) -> Result<ByteStream, DownloadError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| DownloadError::new(DownloadFailureKind::InvalidUrl, err.to_string()))?;

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::new(
                DownloadFailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        Ok(response.bytes_stream().map(|chunk| chunk.map_err(into_io_error)).boxed())
    }
}

fn map_reqwest_error(err: reqwest::Error) -> DownloadError {
    if err.is_timeout() {
        return DownloadError::new(DownloadFailureKind::Timeout, err.to_string());
    }
    DownloadError::new(DownloadFailureKind::Network, err.to_string())
}

fn into_io_error(err: reqwest::Error) -> io::Error {
    if err.is_timeout() {
        io::Error::new(io::ErrorKind::TimedOut, err)
    } else {
        io::Error::other(err)
    }
}
