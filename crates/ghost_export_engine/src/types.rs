use std::fmt;
use std::io;

/// Why an image could not be downloaded and stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadFailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    Network,
    Io,
    UnsafeDestination,
}

impl fmt::Display for DownloadFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadFailureKind::InvalidUrl => write!(f, "invalid url"),
            DownloadFailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            DownloadFailureKind::Timeout => write!(f, "timeout"),
            DownloadFailureKind::Network => write!(f, "network error"),
            DownloadFailureKind::Io => write!(f, "io error"),
            DownloadFailureKind::UnsafeDestination => write!(f, "unsafe destination"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct DownloadError {
    pub kind: DownloadFailureKind,
    pub message: String,
}

impl DownloadError {
    pub(crate) fn new(kind: DownloadFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<io::Error> for DownloadError {
    fn from(err: io::Error) -> Self {
        let kind = match err.kind() {
            io::ErrorKind::TimedOut => DownloadFailureKind::Timeout,
            _ => DownloadFailureKind::Io,
        };
        Self::new(kind, err.to_string())
    }
}
