use crate::library::RelativePath;
use thiserror::Error;

/// Failures talking to the media server. None of these are fatal to the host.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("network error: {message}")]
    Transport { message: String },
    #[error("server responded with HTTP {status}")]
    HttpStatus { status: u16 },
    #[error("malformed response: {message}")]
    MalformedResponse { message: String },
    #[error("invalid server url {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Something that can report scan progress and start a rescan.
#[async_trait::async_trait]
pub trait RescanTarget: Send + Sync {
    /// Whether the server reports a library scan in progress.
    async fn is_scanning(&self) -> ClientResult<bool>;

    /// Rescan the whole library (`None`) or one directory below the library root.
    async fn trigger_rescan(&self, path: Option<&RelativePath>) -> ClientResult<()>;
}
