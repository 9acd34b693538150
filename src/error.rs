use std::io;
use std::path::PathBuf;

/// Everything that can abort a fetch.
///
/// Only [`crate::install::clear_stale_artifacts`] recovers locally (a failed
/// delete is logged and skipped); every variant here ends the invocation.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The server answered outside the 2xx range.
    #[error("request to {url} failed with HTTP {status}:\n{body}")]
    Upstream {
        url: String,
        status: u16,
        body: String,
    },

    /// The release payload was not the JSON shape we expect.
    #[error("malformed release response from {url}: {reason}")]
    MalformedResponse { url: String, reason: String },

    #[error("{0}")]
    NotFound(String),

    /// Connection, TLS or body read failure.
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("unable to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid repository '{0}', expected <owner>/<name>")]
    InvalidRepository(String),

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid artifact pattern: {0}")]
    InvalidPattern(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("downloaded artifact {} is not a valid archive: {reason}", .path.display())]
    CorruptArtifact { path: PathBuf, reason: String },
}

impl FetchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        FetchError::Io {
            path: path.into(),
            source,
        }
    }

    /// HTTP status carried by an [`FetchError::Upstream`] error.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Transient failures worth another attempt: transport errors,
    /// rate limiting and server-side errors.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport { .. } => true,
            FetchError::Upstream { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
