use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    #[error("page not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("{url} returned too little HTML ({len} bytes)")]
    InsufficientHtml { url: String, len: usize },

    #[error("rendering proxy is not configured (missing API key)")]
    ProxyNotConfigured,

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl FetchError {
    /// Transient failures worth retrying: 429, transport errors and 5xx.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        match self {
            FetchError::RateLimited { .. } | FetchError::Http(_) => true,
            FetchError::UnexpectedStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
