use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// HTTP 429 or 403. Storefront bot protection answers with either.
    #[error("rate limited by {url} (HTTP {status})")]
    RateLimited {
        status: u16,
        url: String,
        retry_after_secs: Option<u64>,
    },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("gave up after {attempts} attempt(s): {source}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        source: Box<ScraperError>,
    },
}

impl ScraperError {
    /// The innermost error, looking through [`ScraperError::RetryExhausted`].
    #[must_use]
    pub fn root_cause(&self) -> &ScraperError {
        match self {
            ScraperError::RetryExhausted { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
