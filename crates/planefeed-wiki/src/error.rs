use thiserror::Error;

#[derive(Debug, Error)]
pub enum WikiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request to {0} timed out after {1}s")]
    Timeout(String, u64),

    #[error("API error from {0}: {1}")]
    ApiError(String, String),

    #[error("rate limit from {0}, retry after {1}s")]
    RateLimit(String, u64),

    #[error("page not found: {0}")]
    PageNotFound(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("invalid URL {0}: {1}")]
    InvalidUrl(String, String),
}

pub type Result<T> = std::result::Result<T, WikiError>;
