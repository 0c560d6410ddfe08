use reqwest::StatusCode;

/// Failures that stop a like request before a response can be classified.
#[derive(Debug, thiserror::Error)]
pub enum LikeError {
    #[error("like service request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("like service unavailable (HTTP {0})")]
    ServiceUnavailable(StatusCode),
    #[error("like service returned an unreadable body: {0}")]
    InvalidBody(#[source] reqwest::Error),
}
