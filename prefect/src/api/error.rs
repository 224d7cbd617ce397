use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("status code={status}, error={body}")]
    UnexpectedStatus { status: StatusCode, body: String },

    #[error("failed to decode response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode data: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("invalid API key: {0}")]
    InvalidApiKey(String),

    #[error("{0}")]
    MissingScope(String),

    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}
