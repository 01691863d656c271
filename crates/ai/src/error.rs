use thiserror::Error;

/// Failure of a prediction request.
///
/// Every variant is terminal: callers surface the message as-is and do not
/// retry.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Configuration(String),

    #[error("prediction request failed: {0}")]
    Request(String),

    #[error("invalid prediction response: {0}")]
    InvalidResponse(String),
}

impl AiError {
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}
