use std::time::Duration;

use thiserror::Error;

use demandiq_ingest::IngestError;

/// Failure reported by (or on behalf of) the forecasting service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The uploaded file is malformed or violates the record schema.
    #[error("invalid file: {0}")]
    InvalidFile(#[from] IngestError),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// No response within the configured deadline.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// The service understood the request but refused it.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The service answered with data the workflow cannot accept.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ServiceError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}
