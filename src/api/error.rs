use thiserror::Error;

use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing title")]
    MissingTitle,

    #[error("Missing group")]
    MissingGroup,

    #[error("Missing id")]
    MissingId,

    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    #[error("Timer not found: {group}/{id}")]
    TimerNotFound { group: String, id: String },

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Malformed record: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::TimerNotFound { .. } | ApiError::GroupNotFound(_))
    }

    /// Whether the caller sent something unacceptable.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ApiError::MissingTitle
                | ApiError::MissingGroup
                | ApiError::MissingId
                | ApiError::InvalidName(_)
                | ApiError::InvalidBody(_)
                | ApiError::InvalidRequest(_)
        )
    }
}
