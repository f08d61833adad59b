use thiserror::Error;

pub type Result<T> = std::result::Result<T, PersonalizationError>;

#[derive(Debug, Error)]
pub enum PersonalizationError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Timeout: {0}")]
    Timeout(String),
}

impl From<redis::RedisError> for PersonalizationError {
    fn from(err: redis::RedisError) -> Self {
        PersonalizationError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for PersonalizationError {
    fn from(err: serde_json::Error) -> Self {
        PersonalizationError::Serialization(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for PersonalizationError {
    fn from(err: tokio::time::error::Elapsed) -> Self {
        PersonalizationError::Timeout(err.to_string())
    }
}
