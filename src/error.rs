use thiserror::Error;

#[derive(Error, Debug)]
pub enum QrisError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Invalid static payload: {0}")]
    InvalidPayload(String),
    #[error("Request body too large: {size} bytes (limit {limit})")]
    BodyTooLarge { size: usize, limit: usize },
    #[error("Source address {0} is not allowed")]
    Forbidden(String),
    #[error("Event store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl QrisError {
    /// True for errors the caller can fix by changing its input.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            QrisError::ValidationError(_)
                | QrisError::InvalidPayload(_)
                | QrisError::BodyTooLarge { .. }
                | QrisError::Forbidden(_)
        )
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for QrisError {
    fn from(err: rocksdb::Error) -> Self {
        QrisError::StoreUnavailable(err.to_string())
    }
}

#[cfg(feature = "storage-redis")]
impl From<redis::RedisError> for QrisError {
    fn from(err: redis::RedisError) -> Self {
        QrisError::StoreUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, QrisError>;
