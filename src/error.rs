//! Session error types

/// Errors that can occur during session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// `set`, `set_map` or `refresh` was called before `fetch`
    #[error("Session not fetched")]
    NotFetched,
    /// The memory store was never built with a backing cache
    #[error("Session store not initialized")]
    NotInitialized,
    /// The memory store was asked for a zero capacity
    #[error("Invalid store capacity: must be greater than zero")]
    InvalidCapacity,
    /// A mock session was built from fields that cannot coexist
    #[error("Invalid session state: {0}")]
    InvalidState(String),
    /// Error from the session store
    #[error("Session store error: {0}")]
    StoreError(String),
    /// Error during serialization/deserialization
    #[error("Serialization error: {0}")]
    SerializationError(String),
    /// Redis error (when redis-store feature is enabled)
    #[cfg(feature = "redis-store")]
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::SerializationError(err.to_string())
    }
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
