use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum StorageError {
    /// The store could not be reached, or the connection broke mid-command
    #[error("Session store unavailable: {0}")]
    Connection(String),

    /// The store answered with an error, or refused the arguments
    #[error("Session store command failed: {0}")]
    Command(String),
}

impl From<redis::RedisError> for StorageError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error()
            || err.is_connection_refusal()
            || err.is_connection_dropped()
            || err.is_timeout()
        {
            Self::Connection(err.to_string())
        } else {
            Self::Command(err.to_string())
        }
    }
}
