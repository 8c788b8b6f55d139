use thiserror::Error;

use crate::storage::StorageError;
use crate::utils::UtilError;

#[derive(Debug, Error, Clone)]
pub enum SessionError {
    /// The handler was initialized without a pool, or `initialize` was never called
    #[error("No session store connection")]
    NoConnection,

    /// A store-scoped operation ran before the session id was loaded or created
    #[error("Session id has not been resolved for this request")]
    Unresolved,

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Json conversion(Serde) error: {0}")]
    Serde(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Error from utils operations
    #[error("Utils error: {0}")]
    Utils(#[from] UtilError),
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}
