use http::StatusCode;
use redis_session::{SessionError, StorageError};

/// Helper trait for converting errors to a standard response error format
pub(crate) trait IntoResponseError<T> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)>;
}

impl<T> IntoResponseError<T> for Result<T, SessionError> {
    fn into_response_error(self) -> Result<T, (StatusCode, String)> {
        self.map_err(|e| {
            tracing::error!("Session error: {}", e);
            let status = match e {
                SessionError::NoConnection
                | SessionError::Storage(StorageError::Connection(_)) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                // Stored data that no longer decodes is a server-side fault too
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            (status, e.to_string())
        })
    }
}
