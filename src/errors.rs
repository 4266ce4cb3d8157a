use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;

/// Failure of a single round trip against the hosted lead table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordStoreError {
    /// Network failure, non-success status or an unreadable body.
    Transport(String),
    /// The store answered but refused the write.
    Rejected(String),
}

impl fmt::Display for RecordStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordStoreError::Transport(msg) => write!(f, "Record store transport error: {}", msg),
            RecordStoreError::Rejected(msg) => write!(f, "Record store rejected request: {}", msg),
        }
    }
}

impl std::error::Error for RecordStoreError {}

impl From<reqwest::Error> for RecordStoreError {
    fn from(err: reqwest::Error) -> Self {
        RecordStoreError::Transport(err.to_string())
    }
}

/// Application-specific error types.
#[derive(Debug, Clone)]
pub enum AppError {
    /// Resource not found error (unknown session, unknown lead).
    NotFound(String),
    /// Bad request error (invalid input).
    BadRequest(String),
    /// Error interacting with the hosted record store.
    ExternalApiError(String),
    /// Internal server error.
    InternalError(String),
    /// Another operation of the same session is still in flight.
    Busy(String),
    /// Error with context chain for better debugging.
    WithContext {
        /// The underlying source of the error.
        source: Box<AppError>,
        /// Additional context message.
        context: String,
    },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::ExternalApiError(msg) => write!(f, "External API error: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            AppError::Busy(msg) => write!(f, "Busy: {}", msg),
            AppError::WithContext { source, context } => {
                write!(f, "{}: {}", context, source)
            }
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    /// Maps each error variant to an HTTP status code and JSON body.
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::ExternalApiError(msg) => {
                tracing::error!("External API error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "External service error".to_string(),
                )
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::Busy(msg) => {
                tracing::debug!("Rejected re-entrant request: {}", msg);
                (StatusCode::CONFLICT, msg.clone())
            }
            AppError::WithContext { source, context } => {
                tracing::error!("Error with context: {} -> {}", context, source);
                return (**source).clone().into_response();
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<RecordStoreError> for AppError {
    fn from(err: RecordStoreError) -> Self {
        AppError::ExternalApiError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InternalError(format!("JSON error: {}", err))
    }
}

/// Extension trait for adding context to errors.
/// Similar to `anyhow::Context` but for our `AppError` type.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T, AppError>;

    /// Add context lazily (only evaluated on error).
    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: Into<AppError>,
{
    fn context(self, context: impl Into<String>) -> Result<T, AppError> {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e.into()),
            context: context.into(),
        })
    }

    fn with_context<F>(self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| AppError::WithContext {
            source: Box::new(e.into()),
            context: f(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_wraps_source() {
        let result: Result<(), RecordStoreError> =
            Err(RecordStoreError::Transport("connection refused".to_string()));
        let err = result.context("Creating lead").unwrap_err();

        assert_eq!(
            err.to_string(),
            "Creating lead: External API error: Record store transport error: connection refused"
        );
    }

    #[test]
    fn test_busy_maps_to_conflict() {
        let response = AppError::Busy("submit in progress".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_context_delegates_status() {
        let err = AppError::WithContext {
            source: Box::new(AppError::NotFound("session".to_string())),
            context: "Loading session".to_string(),
        };
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }
}
