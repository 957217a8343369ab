//! Error types for the service layer.
//!
//! [`ObserverError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use furrow_core::CoreError;
use furrow_world::WorldError;

/// Errors that can occur in the service layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The run is being mutated by another request.
    #[error("busy: {0}")]
    Busy(String),

    /// A serialization or deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An invalid path or query parameter was provided.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A request body failed validation.
    #[error("invalid payload: {0}")]
    Validation(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),

    /// A UUID could not be parsed from the request path.
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),
}

impl From<validator::ValidationErrors> for ObserverError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

impl From<CoreError> for ObserverError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::RunNotFound(_) | CoreError::EventNotFound(_) => {
                Self::NotFound(err.to_string())
            }
            CoreError::RunBusy(_) => Self::Busy(err.to_string()),
            CoreError::World {
                source: WorldError::UnknownRegion(code),
            } => Self::Validation(format!("unknown region: {code}")),
            CoreError::World { .. }
            | CoreError::InvalidSnapshot { .. }
            | CoreError::InvalidRequest { .. } => Self::Validation(err.to_string()),
            CoreError::Store { .. } => Self::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Busy(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::Serialization(e) => {
                (StatusCode::INTERNAL_SERVER_ERROR, format!("JSON error: {e}"))
            }
            Self::InvalidQuery(msg) | Self::InvalidUuid(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            Self::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg.clone()),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
