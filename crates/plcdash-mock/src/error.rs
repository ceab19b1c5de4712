//! Mock service errors.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use plcdash_protocol::ErrorReply;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MockError {
    #[error("Invalid type: {0}")]
    InvalidKind(String),

    #[error("{kind} index {index} is out of range")]
    OutOfRange { kind: &'static str, index: usize },

    #[error("Value not provided")]
    MissingValue,

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("{0}")]
    NotFound(String),

    /// The simulated device link is down.
    #[error("Failed to connect to the PLC")]
    Disconnected,
}

impl MockError {
    pub fn status(&self) -> StatusCode {
        match self {
            MockError::InvalidKind(_)
            | MockError::OutOfRange { .. }
            | MockError::MissingValue
            | MockError::InvalidValue(_) => StatusCode::BAD_REQUEST,
            MockError::NotFound(_) => StatusCode::NOT_FOUND,
            MockError::Disconnected => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for MockError {
    fn into_response(self) -> Response {
        tracing::warn!("request failed: {}", self);
        (self.status(), Json(ErrorReply::new(self.to_string()))).into_response()
    }
}

pub type MockResult<T> = Result<T, MockError>;
