//! Error taxonomy and the uniform operation envelope.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while reading or writing a variable.
///
/// Callers never branch on the variant; all three surface as a
/// human-readable message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SyncError {
    /// Local validation failed; no request was sent.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The request could not complete.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The remote service rejected the request.
    #[error("Service error: {0}")]
    Service(String),
}

/// Uniform result envelope for every read and write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationResult<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> OperationResult<T> {
    pub fn ok(value: T) -> Self {
        Self {
            success: true,
            value: Some(value),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            value: None,
            error: Some(error.into()),
        }
    }

    /// Convert back into a `Result`, keeping only the message on failure.
    pub fn into_result(self) -> Result<T, String> {
        match (self.success, self.value) {
            (true, Some(value)) => Ok(value),
            (_, _) => Err(self
                .error
                .unwrap_or_else(|| "operation failed".to_string())),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl<T> From<Result<T, SyncError>> for OperationResult<T> {
    fn from(result: Result<T, SyncError>) -> Self {
        match result {
            Ok(value) => OperationResult::ok(value),
            Err(e) => OperationResult::failed(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_result() {
        let ok: OperationResult<i16> = Ok(5).into();
        assert!(ok.success);
        assert_eq!(ok.value, Some(5));

        let err: OperationResult<i16> =
            Err(SyncError::Service("Falha ao conectar ao CLP".to_string())).into();
        assert!(!err.success);
        assert_eq!(
            err.error_message(),
            Some("Service error: Falha ao conectar ao CLP")
        );
    }

    #[test]
    fn test_unit_result_round_trips() {
        let ok: OperationResult<()> = OperationResult::ok(());
        assert_eq!(ok.into_result(), Ok(()));

        let failed: OperationResult<()> = OperationResult::failed("nope");
        assert_eq!(failed.into_result(), Err("nope".to_string()));
    }

    #[test]
    fn test_serialized_shape() {
        let failed: OperationResult<bool> = OperationResult::failed("timeout");
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json, serde_json::json!({"success": false, "error": "timeout"}));
    }
}
