//! Reply decoding for the remote variable service.
//!
//! The service signals failure in two ways: an `error` field, or a
//! `success: false` flag. [`check_reply`] folds both into
//! [`CodecError::Rejected`] so callers handle them uniformly.

use plcdash_core::{SyncError, Value, VariableKind};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors that can occur while decoding a service reply.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The service explicitly rejected the request.
    #[error("{0}")]
    Rejected(String),

    /// The reply was JSON but not the expected shape.
    #[error("Unexpected reply: {0}")]
    Malformed(String),

    /// The reply body was not valid JSON.
    #[error("Failed to parse reply: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl From<CodecError> for SyncError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::Rejected(msg) => SyncError::Service(msg),
            CodecError::Malformed(_) => SyncError::Service(e.to_string()),
            CodecError::InvalidJson(_) => SyncError::Transport(e.to_string()),
        }
    }
}

/// Parse a raw reply body.
pub fn parse_body(body: &str) -> Result<serde_json::Value, CodecError> {
    serde_json::from_str(body).map_err(CodecError::from)
}

/// Fail if the reply carries either error convention.
pub fn check_reply(reply: &serde_json::Value) -> Result<(), CodecError> {
    match reply.get("error") {
        None | Some(serde_json::Value::Null) => {}
        Some(serde_json::Value::String(msg)) => return Err(CodecError::Rejected(msg.clone())),
        Some(other) => return Err(CodecError::Rejected(other.to_string())),
    }

    if reply.get("success").and_then(|s| s.as_bool()) == Some(false) {
        let msg = reply
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("request rejected by service");
        return Err(CodecError::Rejected(msg.to_string()));
    }

    Ok(())
}

/// Decode a typed reply after checking for errors.
pub fn decode<T: DeserializeOwned>(reply: serde_json::Value) -> Result<T, CodecError> {
    check_reply(&reply)?;
    serde_json::from_value(reply).map_err(|e| CodecError::Malformed(e.to_string()))
}

/// Decode a write acknowledgement.
pub fn decode_ack(reply: &serde_json::Value) -> Result<(), CodecError> {
    check_reply(reply)?;
    if !reply.is_object() {
        return Err(CodecError::Malformed(format!("expected object, got {}", reply)));
    }
    Ok(())
}

/// Decode the `value` field of a read reply as `kind`.
pub fn decode_read(kind: VariableKind, reply: &serde_json::Value) -> Result<Value, CodecError> {
    check_reply(reply)?;
    let raw = reply
        .get("value")
        .ok_or_else(|| CodecError::Malformed("missing 'value' field".to_string()))?;
    decode_value(kind, raw)
}

/// Decode a single JSON value as `kind`.
///
/// BOOL accepts `true`/`false` and `0`/`1`; INT must fit in 16 signed bits;
/// REAL must be a finite number.
pub fn decode_value(kind: VariableKind, raw: &serde_json::Value) -> Result<Value, CodecError> {
    let malformed = || CodecError::Malformed(format!("{} is not a valid {} value", raw, kind));

    match kind {
        VariableKind::Bool => match raw {
            serde_json::Value::Bool(b) => Ok(Value::Bool(*b)),
            serde_json::Value::Number(n) => match n.as_u64() {
                Some(0) => Ok(Value::Bool(false)),
                Some(1) => Ok(Value::Bool(true)),
                _ => Err(malformed()),
            },
            _ => Err(malformed()),
        },
        VariableKind::Int => raw
            .as_i64()
            .and_then(|i| i16::try_from(i).ok())
            .map(Value::Int)
            .ok_or_else(malformed),
        VariableKind::Real => raw
            .as_f64()
            .filter(|f| f.is_finite())
            .map(Value::Real)
            .ok_or_else(malformed),
    }
}
