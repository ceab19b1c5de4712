//! Client-side validation of raw write input.

use crate::error::SyncError;
use crate::model::{Value, VariableKind};

/// Parse operator input for a write to a variable of `kind`.
///
/// - Bool accepts `0`/`1` (and `true`/`false`/`on`/`off`)
/// - Int must be an integer in `-32768..=32767`
/// - Real must be a finite float that fits in 32 bits
pub fn parse_input(kind: VariableKind, raw: &str) -> Result<Value, SyncError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(SyncError::InvalidInput("value is empty".to_string()));
    }

    match kind {
        VariableKind::Bool => match raw.to_ascii_lowercase().as_str() {
            "1" | "true" | "on" => Ok(Value::Bool(true)),
            "0" | "false" | "off" => Ok(Value::Bool(false)),
            _ => Err(SyncError::InvalidInput(format!(
                "BOOL value must be 0 or 1, got '{}'",
                raw
            ))),
        },
        VariableKind::Int => {
            let parsed: i64 = raw.parse().map_err(|_| {
                SyncError::InvalidInput(format!("INT value '{}' is not an integer", raw))
            })?;
            i16::try_from(parsed).map(Value::Int).map_err(|_| {
                SyncError::InvalidInput(format!(
                    "INT value {} out of range ({}..={})",
                    parsed,
                    i16::MIN,
                    i16::MAX
                ))
            })
        }
        VariableKind::Real => {
            let parsed: f64 = raw.parse().map_err(|_| {
                SyncError::InvalidInput(format!("REAL value '{}' is not a number", raw))
            })?;
            if !parsed.is_finite() {
                return Err(SyncError::InvalidInput(format!(
                    "REAL value '{}' is not finite",
                    raw
                )));
            }
            // stored as a 32-bit float on the device
            if !(parsed as f32).is_finite() {
                return Err(SyncError::InvalidInput(format!(
                    "REAL value {} out of range (±{:e})",
                    parsed,
                    f32::MAX
                )));
            }
            Ok(Value::Real(parsed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_input() {
        assert_eq!(parse_input(VariableKind::Bool, "1"), Ok(Value::Bool(true)));
        assert_eq!(parse_input(VariableKind::Bool, " 0 "), Ok(Value::Bool(false)));
        assert_eq!(parse_input(VariableKind::Bool, "ON"), Ok(Value::Bool(true)));
        assert!(parse_input(VariableKind::Bool, "2").is_err());
        assert!(parse_input(VariableKind::Bool, "yes").is_err());
    }

    #[test]
    fn test_int_range() {
        assert_eq!(parse_input(VariableKind::Int, "100"), Ok(Value::Int(100)));
        assert_eq!(parse_input(VariableKind::Int, "-32768"), Ok(Value::Int(i16::MIN)));
        assert_eq!(parse_input(VariableKind::Int, "32767"), Ok(Value::Int(i16::MAX)));

        match parse_input(VariableKind::Int, "40000") {
            Err(SyncError::InvalidInput(msg)) => assert!(msg.contains("out of range")),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
        assert!(parse_input(VariableKind::Int, "-32769").is_err());
        assert!(parse_input(VariableKind::Int, "1.5").is_err());
    }

    #[test]
    fn test_real_must_be_finite() {
        assert_eq!(parse_input(VariableKind::Real, "75.5"), Ok(Value::Real(75.5)));
        assert_eq!(parse_input(VariableKind::Real, "-3"), Ok(Value::Real(-3.0)));
        assert!(parse_input(VariableKind::Real, "NaN").is_err());
        assert!(parse_input(VariableKind::Real, "inf").is_err());
        assert!(parse_input(VariableKind::Real, "abc").is_err());
    }

    #[test]
    fn test_real_must_fit_single_precision() {
        assert_eq!(
            parse_input(VariableKind::Real, "3.0e38"),
            Ok(Value::Real(3.0e38))
        );
        match parse_input(VariableKind::Real, "1e300") {
            Err(SyncError::InvalidInput(msg)) => assert!(msg.contains("out of range")),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
        assert!(parse_input(VariableKind::Real, "-1e39").is_err());
    }

    #[test]
    fn test_empty_input() {
        for kind in VariableKind::ALL {
            assert!(matches!(
                parse_input(kind, "  "),
                Err(SyncError::InvalidInput(_))
            ));
        }
    }
}
