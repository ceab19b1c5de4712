//! Address mapping between protocol-facing numbers and wire indices.
//!
//! Coils are numbered from 1 and holding registers from 40001 on the
//! operator side, while the remote service indexes both from zero.

use crate::error::SyncError;
use crate::model::VariableKind;

/// First coil number.
pub const COIL_BASE: u32 = 1;

/// First holding-register number.
pub const HOLDING_REGISTER_BASE: u32 = 40001;

/// Highest zero-based index the service accepts.
pub const MAX_INDEX: u32 = u16::MAX as u32;

/// Convert a protocol-facing address to the service's zero-based index.
///
/// No bounds checking is done here; see [`validate_address`].
pub fn to_index(kind: VariableKind, address: u32) -> i64 {
    i64::from(address) - i64::from(base(kind))
}

/// Convert a zero-based index back to a protocol-facing address.
pub fn to_address(kind: VariableKind, index: u32) -> u32 {
    index.saturating_add(base(kind))
}

/// Check that `address` is valid for `kind` and return its wire index.
///
/// A REAL occupies two consecutive registers, so the last register cannot
/// hold one.
pub fn validate_address(kind: VariableKind, address: u32) -> Result<u16, SyncError> {
    let index = to_index(kind, address);
    let max = match kind {
        VariableKind::Real => MAX_INDEX - 1,
        _ => MAX_INDEX,
    };

    if index < 0 || index > i64::from(max) {
        return Err(SyncError::InvalidInput(format!(
            "address {} out of range for {} (valid {}..={})",
            address,
            kind.as_str().to_uppercase(),
            base(kind),
            base(kind) + max
        )));
    }

    Ok(index as u16)
}

fn base(kind: VariableKind) -> u32 {
    match kind {
        VariableKind::Bool => COIL_BASE,
        VariableKind::Int | VariableKind::Real => HOLDING_REGISTER_BASE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_index() {
        assert_eq!(to_index(VariableKind::Bool, 1), 0);
        assert_eq!(to_index(VariableKind::Int, 40003), 2);
        assert_eq!(to_index(VariableKind::Real, 40010), 9);
    }

    #[test]
    fn test_to_index_does_not_validate() {
        assert_eq!(to_index(VariableKind::Bool, 0), -1);
        assert_eq!(to_index(VariableKind::Int, 1), -40000);
    }

    #[test]
    fn test_to_address_inverts_to_index() {
        for kind in VariableKind::ALL {
            assert_eq!(to_index(kind, to_address(kind, 7)), 7);
        }
        assert_eq!(to_address(VariableKind::Bool, 0), 1);
        assert_eq!(to_address(VariableKind::Real, 1), 40002);
    }

    #[test]
    fn test_validate_address() {
        assert_eq!(validate_address(VariableKind::Bool, 1).unwrap(), 0);
        assert_eq!(validate_address(VariableKind::Int, 40001).unwrap(), 0);
        assert!(validate_address(VariableKind::Bool, 0).is_err());
        assert!(validate_address(VariableKind::Int, 40000).is_err());
        assert!(validate_address(VariableKind::Int, 40001 + MAX_INDEX).is_ok());
        assert!(validate_address(VariableKind::Real, 40001 + MAX_INDEX).is_err());
    }

    #[test]
    fn test_validate_error_is_invalid_input() {
        match validate_address(VariableKind::Bool, 0) {
            Err(SyncError::InvalidInput(msg)) => assert!(msg.contains("BOOL")),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }
}
