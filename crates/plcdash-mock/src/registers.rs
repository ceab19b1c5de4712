//! Simulated device memory.
//!
//! Coils hold BOOL variables. Holding registers hold INT (one big-endian
//! signed word) and REAL (IEEE-754 single precision over two words, high
//! word first). Indices are zero-based.

use plcdash_core::{Value, VariableKind};

use crate::error::{MockError, MockResult};

pub const DEFAULT_COILS: usize = 100;
pub const DEFAULT_HOLDING_REGISTERS: usize = 100;

#[derive(Debug, Clone)]
pub struct RegisterBank {
    coils: Vec<bool>,
    holding: Vec<u16>,
}

impl Default for RegisterBank {
    fn default() -> Self {
        Self::new(DEFAULT_COILS, DEFAULT_HOLDING_REGISTERS)
    }
}

impl RegisterBank {
    pub fn new(coils: usize, holding_registers: usize) -> Self {
        Self {
            coils: vec![false; coils],
            holding: vec![0; holding_registers],
        }
    }

    pub fn read_bool(&self, index: usize) -> MockResult<bool> {
        self.coils
            .get(index)
            .copied()
            .ok_or(MockError::OutOfRange { kind: "coil", index })
    }

    pub fn write_bool(&mut self, index: usize, value: bool) -> MockResult<()> {
        let coil = self
            .coils
            .get_mut(index)
            .ok_or(MockError::OutOfRange { kind: "coil", index })?;
        *coil = value;
        Ok(())
    }

    pub fn read_int(&self, index: usize) -> MockResult<i16> {
        let [word] = self.words::<1>(index)?;
        Ok(word as i16)
    }

    pub fn write_int(&mut self, index: usize, value: i16) -> MockResult<()> {
        self.set_words(index, [value as u16])
    }

    pub fn read_real(&self, index: usize) -> MockResult<f32> {
        let [high, low] = self.words::<2>(index)?;
        Ok(f32::from_bits(((high as u32) << 16) | low as u32))
    }

    pub fn write_real(&mut self, index: usize, value: f32) -> MockResult<()> {
        let bits = value.to_bits();
        self.set_words(index, [(bits >> 16) as u16, bits as u16])
    }

    /// Read a typed value.
    pub fn read(&self, kind: VariableKind, index: usize) -> MockResult<Value> {
        Ok(match kind {
            VariableKind::Bool => Value::Bool(self.read_bool(index)?),
            VariableKind::Int => Value::Int(self.read_int(index)?),
            VariableKind::Real => Value::Real(self.read_real(index)? as f64),
        })
    }

    /// Write a typed value; the value must match `kind`.
    pub fn write(&mut self, kind: VariableKind, index: usize, value: Value) -> MockResult<()> {
        match (kind, value) {
            (VariableKind::Bool, Value::Bool(b)) => self.write_bool(index, b),
            (VariableKind::Int, Value::Int(i)) => self.write_int(index, i),
            (VariableKind::Real, Value::Real(r)) => {
                let single = r as f32;
                if !single.is_finite() {
                    return Err(MockError::InvalidValue(format!(
                        "{} does not fit a 32-bit REAL",
                        r
                    )));
                }
                self.write_real(index, single)
            }
            (kind, value) => Err(MockError::InvalidValue(format!(
                "{} is not a {} value",
                value, kind
            ))),
        }
    }

    fn words<const N: usize>(&self, index: usize) -> MockResult<[u16; N]> {
        let slice = index
            .checked_add(N)
            .and_then(|end| self.holding.get(index..end))
            .ok_or(MockError::OutOfRange {
                kind: "holding register",
                index,
            })?;
        let mut words = [0u16; N];
        words.copy_from_slice(slice);
        Ok(words)
    }

    fn set_words<const N: usize>(&mut self, index: usize, words: [u16; N]) -> MockResult<()> {
        let slice = index
            .checked_add(N)
            .and_then(|end| self.holding.get_mut(index..end))
            .ok_or(MockError::OutOfRange {
                kind: "holding register",
                index,
            })?;
        slice.copy_from_slice(&words);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_is_big_endian_signed() {
        let mut bank = RegisterBank::default();
        bank.write_int(0, -2).unwrap();
        assert_eq!(bank.holding[0], 0xFFFE);
        assert_eq!(bank.read_int(0).unwrap(), -2);
    }

    #[test]
    fn test_real_high_word_first() {
        let mut bank = RegisterBank::default();
        bank.write_real(1, 1.0).unwrap();
        // 1.0f32 = 0x3F80_0000
        assert_eq!(&bank.holding[1..3], &[0x3F80, 0x0000]);
        assert_eq!(bank.read_real(1).unwrap(), 1.0);
    }

    #[test]
    fn test_real_overlaps_following_register() {
        let mut bank = RegisterBank::default();
        bank.write_int(0, 7).unwrap();
        bank.write_real(1, 75.5).unwrap();
        assert_eq!(bank.read_int(0).unwrap(), 7);
        assert_eq!(bank.read(VariableKind::Real, 1).unwrap(), Value::Real(75.5));
    }

    #[test]
    fn test_out_of_range() {
        let mut bank = RegisterBank::default();
        assert!(bank.read_bool(100).is_err());
        assert!(bank.read_int(99).is_ok());
        // a REAL at the last register would need one more word
        assert!(bank.read_real(99).is_err());
        assert!(bank.write_real(usize::MAX, 1.0).is_err());
    }

    #[test]
    fn test_real_outside_single_precision_is_rejected() {
        let mut bank = RegisterBank::default();
        bank.write_real(1, 12.5).unwrap();
        assert!(matches!(
            bank.write(VariableKind::Real, 1, Value::Real(1e300)),
            Err(MockError::InvalidValue(_))
        ));
        assert_eq!(bank.read_real(1).unwrap(), 12.5);
        assert!(bank.write(VariableKind::Real, 1, Value::Real(-3.0e38)).is_ok());
    }

    #[test]
    fn test_kind_mismatch() {
        let mut bank = RegisterBank::default();
        assert!(matches!(
            bank.write(VariableKind::Int, 0, Value::Bool(true)),
            Err(MockError::InvalidValue(_))
        ));
    }
}
