//! Runtime value representation
//!
//! The machine has exactly one value kind: a 32-bit float. Integers, character
//! codes, booleans, heap addresses and stack references are all carried as
//! [`Value`]s and converted at the point of use.
//!
//! # Slot Encoding
//!
//! On the heap every value occupies one 4-byte slot holding its IEEE-754
//! binary32 bit pattern in little-endian order. [`encode_slot`] and
//! [`decode_slot`] are exact inverses for every bit pattern, NaNs included.

use crate::interpreter::errors::MachineError;

/// The single numeric value type
pub type Value = f32;

/// Heap byte address
pub type Address = usize;

/// Size of one heap slot in bytes
pub const SLOT_BYTES: usize = 4;

/// Encode a value into its 4-byte heap form
#[inline]
pub fn encode_slot(value: Value) -> [u8; SLOT_BYTES] {
    value.to_le_bytes()
}

/// Decode a 4-byte heap slot back into a value
#[inline]
pub fn decode_slot(bytes: [u8; SLOT_BYTES]) -> Value {
    Value::from_le_bytes(bytes)
}

/// Interpret a value as a non-negative integral quantity (count, address, index).
///
/// `operation` names the consumer for the diagnostic.
pub fn expect_index(value: Value, operation: &'static str) -> Result<usize, MachineError> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as Value {
        Ok(value as usize)
    } else {
        Err(MachineError::InvalidOperand { operation, value })
    }
}

/// Convert a count or address back into a value
#[inline]
pub fn from_index(index: usize) -> Value {
    index as Value
}
