//! Memory model for the target machine
//!
//! This module provides the two address spaces and the value they hold:
//! - [`value`]: the single numeric [`value::Value`] type and its 4-byte slot encoding
//! - [`stack`]: fixed-capacity operand stack with a stack pointer
//! - [`heap`]: fixed-size byte arena with a first-fit allocator and allocation map
//!
//! # Units
//!
//! The stack is addressed in slots (one value each). The heap is addressed in
//! bytes, but sizes handed to `allocate`, `free`, `store` and `load` are slot
//! counts:
//! ```text
//! bytes = slots * SLOT_BYTES   (SLOT_BYTES = 4)
//! ```
//! [`slot_bytes`] performs this scaling with overflow checking.

pub mod heap;
pub mod stack;
pub mod value;

use crate::interpreter::errors::{MachineError, Result};
use value::{Value, SLOT_BYTES};

/// Convert a slot count into a byte size
pub fn slot_bytes(slots: usize, operation: &'static str) -> Result<usize> {
    slots
        .checked_mul(SLOT_BYTES)
        .ok_or(MachineError::InvalidOperand {
            operation,
            value: slots as Value,
        })
}
