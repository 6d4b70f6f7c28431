//! Operand stack implementation
//!
//! [`OperandStack`] is a fixed-capacity array of [`Value`] slots plus a stack
//! pointer marking the first free slot. It is the only place the stack is
//! mutated; every access is bounds checked against the live region
//! `0..stack_pointer` and fails before touching any state.
//!
//! Popping zeroes the vacated slot so a later raw read of dead slots (the
//! inspector shows them) never sees stale data.

use super::value::Value;
use crate::interpreter::errors::{AddressSpace, MachineError, Result};

/// The operand stack
#[derive(Debug, Clone)]
pub struct OperandStack {
    slots: Box<[Value]>,
    pointer: usize,
}

impl OperandStack {
    /// Create a zero-filled stack with a fixed capacity
    pub fn new(capacity: usize) -> Self {
        OperandStack {
            slots: vec![0.0; capacity].into_boxed_slice(),
            pointer: 0,
        }
    }

    /// Push a value, failing with `StackOverflow` when full
    pub fn push(&mut self, value: Value) -> Result<()> {
        if self.pointer >= self.slots.len() {
            return Err(MachineError::StackOverflow {
                capacity: self.slots.len(),
            });
        }
        self.slots[self.pointer] = value;
        self.pointer += 1;
        Ok(())
    }

    /// Pop the top value, failing with `StackUnderflow` when empty
    pub fn pop(&mut self) -> Result<Value> {
        if self.pointer == 0 {
            return Err(MachineError::StackUnderflow {
                operation: "pop",
                required: 1,
                available: 0,
            });
        }
        self.pointer -= 1;
        let value = self.slots[self.pointer];
        self.slots[self.pointer] = 0.0;
        Ok(value)
    }

    /// Read a live slot
    pub fn peek_at(&self, index: usize) -> Result<Value> {
        self.check_live(index)?;
        Ok(self.slots[index])
    }

    /// Overwrite a live slot without moving the stack pointer
    pub fn poke_at(&mut self, index: usize, value: Value) -> Result<()> {
        self.check_live(index)?;
        self.slots[index] = value;
        Ok(())
    }

    /// Fail with `StackUnderflow` unless at least `required` values are live
    pub fn require(&self, operation: &'static str, required: usize) -> Result<()> {
        if self.pointer < required {
            return Err(MachineError::StackUnderflow {
                operation,
                required,
                available: self.pointer,
            });
        }
        Ok(())
    }

    fn check_live(&self, index: usize) -> Result<()> {
        if index >= self.pointer {
            return Err(MachineError::InvalidAddress {
                space: AddressSpace::Stack,
                index,
                limit: self.pointer,
            });
        }
        Ok(())
    }

    /// Number of live values (the stack pointer)
    pub fn pointer(&self) -> usize {
        self.pointer
    }

    /// Fixed capacity in slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Check if no values are live
    pub fn is_empty(&self) -> bool {
        self.pointer == 0
    }

    /// Live values, bottom first (for UI display)
    pub fn live(&self) -> &[Value] {
        &self.slots[..self.pointer]
    }

    /// Top value without popping
    pub fn top(&self) -> Option<Value> {
        self.live().last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_lifo() {
        let mut stack = OperandStack::new(4);
        stack.push(1.0).unwrap();
        stack.push(2.0).unwrap();
        stack.push(3.0).unwrap();

        assert_eq!(stack.pop().unwrap(), 3.0);
        assert_eq!(stack.pop().unwrap(), 2.0);
        assert_eq!(stack.pop().unwrap(), 1.0);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_overflow_leaves_state_untouched() {
        let mut stack = OperandStack::new(2);
        stack.push(1.0).unwrap();
        stack.push(2.0).unwrap();

        let err = stack.push(3.0).unwrap_err();
        assert_eq!(err, MachineError::StackOverflow { capacity: 2 });
        assert_eq!(stack.live(), &[1.0, 2.0]);
    }

    #[test]
    fn test_underflow() {
        let mut stack = OperandStack::new(2);
        assert!(matches!(
            stack.pop(),
            Err(MachineError::StackUnderflow { .. })
        ));
        assert_eq!(stack.pointer(), 0);
    }

    #[test]
    fn test_pop_zeroes_vacated_slot() {
        let mut stack = OperandStack::new(2);
        stack.push(7.0).unwrap();
        stack.pop().unwrap();
        assert_eq!(stack.slots[0], 0.0);
    }

    #[test]
    fn test_peek_and_poke_are_bounded_by_live_region() {
        let mut stack = OperandStack::new(4);
        stack.push(5.0).unwrap();

        assert_eq!(stack.peek_at(0).unwrap(), 5.0);
        stack.poke_at(0, 6.0).unwrap();
        assert_eq!(stack.peek_at(0).unwrap(), 6.0);

        assert!(matches!(
            stack.peek_at(1),
            Err(MachineError::InvalidAddress {
                space: AddressSpace::Stack,
                index: 1,
                limit: 1
            })
        ));
        assert!(stack.poke_at(3, 1.0).is_err());
    }
}
