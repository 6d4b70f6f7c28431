//! Unary operator evaluation

use crate::interpreter::engine::Machine;
use crate::interpreter::errors::Result;

impl Machine {
    /// Replace the top value with `1` if it is non-negative, `-1` otherwise
    pub fn sign(&mut self) -> Result<()> {
        let x = self.pop()?;
        self.push(if x >= 0.0 { 1.0 } else { -1.0 })
    }
}
