//! Binary operator evaluation
//!
//! Every binary operator pops `b`, then `a`, and pushes `a op b`, so operands
//! are used in push order. Both operands are inspected before anything is
//! popped; a failing operator leaves them on the stack.

use crate::interpreter::engine::Machine;
use crate::interpreter::errors::{MachineError, Result};
use crate::memory::value::Value;

/// Binary operators over the two topmost values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinOp {
    fn name(self) -> &'static str {
        match self {
            BinOp::Add => "add",
            BinOp::Subtract => "subtract",
            BinOp::Multiply => "multiply",
            BinOp::Divide => "divide",
            BinOp::Modulo => "modulo",
        }
    }

    /// Apply the operator to `a` and `b`
    pub fn apply(self, a: Value, b: Value) -> Result<Value> {
        match self {
            BinOp::Add => Ok(a + b),
            BinOp::Subtract => Ok(a - b),
            BinOp::Multiply => Ok(a * b),
            BinOp::Divide => {
                if b == 0.0 {
                    return Err(MachineError::DivisionByZero {
                        operation: self.name(),
                    });
                }
                Ok(a / b)
            }
            BinOp::Modulo => {
                // Both sides truncate toward zero first; i64 keeps i32::MIN % -1 defined
                let (a, b) = (a as i64, b as i64);
                a.checked_rem(b)
                    .map(|r| r as Value)
                    .ok_or(MachineError::DivisionByZero {
                        operation: self.name(),
                    })
            }
        }
    }
}

impl Machine {
    /// Pop two operands and push `a op b`
    pub fn binary_op(&mut self, op: BinOp) -> Result<()> {
        self.stack.require(op.name(), 2)?;
        let sp = self.stack.pointer();
        let a = self.stack.peek_at(sp - 2)?;
        let b = self.stack.peek_at(sp - 1)?;
        let result = op.apply(a, b)?;

        self.pop()?;
        self.pop()?;
        self.push(result)
    }

    pub fn add(&mut self) -> Result<()> {
        self.binary_op(BinOp::Add)
    }

    pub fn subtract(&mut self) -> Result<()> {
        self.binary_op(BinOp::Subtract)
    }

    pub fn multiply(&mut self) -> Result<()> {
        self.binary_op(BinOp::Multiply)
    }

    pub fn divide(&mut self) -> Result<()> {
        self.binary_op(BinOp::Divide)
    }

    pub fn modulo(&mut self) -> Result<()> {
        self.binary_op(BinOp::Modulo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(op: BinOp, a: Value, b: Value) -> Result<Value> {
        let mut machine = Machine::new(4, 0);
        machine.push(a)?;
        machine.push(b)?;
        machine.binary_op(op)?;
        assert_eq!(machine.stack_pointer(), 1);
        machine.pop()
    }

    #[test]
    fn test_operand_order() {
        assert_eq!(run(BinOp::Subtract, 10.0, 3.0).unwrap(), 7.0);
        assert_eq!(run(BinOp::Divide, 9.0, 2.0).unwrap(), 4.5);
        assert_eq!(run(BinOp::Add, 1.5, 2.0).unwrap(), 3.5);
        assert_eq!(run(BinOp::Multiply, -3.0, 2.0).unwrap(), -6.0);
    }

    #[test]
    fn test_modulo_truncates_operands() {
        assert_eq!(run(BinOp::Modulo, 7.9, 3.2).unwrap(), 1.0);
        assert_eq!(run(BinOp::Modulo, -7.0, 3.0).unwrap(), -1.0);
        assert_eq!(run(BinOp::Modulo, i32::MIN as Value, -1.0).unwrap(), 0.0);
    }

    #[test]
    fn test_division_by_zero_keeps_operands() {
        let mut machine = Machine::new(4, 0);
        machine.push(1.0).unwrap();
        machine.push(0.0).unwrap();
        assert_eq!(
            machine.divide(),
            Err(MachineError::DivisionByZero {
                operation: "divide"
            })
        );
        assert_eq!(machine.stack().live(), &[1.0, 0.0]);

        // 0.4 truncates to zero
        machine.pop().unwrap();
        machine.push(0.4).unwrap();
        assert!(matches!(
            machine.modulo(),
            Err(MachineError::DivisionByZero { .. })
        ));
    }

    #[test]
    fn test_needs_two_operands() {
        let mut machine = Machine::new(4, 0);
        machine.push(1.0).unwrap();
        assert!(matches!(
            machine.add(),
            Err(MachineError::StackUnderflow { required: 2, .. })
        ));
        assert_eq!(machine.stack().live(), &[1.0]);
    }
}
