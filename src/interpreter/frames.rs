//! Calling convention
//!
//! A call is laid out on the operand stack as:
//!
//! ```text
//! ... | arg 0 .. arg n-1 | return slot | saved bp | local 0 .. local m-1 | ...
//!                                                 ^
//!                                                 base_pointer
//! ```
//!
//! The caller pushes the arguments and a placeholder return slot (return
//! addressing belongs to the dispatcher), the callee runs
//! [`Machine::establish_frame`], and [`Machine::end_frame`] unwinds all of it.
//! Saved base pointers form a chain through the stack, one link per live frame.
//! Results cross the teardown through the return register.

use super::engine::Machine;
use super::errors::{AddressSpace, MachineError, Result};
use crate::memory::value::{expect_index, from_index};
use tracing::debug;

impl Machine {
    /// Save the base pointer and anchor a new frame at the stack top
    pub fn establish_frame(&mut self) -> Result<()> {
        self.push(from_index(self.base_pointer))?;
        self.base_pointer = self.stack.pointer();
        self.frame_depth += 1;
        debug!(bp = self.base_pointer, depth = self.frame_depth, "frame established");
        Ok(())
    }

    /// Tear down the current frame: locals, saved link, return slot, arguments
    ///
    /// Fails without touching the stack if fewer than `locals + 2 + args` values
    /// are live, if `locals` does not reach back to the current frame's link, or
    /// if the saved link is not a valid stack position.
    pub fn end_frame(&mut self, args: usize, locals: usize) -> Result<()> {
        let required = locals.saturating_add(2).saturating_add(args);
        self.stack.require("end_frame", required)?;

        let sp = self.stack.pointer();
        let link_index = sp - locals - 1;
        if link_index + 1 != self.base_pointer {
            return Err(MachineError::InvalidAddress {
                space: AddressSpace::Stack,
                index: link_index,
                limit: self.base_pointer,
            });
        }
        let saved = expect_index(self.stack.peek_at(link_index)?, "end_frame")?;
        if saved > link_index {
            return Err(MachineError::InvalidAddress {
                space: AddressSpace::Stack,
                index: saved,
                limit: link_index,
            });
        }

        for _ in 0..locals {
            self.pop()?;
        }
        self.pop()?; // saved link, already decoded
        self.base_pointer = saved;
        self.pop()?; // return slot
        for _ in 0..args {
            self.pop()?;
        }

        self.frame_depth = self.frame_depth.saturating_sub(1);
        debug!(bp = self.base_pointer, depth = self.frame_depth, "frame ended");
        Ok(())
    }

    /// Pop the top of stack into the return register
    pub fn set_return_register(&mut self) -> Result<()> {
        self.return_register = self.pop()?;
        Ok(())
    }

    /// Push the return register
    pub fn read_return_register(&mut self) -> Result<()> {
        self.push(self.return_register)
    }
}

#[cfg(test)]
mod tests {
    use crate::interpreter::engine::Machine;
    use crate::interpreter::errors::MachineError;

    #[test]
    fn test_establish_saves_link() {
        let mut machine = Machine::new(16, 0);
        machine.push(5.0).unwrap();
        machine.establish_frame().unwrap();

        assert_eq!(machine.base_pointer(), 2);
        assert_eq!(machine.peek_at(1).unwrap(), 0.0);
        assert_eq!(machine.frame_depth(), 1);
    }

    #[test]
    fn test_call_and_return() {
        let mut machine = Machine::new(16, 0);
        machine.establish_frame().unwrap(); // entry frame
        machine.push(9.0).unwrap(); // caller local
        let outer_bp = machine.base_pointer();
        let outer_sp = machine.stack_pointer();

        machine.push(3.0).unwrap(); // arg
        machine.push(4.0).unwrap(); // arg
        machine.push(1.0).unwrap(); // return slot
        machine.establish_frame().unwrap();
        machine.push(7.0).unwrap(); // callee local
        machine.set_return_register().unwrap();
        machine.push(7.0).unwrap();
        machine.end_frame(2, 1).unwrap();

        assert_eq!(machine.base_pointer(), outer_bp);
        assert_eq!(machine.stack_pointer(), outer_sp);
        assert_eq!(machine.frame_depth(), 1);

        machine.read_return_register().unwrap();
        assert_eq!(machine.stack().top(), Some(7.0));
    }

    #[test]
    fn test_end_frame_underflow_mutates_nothing() {
        let mut machine = Machine::new(16, 0);
        machine.push(1.0).unwrap();
        machine.establish_frame().unwrap();
        let before = machine.stack().live().to_vec();

        assert!(matches!(
            machine.end_frame(3, 0),
            Err(MachineError::StackUnderflow { required: 5, .. })
        ));
        assert_eq!(machine.stack().live(), before.as_slice());
        assert_eq!(machine.base_pointer(), 2);
    }

    #[test]
    fn test_corrupt_link_is_rejected() {
        let mut machine = Machine::new(16, 0);
        machine.push(1.0).unwrap();
        machine.establish_frame().unwrap();
        machine.stack.poke_at(1, 40.0).unwrap(); // not a base pointer
        assert!(matches!(
            machine.end_frame(0, 0),
            Err(MachineError::InvalidAddress { index: 40, .. })
        ));
        assert_eq!(machine.stack_pointer(), 2);
        assert_eq!(machine.base_pointer(), 2);
    }

    #[test]
    fn test_wrong_local_count_is_rejected() {
        let mut machine = Machine::new(16, 0);
        machine.push(1.0).unwrap(); // return slot
        machine.establish_frame().unwrap(); // link at 1
        machine.push(0.0).unwrap();
        machine.push(2.0).unwrap(); // looks like a saved link
        let before = machine.stack().live().to_vec();

        assert!(matches!(
            machine.end_frame(0, 1),
            Err(MachineError::InvalidAddress { index: 2, limit: 2, .. })
        ));
        assert_eq!(machine.stack().live(), before.as_slice());
        assert_eq!(machine.base_pointer(), 2);
        assert_eq!(machine.frame_depth(), 1);

        machine.end_frame(0, 2).unwrap();
        assert!(machine.stack().is_empty());
        assert_eq!(machine.base_pointer(), 0);
    }
}
