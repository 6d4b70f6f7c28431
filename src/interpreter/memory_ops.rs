//! Memory access operations
//!
//! Heap allocation, typed multi-slot transfer between stack and heap, and the
//! stack reference operations (`copy`, `move_to`, hooks).
//!
//! # Stack References
//!
//! A stack reference is a *one-past* position: reference `r` denotes slot
//! `r - 1`, which is exactly the stack pointer right after the referenced
//! value was pushed. [`Machine::hook`] records references in this form and
//! [`Machine::copy`] / [`Machine::move_to`] consume them, so a compiled
//! `push; hook h; ...; read_hook h; copy` sequence duplicates the pushed value.
//! Reference 0 never denotes a slot.
//!
//! Every operation validates its operands before popping anything, so a
//! failing operation leaves the machine exactly as it found it.

use super::engine::Machine;
use super::errors::{AddressSpace, MachineError, Result};
use crate::memory::slot_bytes;
use crate::memory::value::{expect_index, from_index, Address, Value, SLOT_BYTES};
use tracing::debug;

impl Machine {
    /// Top of stack without popping; the caller has already checked it exists
    fn top_operand(&self, offset: usize) -> Result<Value> {
        let sp = self.stack.pointer();
        self.stack.peek_at(sp - 1 - offset)
    }

    /// Turn a stack reference into a slot index below `live`
    fn resolve_reference(
        &self,
        reference: Value,
        live: usize,
        operation: &'static str,
    ) -> Result<usize> {
        let reference = expect_index(reference, operation)?;
        if reference == 0 {
            return Err(MachineError::InvalidOperand {
                operation,
                value: 0.0,
            });
        }
        if reference > live {
            return Err(MachineError::InvalidAddress {
                space: AddressSpace::Stack,
                index: reference - 1,
                limit: live,
            });
        }
        Ok(reference - 1)
    }

    /// Pop a slot count, allocate `count * 4` bytes first fit, push and return the address
    pub fn allocate(&mut self) -> Result<Address> {
        self.stack.require("allocate", 1)?;
        let slots = expect_index(self.top_operand(0)?, "allocate")?;
        let size = slot_bytes(slots, "allocate")?;

        let addr = self.heap.allocate(size)?;
        debug!(addr, size, "allocate");

        self.pop()?;
        self.push(from_index(addr))?;
        Ok(addr)
    }

    /// Pop an address then a slot count and release that allocation
    pub fn free(&mut self) -> Result<()> {
        self.stack.require("free", 2)?;
        let addr = expect_index(self.top_operand(0)?, "free")?;
        let slots = expect_index(self.top_operand(1)?, "free")?;
        let size = slot_bytes(slots, "free")?;

        self.heap.free(addr, size)?;
        debug!(addr, size, "free");

        self.pop()?;
        self.pop()?;
        Ok(())
    }

    /// Pop an address, then `slots` values, and write them to the heap
    ///
    /// The value pushed first lands at the lowest address.
    pub fn store(&mut self, slots: usize) -> Result<()> {
        self.stack.require("store", slots.saturating_add(1))?;
        let addr = expect_index(self.top_operand(0)?, "store")?;
        self.heap.check_range(addr, slot_bytes(slots, "store")?)?;

        self.pop()?;
        for i in (0..slots).rev() {
            let value = self.pop()?;
            self.heap.write_slot(addr + i * SLOT_BYTES, value)?;
        }
        Ok(())
    }

    /// Pop an address and push `slots` values read from the heap, low address first
    pub fn load(&mut self, slots: usize) -> Result<()> {
        self.stack.require("load", 1)?;
        let addr = expect_index(self.top_operand(0)?, "load")?;
        self.heap.check_range(addr, slot_bytes(slots, "load")?)?;

        let free_after_pop = self.stack.capacity() - self.stack.pointer() + 1;
        if slots > free_after_pop {
            return Err(MachineError::StackOverflow {
                capacity: self.stack.capacity(),
            });
        }

        self.pop()?;
        for i in 0..slots {
            let value = self.heap.read_slot(addr + i * SLOT_BYTES)?;
            self.push(value)?;
        }
        Ok(())
    }

    /// Pop a stack reference and push a duplicate of the referenced value
    pub fn copy(&mut self) -> Result<()> {
        self.stack.require("copy", 1)?;
        let live = self.stack.pointer() - 1;
        let index = self.resolve_reference(self.top_operand(0)?, live, "copy")?;
        let value = self.stack.peek_at(index)?;

        self.pop()?;
        self.push(value)
    }

    /// Pop a stack reference, then a value, and overwrite the referenced slot
    pub fn move_to(&mut self) -> Result<()> {
        self.stack.require("move", 2)?;
        let live = self.stack.pointer() - 2;
        let index = self.resolve_reference(self.top_operand(0)?, live, "move")?;

        self.pop()?;
        let value = self.pop()?;
        self.stack.poke_at(index, value)
    }

    fn check_hook(&self, index: usize) -> Result<()> {
        if index >= self.hooks.len() {
            return Err(MachineError::InvalidAddress {
                space: AddressSpace::Hook,
                index,
                limit: self.hooks.len(),
            });
        }
        Ok(())
    }

    /// Record a reference to the current top of stack in hook `index`
    pub fn hook(&mut self, index: usize) -> Result<()> {
        self.check_hook(index)?;
        self.stack.require("hook", 1)?;
        self.hooks[index] = Some(self.stack.pointer());
        Ok(())
    }

    /// Push the reference stored in hook `index`
    ///
    /// Fails if the hook was never set or the slot it names has since been popped.
    pub fn read_hook(&mut self, index: usize) -> Result<()> {
        self.check_hook(index)?;
        let reference = self.hooks[index].ok_or(MachineError::UnsetHook { index })?;
        let live = self.stack.pointer();
        if reference > live {
            return Err(MachineError::InvalidAddress {
                space: AddressSpace::Stack,
                index: reference - 1,
                limit: live,
            });
        }
        self.push(from_index(reference))
    }

    /// Push the current base pointer
    pub fn load_base_pointer(&mut self) -> Result<()> {
        self.push(from_index(self.base_pointer))
    }
}
