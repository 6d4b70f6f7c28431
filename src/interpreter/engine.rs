//! The machine: the single mutable execution context
//!
//! [`Machine`] owns the operand stack, the heap, the base pointer, the return
//! register and the hook table. Operations are grouped by concern in sibling
//! modules as further `impl Machine` blocks:
//!
//! - this module: construction, the stack engine, `halt`, accessors
//! - [`memory_ops`](super::memory_ops): allocate/free, store/load, copy/move, hooks
//! - [`frames`](super::frames): calling convention and return register
//! - [`ops`](super::ops): arithmetic and sign
//! - [`conversions`](super::conversions): number parsing and formatting
//!
//! Sizes are fixed at construction; nothing grows afterwards.

use super::constants::{DEFAULT_HEAP_SIZE, DEFAULT_HOOK_COUNT, DEFAULT_STACK_CAPACITY};
use super::errors::{Result, EXIT_SUCCESS};
use crate::memory::{heap::Heap, stack::OperandStack, value::Value};
use tracing::{debug, trace};

/// Machine sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineConfig {
    /// Operand stack capacity in slots
    pub stack_capacity: usize,
    /// Heap size in bytes
    pub heap_size: usize,
    /// Number of hook registers
    pub hook_count: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        MachineConfig {
            stack_capacity: DEFAULT_STACK_CAPACITY,
            heap_size: DEFAULT_HEAP_SIZE,
            hook_count: DEFAULT_HOOK_COUNT,
        }
    }
}

/// The target machine
#[derive(Debug, Clone)]
pub struct Machine {
    pub(crate) stack: OperandStack,
    pub(crate) heap: Heap,
    pub(crate) base_pointer: usize,
    pub(crate) return_register: Value,
    pub(crate) hooks: Box<[Option<usize>]>, // stack references, see memory_ops
    pub(crate) frame_depth: usize,
}

impl Machine {
    /// Create a machine with the given stack capacity (slots) and heap size (bytes)
    pub fn new(stack_capacity: usize, heap_size: usize) -> Self {
        Self::with_config(MachineConfig {
            stack_capacity,
            heap_size,
            ..MachineConfig::default()
        })
    }

    /// Create a machine from a full configuration
    pub fn with_config(config: MachineConfig) -> Self {
        debug!(
            stack_capacity = config.stack_capacity,
            heap_size = config.heap_size,
            hooks = config.hook_count,
            "machine created"
        );
        Machine {
            stack: OperandStack::new(config.stack_capacity),
            heap: Heap::new(config.heap_size),
            base_pointer: 0,
            return_register: 0.0,
            hooks: vec![None; config.hook_count].into_boxed_slice(),
            frame_depth: 0,
        }
    }

    /// Push a value onto the operand stack
    pub fn push(&mut self, value: Value) -> Result<()> {
        self.stack.push(value)?;
        trace!(value, sp = self.stack.pointer(), "push");
        Ok(())
    }

    /// Pop the top value off the operand stack
    pub fn pop(&mut self) -> Result<Value> {
        let value = self.stack.pop()?;
        trace!(value, sp = self.stack.pointer(), "pop");
        Ok(value)
    }

    /// Read any live stack slot by absolute index
    pub fn peek_at(&self, index: usize) -> Result<Value> {
        self.stack.peek_at(index)
    }

    /// Release the machine and report a successful exit code
    pub fn halt(self) -> i32 {
        debug!(
            sp = self.stack.pointer(),
            heap_in_use = self.heap.allocated_bytes(),
            "halt"
        );
        EXIT_SUCCESS
    }

    /// The operand stack
    pub fn stack(&self) -> &OperandStack {
        &self.stack
    }

    /// The heap
    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    /// Number of live stack values
    pub fn stack_pointer(&self) -> usize {
        self.stack.pointer()
    }

    /// Start of the current frame's locals
    pub fn base_pointer(&self) -> usize {
        self.base_pointer
    }

    /// The return register
    pub fn return_register(&self) -> Value {
        self.return_register
    }

    /// The hook table
    pub fn hooks(&self) -> &[Option<usize>] {
        &self.hooks
    }

    /// Frames established and not yet torn down
    pub fn frame_depth(&self) -> usize {
        self.frame_depth
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::with_config(MachineConfig::default())
    }
}
