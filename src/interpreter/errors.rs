//! Runtime error types for the target machine
//!
//! This module defines [`MachineError`], the single error type every core
//! operation returns. Every variant is fatal: the machine has no recoverable
//! error concept. Operations detect violations before mutating state, return
//! the error to the caller, and the top-level [`fail_fast`] wrapper turns it
//! into process termination with the variant's [`exit code`].
//!
//! [`exit code`]: MachineError::exit_code

use std::fmt;
use std::io::Write;
use thiserror::Error;

/// Result alias used throughout the machine
pub type Result<T> = std::result::Result<T, MachineError>;

/// Exit code reported by a clean `halt`
pub const EXIT_SUCCESS: i32 = 0;

/// Exit code for failures outside the machine, such as bad arguments or a
/// terminal that cannot be driven. Distinct from every [`MachineError`] code.
pub const EXIT_USAGE: i32 = 64;

/// Which address space an invalid access targeted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSpace {
    Stack,
    Heap,
    Hook,
}

impl fmt::Display for AddressSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressSpace::Stack => write!(f, "stack"),
            AddressSpace::Heap => write!(f, "heap"),
            AddressSpace::Hook => write!(f, "hook"),
        }
    }
}

/// Fatal runtime errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MachineError {
    /// Push onto a full stack
    #[error("stack overflow: capacity of {capacity} slots exhausted")]
    StackOverflow { capacity: usize },

    /// Pop from an empty stack, or a frame teardown with too few live slots
    #[error("stack underflow: {operation} needs {required} slot(s), {available} live")]
    StackUnderflow {
        operation: &'static str,
        required: usize,
        available: usize,
    },

    /// No free run of the requested length exists
    #[error("no free memory: requested {requested} bytes, largest free run is {largest_free}")]
    NoFreeMemory {
        requested: usize,
        largest_free: usize,
    },

    /// Stack, heap or hook index outside the valid range
    #[error("invalid {space} address {index} (valid range 0..{limit})")]
    InvalidAddress {
        space: AddressSpace,
        index: usize,
        limit: usize,
    },

    /// Hook read before anything was recorded in it
    #[error("invalid hook {index}: nothing recorded")]
    UnsetHook { index: usize },

    /// Free of a region that is not a live allocation
    #[error("invalid free: no live allocation of {size} bytes at address {address}")]
    InvalidFree { address: usize, size: usize },

    /// Divide or modulo by zero
    #[error("division by zero in {operation}")]
    DivisionByZero { operation: &'static str },

    /// Text that does not parse as a number
    #[error("malformed numeric text {text:?}: {reason}")]
    MalformedNumericText { text: String, reason: &'static str },

    /// Operand that cannot serve as a count, address or index
    #[error("invalid operand {value} for {operation}")]
    InvalidOperand {
        operation: &'static str,
        value: f32,
    },
}

impl MachineError {
    /// Process exit code for this failure kind
    ///
    /// A full stack reports code 1 like an exhausted heap: both are the machine
    /// running out of memory.
    pub fn exit_code(&self) -> i32 {
        match self {
            MachineError::NoFreeMemory { .. } | MachineError::StackOverflow { .. } => 1,
            MachineError::StackUnderflow { .. } => 2,
            MachineError::InvalidAddress { .. } | MachineError::UnsetHook { .. } => 3,
            MachineError::InvalidFree { .. } => 4,
            MachineError::DivisionByZero { .. } => 5,
            MachineError::MalformedNumericText { .. } => 6,
            MachineError::InvalidOperand { .. } => 7,
        }
    }
}

/// Unwrap a machine result or terminate the process.
///
/// On failure prints `panic: <diagnostic>` followed by a blank line to stdout
/// and exits with [`MachineError::exit_code`]. No machine state survives.
pub fn fail_fast<T>(result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            tracing::error!(code = err.exit_code(), "{err}");
            let mut stdout = std::io::stdout().lock();
            let _ = writeln!(stdout, "panic: {err}\n");
            let _ = stdout.flush();
            std::process::exit(err.exit_code());
        }
    }
}
