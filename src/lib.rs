//! # Introduction
//!
//! lolvm is the stack-based target machine of the LOLCODE compiler. Compiled
//! programs run against a [`interpreter::engine::Machine`]: an operand stack
//! of numeric values, a byte-addressed heap with a first-fit allocator, a
//! base-pointer calling convention and a small numeric/text conversion library.
//!
//! ## Layers
//!
//! ```text
//! Trace → Ops → Machine (stack, heap, frames) → Snapshots → TUI
//! ```
//!
//! 1. [`memory`]: the single numeric value type, its 4-byte heap encoding,
//!    the operand stack and the heap.
//! 2. [`interpreter`]: the machine and its operations, fatal errors with exit
//!    codes, and op traces that drive the machine in a straight line.
//! 3. [`snapshot`]: records the machine after every op of a trace so an
//!    execution can be stepped forward and backward.
//! 4. [`ui`]: ratatui memory inspector over a recorded execution; not part of
//!    the stable library API.
//!
//! ## Failure model
//!
//! Every operation either completes or returns an
//! [`interpreter::errors::MachineError`] without having changed the machine.
//! All errors are fatal; [`interpreter::errors::fail_fast`] turns one into a
//! `panic:` diagnostic and a process exit code.

pub mod interpreter;
pub mod memory;
pub mod snapshot;
pub mod ui;

use tracing_subscriber::{fmt, EnvFilter};

/// Install the `tracing` subscriber for command-line use
///
/// Filtering follows `RUST_LOG`, defaulting to warnings only. Logs go to
/// stderr so they never mix with program output or the panic diagnostic.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
