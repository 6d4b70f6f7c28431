//! Execution core of the target machine
//!
//! This module provides the machine and every operation it supports:
//! - [`engine`]: the [`engine::Machine`] context, construction and the stack engine
//! - [`memory_ops`]: heap allocation, store/load, stack references and hooks
//! - [`frames`]: the calling convention and the return register
//! - [`ops`]: arithmetic and sign
//! - [`conversions`]: number parsing and formatting over heap text
//! - [`trace`]: straight-line op listings and their replay
//! - [`errors`]: the fatal error type and process termination
//!
//! # Execution Model
//!
//! Every operation runs to completion before the next begins and either
//! succeeds or leaves the machine untouched and returns a [`errors::MachineError`].
//! Control flow belongs to the dispatcher driving the machine, not to the
//! machine itself.

pub mod constants;
pub mod conversions;
pub mod engine;
pub mod errors;
pub mod frames;
pub mod memory_ops;
pub mod ops;
pub mod trace;
