//! Op traces
//!
//! A trace is a straight-line listing of machine operations, one per line,
//! using the mnemonics of the compiler's intermediate form:
//!
//! ```text
//! # sum of two literals
//! push 2
//! push 3
//! add
//! halt
//! ```
//!
//! `#` starts a comment and blank lines are skipped. Traces carry no control
//! flow: they are replayed top to bottom, which is what the inspector needs to
//! step through a recorded execution. Running off the end counts as `halt`.

use super::engine::Machine;
use super::errors::Result;
use crate::memory::value::Value;
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};

/// A malformed trace line
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("trace error at line {line}: {message}")]
pub struct TraceError {
    pub line: usize,
    pub message: String,
}

/// One machine operation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    Push(Value),
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Sign,
    Allocate,
    Free,
    Store(usize),
    Load(usize),
    Copy,
    Move,
    Hook(usize),
    RefHook(usize),
    LoadBasePtr,
    EstablishFrame,
    EndFrame { args: usize, locals: usize },
    SetReturn,
    GetReturn,
    TextToInteger,
    TextToFloat,
    IntegerToText,
    FloatToText,
    FloatToInteger,
    IntegerToFloat,
    Halt,
}

/// What the caller should do after an op
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Halt,
}

impl Op {
    /// Execute this op against the machine
    ///
    /// `Halt` does not consume the machine here; the caller decides when to
    /// release it.
    pub fn apply(&self, machine: &mut Machine) -> Result<Flow> {
        match *self {
            Op::Push(value) => machine.push(value)?,
            Op::Add => machine.add()?,
            Op::Subtract => machine.subtract()?,
            Op::Multiply => machine.multiply()?,
            Op::Divide => machine.divide()?,
            Op::Modulo => machine.modulo()?,
            Op::Sign => machine.sign()?,
            Op::Allocate => {
                machine.allocate()?;
            }
            Op::Free => machine.free()?,
            Op::Store(slots) => machine.store(slots)?,
            Op::Load(slots) => machine.load(slots)?,
            Op::Copy => machine.copy()?,
            Op::Move => machine.move_to()?,
            Op::Hook(index) => machine.hook(index)?,
            Op::RefHook(index) => machine.read_hook(index)?,
            Op::LoadBasePtr => machine.load_base_pointer()?,
            Op::EstablishFrame => machine.establish_frame()?,
            Op::EndFrame { args, locals } => machine.end_frame(args, locals)?,
            Op::SetReturn => machine.set_return_register()?,
            Op::GetReturn => machine.read_return_register()?,
            Op::TextToInteger => {
                machine.text_to_integer()?;
            }
            Op::TextToFloat => {
                machine.text_to_float()?;
            }
            Op::IntegerToText => {
                machine.integer_to_text()?;
            }
            Op::FloatToText => {
                machine.float_to_text()?;
            }
            Op::FloatToInteger => machine.float_to_integer()?,
            Op::IntegerToFloat => machine.integer_to_float()?,
            Op::Halt => return Ok(Flow::Halt),
        }
        Ok(Flow::Continue)
    }

    fn parse(text: &str, line: usize) -> std::result::Result<Op, TraceError> {
        let err = |message: String| TraceError { line, message };
        let mut words = text.split_whitespace();
        let mnemonic = words.next().unwrap_or_default();
        let operands: Vec<&str> = words.collect();

        let arity = match mnemonic {
            "push" | "store" | "load" | "hook" | "ref_hook" => 1,
            "leave" => 2,
            _ => 0,
        };
        if operands.len() != arity {
            return Err(err(format!(
                "`{mnemonic}` takes {arity} operand(s), found {}",
                operands.len()
            )));
        }

        let count = |i: usize| -> std::result::Result<usize, TraceError> {
            operands[i]
                .parse::<usize>()
                .map_err(|_| err(format!("expected a count, found `{}`", operands[i])))
        };

        let op = match mnemonic {
            "push" => Op::Push(
                operands[0]
                    .parse::<Value>()
                    .map_err(|_| err(format!("expected a number, found `{}`", operands[0])))?,
            ),
            "add" => Op::Add,
            "sub" => Op::Subtract,
            "mul" => Op::Multiply,
            "div" => Op::Divide,
            "mod" => Op::Modulo,
            "sign" => Op::Sign,
            "alloc" => Op::Allocate,
            "free" => Op::Free,
            "store" => Op::Store(count(0)?),
            "load" => Op::Load(count(0)?),
            "copy" => Op::Copy,
            "mov" => Op::Move,
            "hook" => Op::Hook(count(0)?),
            "ref_hook" => Op::RefHook(count(0)?),
            "load_base_ptr" => Op::LoadBasePtr,
            "enter" => Op::EstablishFrame,
            "leave" => Op::EndFrame {
                args: count(0)?,
                locals: count(1)?,
            },
            "set_ret" => Op::SetReturn,
            "get_ret" => Op::GetReturn,
            "atoi" => Op::TextToInteger,
            "atof" => Op::TextToFloat,
            "itoa" => Op::IntegerToText,
            "ftoa" => Op::FloatToText,
            "ftoi" => Op::FloatToInteger,
            "itof" => Op::IntegerToFloat,
            "halt" => Op::Halt,
            other => return Err(err(format!("unknown mnemonic `{other}`"))),
        };
        Ok(op)
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Op::Push(value) => write!(f, "push {value}"),
            Op::Add => write!(f, "add"),
            Op::Subtract => write!(f, "sub"),
            Op::Multiply => write!(f, "mul"),
            Op::Divide => write!(f, "div"),
            Op::Modulo => write!(f, "mod"),
            Op::Sign => write!(f, "sign"),
            Op::Allocate => write!(f, "alloc"),
            Op::Free => write!(f, "free"),
            Op::Store(n) => write!(f, "store {n}"),
            Op::Load(n) => write!(f, "load {n}"),
            Op::Copy => write!(f, "copy"),
            Op::Move => write!(f, "mov"),
            Op::Hook(i) => write!(f, "hook {i}"),
            Op::RefHook(i) => write!(f, "ref_hook {i}"),
            Op::LoadBasePtr => write!(f, "load_base_ptr"),
            Op::EstablishFrame => write!(f, "enter"),
            Op::EndFrame { args, locals } => write!(f, "leave {args} {locals}"),
            Op::SetReturn => write!(f, "set_ret"),
            Op::GetReturn => write!(f, "get_ret"),
            Op::TextToInteger => write!(f, "atoi"),
            Op::TextToFloat => write!(f, "atof"),
            Op::IntegerToText => write!(f, "itoa"),
            Op::FloatToText => write!(f, "ftoa"),
            Op::FloatToInteger => write!(f, "ftoi"),
            Op::IntegerToFloat => write!(f, "itof"),
            Op::Halt => write!(f, "halt"),
        }
    }
}

/// An op together with the source line it came from (1-based)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TracedOp {
    pub op: Op,
    pub line: usize,
}

/// A parsed trace
#[derive(Debug, Clone, PartialEq)]
pub struct Trace {
    ops: Vec<TracedOp>,
}

impl Trace {
    /// Parse a trace listing
    pub fn parse(source: &str) -> std::result::Result<Self, TraceError> {
        let mut ops = Vec::new();
        for (i, raw) in source.lines().enumerate() {
            let text = raw.split('#').next().unwrap_or_default().trim();
            if text.is_empty() {
                continue;
            }
            ops.push(TracedOp {
                op: Op::parse(text, i + 1)?,
                line: i + 1,
            });
        }
        debug!(ops = ops.len(), "trace parsed");
        Ok(Trace { ops })
    }

    /// Build a trace directly from ops; line numbers are positions
    pub fn from_ops(ops: impl IntoIterator<Item = Op>) -> Self {
        let ops = ops
            .into_iter()
            .enumerate()
            .map(|(i, op)| TracedOp { op, line: i + 1 })
            .collect();
        Trace { ops }
    }

    pub fn ops(&self) -> &[TracedOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Execute every op in order and return the exit code of the final `halt`
    ///
    /// The first failing op ends the run with its error.
    pub fn run(&self, mut machine: Machine) -> Result<i32> {
        for traced in &self.ops {
            if traced.op.apply(&mut machine)? == Flow::Halt {
                return Ok(machine.halt());
            }
        }
        warn!("trace ended without halt");
        Ok(machine.halt())
    }
}
