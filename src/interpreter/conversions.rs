//! Numeric/text conversion library
//!
//! Text lives on the heap as one character code per slot. The parsers read a
//! run of codes and fold them into a number; the formatters render a number
//! into a fresh zero-padded buffer of [`TEXT_BUFFER_WIDTH`] slots and hand its
//! address to the caller, who owns it from then on.
//!
//! # Accepted Text
//!
//! ```text
//! integer := '-'? digit*
//! float   := '-'? digit* ('.' digit*)?
//! ```
//!
//! A code of 0 ends the text early, so a formatter's padded buffer parses back
//! to the number it was rendered from. Empty text is zero.

use super::constants::{DECIMAL_POINT, DIGIT_NINE, DIGIT_ZERO, MINUS_SIGN, TEXT_BUFFER_WIDTH};
use super::engine::Machine;
use super::errors::{MachineError, Result};
use crate::memory::slot_bytes;
use crate::memory::value::{expect_index, from_index, Address, Value, SLOT_BYTES};
use tracing::debug;

/// Which grammar a parse follows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NumberKind {
    Integer,
    Float,
}

/// Render character codes for a diagnostic, stopping at the terminator
fn describe(codes: &[Value]) -> String {
    codes
        .iter()
        .take_while(|&&code| code != 0.0)
        .map(|&code| {
            if code.fract() == 0.0 && code > 0.0 {
                char::from_u32(code as u32).unwrap_or(char::REPLACEMENT_CHARACTER)
            } else {
                char::REPLACEMENT_CHARACTER
            }
        })
        .collect()
}

fn malformed(codes: &[Value], reason: &'static str) -> MachineError {
    MachineError::MalformedNumericText {
        text: describe(codes),
        reason,
    }
}

/// Parse a run of character codes
fn parse_codes(codes: &[Value], kind: NumberKind) -> Result<Value> {
    let mut negative = false;
    let mut whole = 0.0f64;
    let mut fraction = 0.0f64;
    let mut scale = 1.0f64;
    let mut seen_point = false;

    for (i, &raw) in codes.iter().enumerate() {
        if raw == 0.0 {
            break;
        }
        if raw.fract() != 0.0 || raw < 0.0 {
            return Err(malformed(codes, "not a character code"));
        }

        match raw as u32 {
            MINUS_SIGN if i == 0 => negative = true,
            MINUS_SIGN => return Err(malformed(codes, "sign after the first character")),
            DECIMAL_POINT if kind == NumberKind::Float && !seen_point => seen_point = true,
            DECIMAL_POINT if kind == NumberKind::Float => {
                return Err(malformed(codes, "second decimal point"))
            }
            code @ DIGIT_ZERO..=DIGIT_NINE => {
                let digit = f64::from(code - DIGIT_ZERO);
                if seen_point {
                    scale *= 10.0;
                    fraction += digit / scale;
                } else {
                    whole = whole * 10.0 + digit;
                }
            }
            _ => return Err(malformed(codes, "unexpected character")),
        }
    }

    let magnitude = match kind {
        NumberKind::Integer => whole,
        NumberKind::Float => whole + fraction,
    };
    let signed = if negative { -magnitude } else { magnitude };
    Ok(signed as Value)
}

/// Format an integer the way `%d` renders the truncated value
fn format_integer(value: Value) -> String {
    format!("{}", value as i64)
}

/// Format a float the way `%f` does: six fractional digits
fn format_float(value: Value) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        let text = if value < 0.0 { "-inf" } else { "inf" };
        text.to_string()
    } else {
        format!("{:.6}", value)
    }
}

impl Machine {
    /// Pop a length and an address and parse that many codes from the heap
    ///
    /// Operands stay on the stack if the text is out of range or malformed.
    fn parse_text(&mut self, kind: NumberKind, operation: &'static str) -> Result<Value> {
        self.stack.require(operation, 2)?;
        let sp = self.stack.pointer();
        let len = expect_index(self.stack.peek_at(sp - 1)?, operation)?;
        let addr = expect_index(self.stack.peek_at(sp - 2)?, operation)?;
        self.heap.check_range(addr, slot_bytes(len, operation)?)?;

        let codes = (0..len)
            .map(|i| self.heap.read_slot(addr + i * SLOT_BYTES))
            .collect::<Result<Vec<_>>>()?;
        let value = parse_codes(&codes, kind)?;
        debug!(operation, addr, len, value, "parsed text");

        self.pop()?;
        self.pop()?;
        self.push(value)?;
        Ok(value)
    }

    /// Replace the top value with the address of a new buffer holding `render(value)`
    fn format_text(
        &mut self,
        render: fn(Value) -> String,
        operation: &'static str,
    ) -> Result<Address> {
        self.stack.require(operation, 1)?;
        let value = self.stack.peek_at(self.stack.pointer() - 1)?;

        // At most width - 1 characters, the rest of the buffer stays zero
        let mut codes = [0.0; TEXT_BUFFER_WIDTH];
        let text = render(value);
        for (slot, ch) in codes.iter_mut().zip(text.chars().take(TEXT_BUFFER_WIDTH - 1)) {
            *slot = ch as u32 as Value;
        }

        let addr = self.heap.allocate(slot_bytes(TEXT_BUFFER_WIDTH, operation)?)?;
        for (i, &code) in codes.iter().enumerate() {
            self.heap.write_slot(addr + i * SLOT_BYTES, code)?;
        }
        debug!(operation, value, addr, "formatted text");

        self.pop()?;
        self.push(from_index(addr))?;
        Ok(addr)
    }

    /// Parse an optionally signed decimal integer
    ///
    /// Pops the text length, then the text address.
    pub fn text_to_integer(&mut self) -> Result<Value> {
        self.parse_text(NumberKind::Integer, "text_to_integer")
    }

    /// Parse an optionally signed decimal number with at most one decimal point
    pub fn text_to_float(&mut self) -> Result<Value> {
        self.parse_text(NumberKind::Float, "text_to_float")
    }

    /// Render the truncated top value as decimal text in a new heap buffer
    pub fn integer_to_text(&mut self) -> Result<Address> {
        self.format_text(format_integer, "integer_to_text")
    }

    /// Render the top value with six fractional digits in a new heap buffer
    pub fn float_to_text(&mut self) -> Result<Address> {
        self.format_text(format_float, "float_to_text")
    }

    /// Truncate the top value toward zero
    pub fn float_to_integer(&mut self) -> Result<()> {
        let value = self.pop()?;
        self.push(value.trunc())
    }

    /// Integers and floats share one representation, so only the operand is checked
    pub fn integer_to_float(&mut self) -> Result<()> {
        self.stack.require("integer_to_float", 1)
    }
}
