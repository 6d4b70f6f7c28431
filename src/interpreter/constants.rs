// Constants for the target machine

/// Default operand stack capacity in slots
pub const DEFAULT_STACK_CAPACITY: usize = 1024;

/// Default heap arena size in bytes
pub const DEFAULT_HEAP_SIZE: usize = 64 * 1024;

/// Default number of hook registers
pub const DEFAULT_HOOK_COUNT: usize = 256;

/// Width in characters of every buffer produced by the number formatters
pub const TEXT_BUFFER_WIDTH: usize = 32;

/// Character codes recognised by the number parsers
pub const MINUS_SIGN: u32 = 45;
pub const DECIMAL_POINT: u32 = 46;
pub const DIGIT_ZERO: u32 = 48;
pub const DIGIT_NINE: u32 = 57;
