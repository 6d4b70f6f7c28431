//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`trace`]: Op listing with the next op and any failing op marked
//! - [`stack`]: Operand stack grouped into frames, return register and hooks
//! - [`heap`]: Live allocations with hex dumps and decoded slots
//! - [`status`]: Status bar with keybindings and replay state
//! - `utils`: Block styling, value formatting and scroll handling
//!
//! Each pane module exports a `render_*` function and the data and scroll
//! state types it takes.

mod utils;

pub mod heap;
pub mod stack;
pub mod status;
pub mod trace;

pub use heap::{render_heap_pane, HeapRenderData, HeapScrollState};
pub use stack::{render_stack_pane, StackRenderData, StackScrollState};
pub use status::{render_status_bar, StatusRenderData};
pub use trace::{render_trace_pane, TraceRenderData, TraceScrollState};
