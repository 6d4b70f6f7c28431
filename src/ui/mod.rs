//! Terminal memory inspector built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! The UI is organized into three layers:
//!
//! - **[`app`]**: replay cursor, keyboard event loop, pane focus
//! - **[`panes`]**: stateless render functions for each visible pane (trace,
//!   stack, heap, status bar)
//! - **[`theme`]**: centralized color palette used by all panes
//!
//! The entry point for consumers is [`App`]: construct it with a recorded
//! [`Replay`] and the trace text, then call [`App::run`] to start the event loop.
//!
//! [`Replay`]: crate::snapshot::Replay
//! [`App::run`]: app::App::run

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
