//! Main TUI application state and logic

use crate::interpreter::errors::{AddressSpace, MachineError};
use crate::snapshot::{Outcome, Replay};
use crate::ui::panes::{
    render_heap_pane, render_stack_pane, render_status_bar, render_trace_pane, HeapRenderData,
    HeapScrollState, StackRenderData, StackScrollState, StatusRenderData, TraceRenderData,
    TraceScrollState,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Trace,
    Stack,
    Heap,
}

impl FocusedPane {
    /// Move focus to the next pane (trace -> stack -> heap)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Trace => FocusedPane::Stack,
            FocusedPane::Stack => FocusedPane::Heap,
            FocusedPane::Heap => FocusedPane::Trace,
        }
    }
}

/// The recorded failure, once the cursor has reached the state it failed in
fn visible_failure(replay: &Replay) -> Option<(usize, &MachineError)> {
    match replay.outcome() {
        Outcome::Failed { op_index, error } if replay.is_at_end() => Some((*op_index, error)),
        _ => None,
    }
}

/// The main application state
pub struct App {
    /// The recorded execution being inspected
    pub replay: Replay,

    /// The trace text, shown as recorded
    pub source: String,

    pub focused_pane: FocusedPane,

    pub trace_scroll: TraceScrollState,
    pub stack_scroll: StackScrollState,
    pub heap_scroll: HeapScrollState,

    pub should_quit: bool,
    pub status_message: String,

    /// Whether auto-play mode is active
    pub is_playing: bool,
    pub last_play_time: Instant,
}

impl App {
    pub fn new(replay: Replay, source: String) -> Self {
        App {
            replay,
            source,
            focused_pane: FocusedPane::Trace,
            trace_scroll: TraceScrollState {
                offset: 0,
                target_line_row: None,
            },
            stack_scroll: StackScrollState {
                offset: 0,
                prev_item_count: 0,
            },
            heap_scroll: HeapScrollState {
                offset: 0,
                prev_item_count: 0,
            },
            should_quit: false,
            status_message: String::from("Ready!"),
            is_playing: false,
            last_play_time: Instant::now(),
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if self.is_playing && self.last_play_time.elapsed() >= Duration::from_millis(500) {
                self.step_forward();
                if self.replay.is_at_end() {
                    self.is_playing = false;
                }
                self.last_play_time = Instant::now();
            }

            // Poll with a timeout so auto-play keeps ticking
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    fn render(&mut self, frame: &mut Frame) {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(frame.area());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(main_chunks[0]);

        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(columns[1]);

        let ops = self.replay.trace().ops();
        let failure = visible_failure(&self.replay);
        let next_line = ops.get(self.replay.next_op_index()).map(|t| t.line);
        let error_line = failure.and_then(|(op_index, _)| ops.get(op_index).map(|t| t.line));

        let (error_index, error_address) = match failure {
            Some((
                _,
                MachineError::InvalidAddress {
                    space: AddressSpace::Stack,
                    index,
                    ..
                },
            )) => (Some(*index), None),
            Some((
                _,
                MachineError::InvalidAddress {
                    space: AddressSpace::Heap,
                    index,
                    ..
                },
            )) => (None, Some(*index)),
            Some((_, MachineError::InvalidFree { address, .. })) => (None, Some(*address)),
            _ => (None, None),
        };

        render_trace_pane(
            frame,
            columns[0],
            TraceRenderData {
                source: &self.source,
                next_line,
                error_line,
            },
            self.focused_pane == FocusedPane::Trace,
            &mut self.trace_scroll,
        );

        if let Some(snapshot) = self.replay.current() {
            render_stack_pane(
                frame,
                right_rows[0],
                StackRenderData {
                    machine: &snapshot.machine,
                    error_index,
                },
                self.focused_pane == FocusedPane::Stack,
                &mut self.stack_scroll,
            );

            render_heap_pane(
                frame,
                right_rows[1],
                HeapRenderData {
                    heap: snapshot.machine.heap(),
                    error_address,
                },
                self.focused_pane == FocusedPane::Heap,
                &mut self.heap_scroll,
            );
        }

        let message = match failure {
            Some((_, error)) => format!("panic: {} (exit {})", error, error.exit_code()),
            None => self.status_message.clone(),
        };
        render_status_bar(
            frame,
            main_chunks[1],
            StatusRenderData {
                message: &message,
                current_step: self.replay.history_position(),
                total_steps: self.replay.total_snapshots(),
                is_error: failure.is_some(),
                is_playing: self.is_playing,
            },
        );
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            // Number keys step forward N times directly
            KeyCode::Char(c @ '1'..='9') => {
                self.is_playing = false;
                let n = c.to_digit(10).unwrap_or(1) as usize;
                let stepped = (0..n)
                    .take_while(|_| self.replay.step_forward().is_ok())
                    .count();
                self.status_message = format!("Stepped forward {} step(s)", stepped);
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::Left => {
                self.is_playing = false;
                self.step_backward();
            }
            KeyCode::Right => {
                self.is_playing = false;
                self.step_forward();
            }
            KeyCode::Up => match self.focused_pane {
                FocusedPane::Trace => {
                    // Scrolling up moves the current line down visually
                    if let Some(row) = self.trace_scroll.target_line_row {
                        self.trace_scroll.target_line_row = Some(row.saturating_add(1));
                    }
                }
                FocusedPane::Stack => {
                    self.stack_scroll.offset = self.stack_scroll.offset.saturating_sub(1);
                }
                FocusedPane::Heap => {
                    self.heap_scroll.offset = self.heap_scroll.offset.saturating_sub(1);
                }
            },
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Trace => {
                    if let Some(row) = self.trace_scroll.target_line_row {
                        self.trace_scroll.target_line_row = Some(row.saturating_sub(1));
                    }
                }
                FocusedPane::Stack => {
                    self.stack_scroll.offset = self.stack_scroll.offset.saturating_add(1);
                }
                FocusedPane::Heap => {
                    self.heap_scroll.offset = self.heap_scroll.offset.saturating_add(1);
                }
            },
            KeyCode::Char(' ') => {
                self.is_playing = !self.is_playing;
                self.status_message = if self.is_playing {
                    "Playing...".to_string()
                } else {
                    "Paused".to_string()
                };
            }
            KeyCode::Enter => {
                self.is_playing = false;
                self.replay.jump_to_end();
                self.status_message = "Jumped to end".to_string();
            }
            KeyCode::Backspace => {
                self.is_playing = false;
                self.replay.rewind_to_start();
                self.status_message = "Jumped to start".to_string();
            }
            _ => {}
        }
    }

    fn step_forward(&mut self) {
        self.status_message = match self.replay.step_forward() {
            Ok(()) => match self.replay.outcome() {
                Outcome::Halted(code) if self.replay.is_at_end() => {
                    format!("Halted with exit code {}", code)
                }
                Outcome::Truncated { .. } if self.replay.is_at_end() => {
                    "History ends here: snapshot limit reached".to_string()
                }
                _ => "Stepped forward".to_string(),
            },
            Err(e) => format!("Cannot step forward: {}", e),
        };
    }

    fn step_backward(&mut self) {
        self.status_message = match self.replay.step_backward() {
            Ok(()) => "Stepped backward".to_string(),
            Err(e) => format!("Cannot step backward: {}", e),
        };
    }
}
