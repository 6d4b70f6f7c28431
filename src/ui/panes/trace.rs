//! Trace pane rendering
//!
//! Shows the op listing with line numbers, highlighting mnemonics, operands
//! and comments. The op that runs next is marked with an arrow; the line of an
//! op that failed is drawn in the error style once the replay reaches it.

use super::utils::pane_block;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Highlight one trace line
fn highlight_trace_line(line: &str) -> Vec<Span<'_>> {
    let (code, comment) = match line.find('#') {
        Some(i) => line.split_at(i),
        None => (line, ""),
    };

    let mut spans = Vec::new();
    let mut words = code.split_inclusive(char::is_whitespace);
    if let Some(mnemonic) = words.next() {
        spans.push(Span::styled(
            mnemonic,
            Style::default()
                .fg(DEFAULT_THEME.keyword)
                .add_modifier(Modifier::BOLD),
        ));
    }
    for operand in words {
        spans.push(Span::styled(
            operand,
            Style::default().fg(DEFAULT_THEME.number),
        ));
    }
    if !comment.is_empty() {
        spans.push(Span::styled(
            comment,
            Style::default().fg(DEFAULT_THEME.comment),
        ));
    }
    spans
}

/// Scroll state for the trace pane
pub struct TraceScrollState {
    pub offset: usize,
    pub target_line_row: Option<usize>,
}

/// Data needed to render the trace pane
pub struct TraceRenderData<'a> {
    pub source: &'a str,
    /// Line of the op that runs next, if any
    pub next_line: Option<usize>,
    /// Line of the op that failed, once the replay has reached it
    pub error_line: Option<usize>,
}

/// Render the trace pane
pub fn render_trace_pane(
    frame: &mut Frame,
    area: Rect,
    data: TraceRenderData,
    is_focused: bool,
    scroll_state: &mut TraceScrollState,
) {
    let block = pane_block(" Trace ", is_focused);

    let lines: Vec<&str> = data.source.lines().collect();
    let total_lines = lines.len();
    let visible_height = area.height.saturating_sub(2).max(1) as usize;

    let target_row = scroll_state
        .target_line_row
        .unwrap_or(visible_height / 2)
        .min(visible_height.saturating_sub(1));
    scroll_state.target_line_row = Some(target_row);

    // Keep the current line at the target row
    let current_line = data.error_line.or(data.next_line).unwrap_or(0);
    if current_line > 0 && current_line <= total_lines {
        let max_scroll = total_lines.saturating_sub(visible_height);
        scroll_state.offset = (current_line - 1).saturating_sub(target_row).min(max_scroll);
    }

    let visible_lines: Vec<Line> = lines
        .iter()
        .enumerate()
        .skip(scroll_state.offset)
        .take(visible_height)
        .map(|(idx, line)| {
            let line_num = idx + 1;
            let is_error = data.error_line == Some(line_num);
            let is_next = data.next_line == Some(line_num);

            let marker = if is_error {
                "✗ "
            } else if is_next {
                "▶ "
            } else {
                "  "
            };

            let num_style = if is_error {
                Style::default()
                    .fg(DEFAULT_THEME.error)
                    .add_modifier(Modifier::BOLD)
            } else if is_next {
                Style::default()
                    .fg(DEFAULT_THEME.secondary)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.comment)
            };

            let mut content = highlight_trace_line(line);
            if is_error {
                let error_style = Style::default()
                    .bg(DEFAULT_THEME.error)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD);
                for span in &mut content {
                    span.style = error_style;
                }
            } else if is_next {
                for span in &mut content {
                    span.style = span.style.bg(DEFAULT_THEME.current_line_bg);
                }
            }

            let mut spans = vec![
                Span::styled(marker, num_style),
                Span::styled(format!("{:4} ", line_num), num_style),
            ];
            spans.extend(content);
            Line::from(spans)
        })
        .collect();

    let paragraph = Paragraph::new(visible_lines).block(block);
    frame.render_widget(paragraph, area);
}
