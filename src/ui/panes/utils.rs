//! Helpers shared by the panes

use crate::memory::value::Value;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, Borders},
};

/// Bordered pane block, highlighted when focused
pub(crate) fn pane_block(title: &str, is_focused: bool) -> Block<'_> {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style)
}

/// Values that hold an integer print without a fraction
pub(crate) fn format_value(value: Value) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e9 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

pub(crate) fn value_span(value: Value) -> Span<'static> {
    Span::styled(format_value(value), Style::default().fg(DEFAULT_THEME.number))
}

/// Scroll offset after a re-render with `total_items` rows
///
/// Growing content follows the bottom; otherwise the user's position is kept
/// and clamped.
pub(crate) fn follow_scroll(
    offset: usize,
    prev_item_count: usize,
    total_items: usize,
    visible_height: usize,
) -> usize {
    let max_scroll = total_items.saturating_sub(visible_height);
    if total_items > prev_item_count {
        max_scroll
    } else {
        offset.min(max_scroll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(42.0), "42");
        assert_eq!(format_value(-3.0), "-3");
        assert_eq!(format_value(2.5), "2.5");
    }

    #[test]
    fn test_follow_scroll() {
        // Content grew: jump to the bottom
        assert_eq!(follow_scroll(0, 5, 20, 10), 10);
        // Content shrank: clamp
        assert_eq!(follow_scroll(15, 20, 12, 10), 2);
        // Fits on screen
        assert_eq!(follow_scroll(3, 4, 4, 10), 0);
    }
}
