//! Stack pane rendering
//!
//! Shows the live operand stack grouped into frames by walking the saved base
//! pointer chain, with the return register and set hooks.
//!
//! # Layout
//!
//! ```text
//! return register: 7
//! ▸ Frame 1 │ bp 4
//!   [  3] 0        ◂ saved bp
//!   [  4] 7        ◂ hook 2
//! ```
//!
//! Slots below the first frame's link are listed under "Globals".

use super::utils::{follow_scroll, pane_block, value_span};
use crate::interpreter::engine::Machine;
use crate::memory::value::expect_index;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};

/// Scroll state for the stack pane
pub struct StackScrollState {
    pub offset: usize,
    pub prev_item_count: usize,
}

/// Data needed to render the stack pane
pub struct StackRenderData<'a> {
    pub machine: &'a Machine,
    /// Stack slot named by the failing op, if any
    pub error_index: Option<usize>,
}

/// Slot indices of the saved base pointers, innermost frame first
///
/// The walk stops at the first link that does not point strictly downwards,
/// so a corrupted chain still renders.
pub(crate) fn frame_links(machine: &Machine) -> Vec<usize> {
    let mut links = Vec::new();
    let mut bp = machine.base_pointer();
    while bp > 0 && bp <= machine.stack_pointer() {
        let link = bp - 1;
        links.push(link);
        let saved = machine
            .peek_at(link)
            .ok()
            .and_then(|v| expect_index(v, "frame_links").ok());
        match saved {
            Some(saved) if saved < bp => bp = saved,
            _ => break,
        }
    }
    links
}

/// Render the stack pane
pub fn render_stack_pane(
    frame: &mut Frame,
    area: Rect,
    data: StackRenderData,
    is_focused: bool,
    scroll_state: &mut StackScrollState,
) {
    let block = pane_block(" Operand Stack ", is_focused);
    let machine = data.machine;
    let stack = machine.stack();
    let mut all_items = Vec::new();

    all_items.push(ListItem::new(Line::from(vec![
        Span::styled(
            "return register: ",
            Style::default().fg(DEFAULT_THEME.return_value),
        ),
        value_span(machine.return_register()),
    ])));

    let header = format!(
        "sp {} / {} │ bp {} │ depth {}",
        stack.pointer(),
        stack.capacity(),
        machine.base_pointer(),
        machine.frame_depth()
    );
    all_items.push(ListItem::new(header).style(Style::default().fg(DEFAULT_THEME.comment)));

    if stack.is_empty() {
        all_items.push(ListItem::new("(empty)").style(Style::default().fg(DEFAULT_THEME.comment)));
    }

    // Outermost first, matching slot order
    let mut links = frame_links(machine);
    links.reverse();

    if links.first().map_or(!stack.is_empty(), |&first| first > 0) {
        all_items.push(ListItem::new(Line::from(Span::styled(
            "▸ Globals",
            Style::default()
                .fg(DEFAULT_THEME.function)
                .add_modifier(Modifier::BOLD),
        ))));
    }

    for (index, &value) in stack.live().iter().enumerate() {
        if let Some(depth) = links.iter().position(|&link| link == index) {
            all_items.push(ListItem::new(Line::from(vec![
                Span::styled("▸ ", Style::default().fg(DEFAULT_THEME.secondary)),
                Span::styled(
                    format!("Frame {} ", depth + 1),
                    Style::default().fg(DEFAULT_THEME.comment),
                ),
                Span::styled("│ ", Style::default().fg(DEFAULT_THEME.comment)),
                Span::styled(
                    format!("bp {}", index + 1),
                    Style::default()
                        .fg(DEFAULT_THEME.function)
                        .add_modifier(Modifier::BOLD),
                ),
            ])));
        }

        let index_style = if data.error_index == Some(index) {
            Style::default()
                .fg(DEFAULT_THEME.error)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(DEFAULT_THEME.comment)
        };

        let mut spans = vec![
            Span::styled(format!("  [{:4}] ", index), index_style),
            value_span(value),
        ];

        if links.contains(&index) {
            spans.push(Span::styled(
                "  ◂ saved bp",
                Style::default().fg(DEFAULT_THEME.muted_function),
            ));
        }
        // Hooks hold one-past references
        for (hook, _) in machine
            .hooks()
            .iter()
            .enumerate()
            .filter(|(_, r)| **r == Some(index + 1))
        {
            spans.push(Span::styled(
                format!("  ◂ hook {}", hook),
                Style::default().fg(DEFAULT_THEME.type_name),
            ));
        }

        all_items.push(ListItem::new(Line::from(spans)));
    }

    let total_items = all_items.len();
    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    scroll_state.offset = follow_scroll(
        scroll_state.offset,
        scroll_state.prev_item_count,
        total_items,
        visible_height,
    );
    scroll_state.prev_item_count = total_items;

    let visible_items: Vec<ListItem> = all_items
        .into_iter()
        .skip(scroll_state.offset)
        .take(visible_height)
        .collect();

    let list = List::new(visible_items).block(block);
    frame.render_widget(list, area);
}
