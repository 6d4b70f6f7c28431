//! Heap pane rendering with live allocations and hex dumps
//!
//! Each live allocation is listed with its address and size, followed by one
//! row per 4-byte slot: the raw little-endian bytes and the decoded value.
//! A usage line at the top shows allocated bytes, heap size and the longest
//! free run, which is what the next `allocate` can get at most.

use super::utils::{follow_scroll, pane_block, value_span};
use crate::memory::heap::Heap;
use crate::memory::value::SLOT_BYTES;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};

/// Scroll state for the heap pane
pub struct HeapScrollState {
    pub offset: usize,
    pub prev_item_count: usize,
}

/// Data needed to render the heap pane
pub struct HeapRenderData<'a> {
    pub heap: &'a Heap,
    /// Heap address named by the failing op, if any
    pub error_address: Option<usize>,
}

/// Render the heap pane
pub fn render_heap_pane(
    frame: &mut Frame,
    area: Rect,
    data: HeapRenderData,
    is_focused: bool,
    scroll_state: &mut HeapScrollState,
) {
    let block = pane_block(" Heap Memory ", is_focused);
    let heap = data.heap;
    let mut all_items = Vec::new();

    all_items.push(
        ListItem::new(format!(
            "used {} / {} bytes │ largest free {}",
            heap.allocated_bytes(),
            heap.size(),
            heap.largest_free_run()
        ))
        .style(Style::default().fg(DEFAULT_THEME.comment)),
    );

    let allocations = heap.allocations();
    if allocations.is_empty() {
        all_items.push(
            ListItem::new("(no allocations)").style(Style::default().fg(DEFAULT_THEME.comment)),
        );
    }

    for (addr, size) in allocations {
        let contains_error = data
            .error_address
            .is_some_and(|e| e >= addr && e < addr + size);
        let addr_style = if contains_error {
            Style::default()
                .fg(DEFAULT_THEME.error)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(DEFAULT_THEME.comment)
        };

        all_items.push(ListItem::new(Line::from(vec![
            Span::styled(format!("0x{:08x}", addr), addr_style),
            Span::raw(" | "),
            Span::styled(
                format!("{} bytes ({} slots)", size, size / SLOT_BYTES),
                Style::default().fg(DEFAULT_THEME.primary),
            ),
        ])));

        for slot_addr in (addr..addr + size).step_by(SLOT_BYTES) {
            let mut hex_part = format!("  0x{:08x}: ", slot_addr);
            match heap.read_bytes(slot_addr, SLOT_BYTES) {
                Ok(bytes) => {
                    for b in bytes {
                        hex_part.push_str(&format!("{:02x} ", b));
                    }
                }
                Err(_) => hex_part.push_str("?? ?? ?? ?? "),
            }

            let mut spans = vec![Span::styled(
                hex_part,
                Style::default().fg(DEFAULT_THEME.comment),
            )];
            if let Ok(value) = heap.read_slot(slot_addr) {
                spans.push(Span::styled("→ ", Style::default().fg(DEFAULT_THEME.comment)));
                spans.push(value_span(value));
            }
            all_items.push(ListItem::new(Line::from(spans)));
        }
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
