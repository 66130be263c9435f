use crate::core::{Action, ItemVerdict};
use crossterm::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
};
use unicode_width::UnicodeWidthChar;

pub struct ItemList {
    pub items: Vec<ItemVerdict>,
    pub state: ListState,
    viewport_size: usize,
}

impl ItemList {
    pub fn new(items: Vec<ItemVerdict>) -> Self {
        let mut state = ListState::default();
        if !items.is_empty() {
            state.select(Some(0));
        }

        Self {
            items,
            state,
            viewport_size: 0,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Up => {
                self.previous();
                true
            }
            KeyCode::Down => {
                self.next();
                true
            }
            KeyCode::Home => {
                self.go_home();
                true
            }
            KeyCode::End => {
                self.go_end();
                true
            }
            _ => false,
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> bool {
        match mouse.kind {
            MouseEventKind::ScrollUp => {
                self.previous();
                true
            }
            MouseEventKind::ScrollDown => {
                self.next();
                true
            }
            _ => false,
        }
    }

    pub fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }

        let i = match self.state.selected() {
            Some(i) => (i + 1) % self.items.len(),
            None => 0,
        };
        self.state.select(Some(i));
        self.adjust_offset();
    }

    pub fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }

        let i = match self.state.selected() {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
        self.adjust_offset();
    }

    fn go_home(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.state.select(Some(0));
        self.adjust_offset();
    }

    fn go_end(&mut self) {
        if self.items.is_empty() {
            return;
        }
        self.state.select(Some(self.items.len() - 1));
        self.adjust_offset();
    }

    pub fn get_selected(&self) -> Option<&ItemVerdict> {
        self.state.selected().and_then(|i| self.items.get(i))
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, focused: bool) {
        self.viewport_size = (area.height.saturating_sub(2) as usize).max(1);
        self.adjust_offset();

        // sequence + action columns take 11 cells
        let id_width = (area.width.saturating_sub(2) as usize).saturating_sub(11);

        let items: Vec<ListItem> = self
            .items
            .iter()
            .map(|item| {
                let (label, color) = match item.action {
                    Some(Action::Buy) => ("Buy", Color::Green),
                    Some(Action::Sell) => ("Sell", Color::Red),
                    Some(Action::Hold) => ("Hold", Color::Yellow),
                    None => ("?", Color::Gray),
                };

                ListItem::new(Line::from(vec![
                    Span::raw(format!("{:>3}. ", item.sequence)),
                    Span::styled(format!("{label:<5} "), Style::default().fg(color)),
                    Span::raw(truncate_to_width(item.item_id.as_str(), id_width)),
                ]))
            })
            .collect();

        let border = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(border)
                    .title("Videos"),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            );

        f.render_stateful_widget(list, area, &mut self.state);
    }

    fn adjust_offset(&mut self) {
        if self.items.is_empty() {
            *self.state.offset_mut() = 0;
            return;
        }

        let viewport = self.viewport_size.max(1);
        let max_index = self.items.len() - 1;
        let selected = self
            .state
            .selected()
            .map(|idx| idx.min(max_index))
            .unwrap_or(0);
        self.state.select(Some(selected));

        let max_offset = self.items.len().saturating_sub(viewport);
        let offset = self.state.offset().min(max_offset);
        *self.state.offset_mut() = offset;

        if selected < offset {
            *self.state.offset_mut() = selected;
        } else if selected >= offset + viewport {
            *self.state.offset_mut() = selected + 1 - viewport;
        }
    }
}

/// Cuts `text` to at most `width` terminal cells, marking the cut with `…`.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    let total: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}
