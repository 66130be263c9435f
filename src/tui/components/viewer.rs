use crossterm::event::{KeyCode, KeyEvent};
use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

pub struct ContentViewer {
    pub lines: Vec<Line<'static>>,
    pub scroll: usize,
    pub title: String,
}

impl ContentViewer {
    pub fn new(content: &str, title: impl Into<String>) -> Self {
        Self {
            lines: markdown_lines(content),
            scroll: 0,
            title: title.into(),
        }
    }

    pub fn set_content(&mut self, content: &str, title: impl Into<String>) {
        self.lines = markdown_lines(content);
        self.title = title.into();
        self.scroll = 0;
    }

    fn max_scroll(&self, area_height: usize) -> usize {
        self.lines.len().saturating_sub(area_height.saturating_sub(2))
    }

    pub fn scroll_up(&mut self, by: usize) {
        self.scroll = self.scroll.saturating_sub(by);
    }

    pub fn scroll_down(&mut self, by: usize, area_height: usize) {
        self.scroll = (self.scroll + by).min(self.max_scroll(area_height));
    }

    pub fn handle_key(&mut self, key: KeyEvent, area_height: usize) -> bool {
        let page_size = area_height.saturating_sub(2).max(1);
        match key.code {
            KeyCode::Up => {
                self.scroll_up(1);
                true
            }
            KeyCode::Down => {
                self.scroll_down(1, area_height);
                true
            }
            KeyCode::PageUp => {
                self.scroll_up(page_size);
                true
            }
            KeyCode::PageDown => {
                self.scroll_down(page_size, area_height);
                true
            }
            KeyCode::Home => {
                self.scroll = 0;
                true
            }
            KeyCode::End => {
                self.scroll = self.max_scroll(area_height);
                true
            }
            _ => false,
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect, focused: bool) {
        let total_lines = self.lines.len();
        let visible_lines = area.height.saturating_sub(2) as usize;
        let scroll_info = if total_lines > visible_lines {
            format!(
                " (lines {}-{} of {})",
                self.scroll + 1,
                (self.scroll + visible_lines).min(total_lines),
                total_lines
            )
        } else {
            String::new()
        };

        let border = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(format!("{}{scroll_info}", self.title));

        let paragraph = Paragraph::new(self.lines.clone())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll.min(u16::MAX as usize) as u16, 0));

        f.render_widget(paragraph, area);
    }
}

/// Turns model markdown into styled terminal lines.
pub fn markdown_lines(source: &str) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    let mut style = Style::default();
    let mut list_depth: usize = 0;

    let flush = |current: &mut Vec<Span<'static>>, lines: &mut Vec<Line<'static>>| {
        if !current.is_empty() {
            lines.push(Line::from(std::mem::take(current)));
        }
    };

    for event in Parser::new(source) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                style = match level {
                    HeadingLevel::H1 | HeadingLevel::H2 => Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                    _ => Style::default().fg(Color::Yellow),
                };
            }
            Event::End(TagEnd::Heading(_)) => {
                flush(&mut current, &mut lines);
                lines.push(Line::default());
                style = Style::default();
            }
            Event::Start(Tag::Strong) => style = style.add_modifier(Modifier::BOLD),
            Event::End(TagEnd::Strong) => style = style.remove_modifier(Modifier::BOLD),
            Event::Start(Tag::Emphasis) => style = style.add_modifier(Modifier::ITALIC),
            Event::End(TagEnd::Emphasis) => style = style.remove_modifier(Modifier::ITALIC),
            Event::Start(Tag::List(_)) => {
                flush(&mut current, &mut lines);
                list_depth += 1;
            }
            Event::End(TagEnd::List(_)) => {
                list_depth = list_depth.saturating_sub(1);
                if list_depth == 0 {
                    lines.push(Line::default());
                }
            }
            Event::Start(Tag::Item) => {
                let indent = "  ".repeat(list_depth.saturating_sub(1));
                current.push(Span::styled(
                    format!("{indent}• "),
                    Style::default().fg(Color::Green),
                ));
            }
            Event::End(TagEnd::Item) => flush(&mut current, &mut lines),
            Event::End(TagEnd::Paragraph) => {
                flush(&mut current, &mut lines);
                if list_depth == 0 {
                    lines.push(Line::default());
                }
            }
            Event::Text(text) => current.push(Span::styled(text.into_string(), style)),
            Event::Code(code) => current.push(Span::styled(
                code.into_string(),
                style.fg(Color::Cyan),
            )),
            Event::SoftBreak | Event::HardBreak => flush(&mut current, &mut lines),
            Event::Rule => {
                flush(&mut current, &mut lines);
                lines.push(Line::from(Span::styled(
                    "─".repeat(40),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            _ => {}
        }
    }
    flush(&mut current, &mut lines);

    while lines.last().is_some_and(|line| line.spans.is_empty()) {
        lines.pop();
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: &[Line<'static>]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn renders_headings_lists_and_breaks() {
        let lines = markdown_lines("## Summary\nXRP is up.\nVolume too.\n\n- Video 1 - **Buy**\n- Video 2 - Hold\n\nHold");
        assert_eq!(
            plain(&lines),
            [
                "Summary",
                "",
                "XRP is up.",
                "Volume too.",
                "",
                "• Video 1 - Buy",
                "• Video 2 - Hold",
                "",
                "Hold",
            ]
        );
        let buy = lines[5]
            .spans
            .iter()
            .find(|span| span.content == "Buy")
            .expect("bold span");
        assert!(buy.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn scrolling_is_clamped() {
        let text = (0..30).map(|i| format!("line {i}\n\n")).collect::<String>();
        let mut viewer = ContentViewer::new(&text, "t");
        viewer.scroll_down(1000, 12);
        assert_eq!(viewer.scroll, viewer.lines.len() - 10);
        viewer.scroll_up(1000);
        assert_eq!(viewer.scroll, 0);
    }
}
