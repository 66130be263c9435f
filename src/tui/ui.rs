use crate::core::Action;
use crate::tui::app::{App, AppState, Focus};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(1),    // Body
            Constraint::Length(3), // Help
        ])
        .split(f.area());

    draw_title(f, app, chunks[0]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(32), Constraint::Min(1)])
        .split(chunks[1]);

    app.item_list.render(f, body[0], app.focus == Focus::Items);

    app.viewer_height = body[1].height;
    app.viewer.render(f, body[1], app.focus == Focus::Viewer);

    let help = match app.state {
        AppState::Synthesis => "[Tab] Switch pane  [↑↓] Move/Scroll  [Enter] Open video reply  [q] Exit",
        AppState::ItemReply { .. } => "[Tab] Switch pane  [↑↓] Scroll  [Esc] Back to synthesis  [q] Exit",
    };
    let help = Paragraph::new(help)
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[2]);
}

fn draw_title(f: &mut Frame, app: &App, area: ratatui::layout::Rect) {
    let (label, color) = match app.recommendation {
        Some(Action::Buy) => ("BUY", Color::Green),
        Some(Action::Sell) => ("SELL", Color::Red),
        Some(Action::Hold) => ("HOLD", Color::Yellow),
        None => ("no recommendation", Color::Gray),
    };

    let analyzed = app.item_list.items.len();
    let mut spans = vec![
        Span::styled(
            format!("{} digest", app.topic),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "  {analyzed}/{} videos analyzed  ",
            app.discovered
        )),
        Span::styled(
            label,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
    ];
    if !app.skipped.is_empty() {
        spans.push(Span::styled(
            format!("  ({} without transcript)", app.skipped.len()),
            Style::default().fg(Color::DarkGray),
        ));
    }
    if !app.failed.is_empty() {
        spans.push(Span::styled(
            format!("  ({} failed)", app.failed.len()),
            Style::default().fg(Color::Red),
        ));
    }

    let title = Paragraph::new(Line::from(spans))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, area);
}
