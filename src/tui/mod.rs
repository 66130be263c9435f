pub mod app;
pub mod components;
pub mod events;
pub mod ui;

use crate::core::Digest;
use crate::error::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;

pub use app::App;
pub use events::EventHandler;

pub type Tui = Terminal<CrosstermBackend<io::Stdout>>;

pub fn init() -> Result<Tui> {
    execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;
    enable_raw_mode()?;

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    Ok(terminal)
}

pub fn restore() -> Result<()> {
    execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
    disable_raw_mode()?;
    Ok(())
}

/// Shows a finished digest until the user quits.
pub fn view(digest: &Digest) -> Result<()> {
    let mut terminal = init()?;
    let result = event_loop(&mut terminal, App::new(digest));
    restore()?;
    result
}

fn event_loop(terminal: &mut Tui, mut app: App) -> Result<()> {
    let event_handler = EventHandler::new();

    loop {
        terminal.draw(|f| {
            ui::draw(f, &mut app);
        })?;

        let event = event_handler.next_event()?;
        app.handle_event(event);

        if app.should_quit {
            return Ok(());
        }
    }
}
