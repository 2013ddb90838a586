//! Terminal User Interface for dbchat.
//!
//! Provides the main TUI application loop using ratatui and crossterm.

pub mod app;
mod events;
pub mod headless;
mod theme;
pub mod ui;
pub mod widgets;

pub use app::{App, Focus, InputState};
pub use events::{Event, EventHandler};

use crate::app::{ChatSession, UiEvent};
use crate::error::{ChatError, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::panic;
use tracing::{debug, info};

/// The main TUI application runner.
pub struct Tui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_handler: EventHandler,
}

impl Tui {
    /// Creates a new TUI instance, initializing the terminal.
    pub fn new() -> Result<Self> {
        let terminal = Self::setup_terminal()?;
        Ok(Self {
            terminal,
            event_handler: EventHandler::new(),
        })
    }

    /// Sets up the terminal for TUI rendering.
    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()
            .map_err(|e| ChatError::internal(format!("Failed to enable raw mode: {e}")))?;

        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)
            .map_err(|e| ChatError::internal(format!("Failed to enter alternate screen: {e}")))?;

        let backend = CrosstermBackend::new(stdout);
        Terminal::new(backend)
            .map_err(|e| ChatError::internal(format!("Failed to create terminal: {e}")))
    }

    /// Restores the terminal to its original state.
    fn restore_terminal(&mut self) -> Result<()> {
        disable_raw_mode()
            .map_err(|e| ChatError::internal(format!("Failed to disable raw mode: {e}")))?;

        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)
            .map_err(|e| ChatError::internal(format!("Failed to leave alternate screen: {e}")))?;

        self.terminal
            .show_cursor()
            .map_err(|e| ChatError::internal(format!("Failed to show cursor: {e}")))?;

        Ok(())
    }

    fn draw(&mut self, app: &App) -> Result<()> {
        self.terminal
            .draw(|frame| ui::render(frame, app))
            .map_err(|e| ChatError::internal(format!("Failed to draw: {e}")))?;
        Ok(())
    }

    /// Runs the main event loop until the user quits.
    pub async fn run(&mut self, session: ChatSession) -> Result<()> {
        // Set up panic hook to restore terminal on panic
        let original_hook = panic::take_hook();
        panic::set_hook(Box::new(move |panic_info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            original_hook(panic_info);
        }));

        let mut app = App::new(session);

        // First render cycle runs without a question
        app.dispatch(UiEvent::Refresh).await;

        let result = self.event_loop(&mut app).await;

        // Restore panic hook
        let _ = panic::take_hook();

        result
    }

    async fn event_loop(&mut self, app: &mut App) -> Result<()> {
        while app.running {
            self.draw(app)?;

            let key = match self.event_handler.next()? {
                Event::Key(key) => key,
                Event::Resize(width, height) => {
                    debug!("Terminal resized to {}x{}", width, height);
                    continue;
                }
                Event::Tick => continue,
            };

            let Some(event) = app.handle_key(key) else {
                continue;
            };

            if let Some(pending) = app.begin(event).await {
                // Question turn and thinking indicator stay up while the agent runs
                self.draw(app)?;
                app.finish(pending).await;
            }
        }

        info!("Exiting TUI");
        Ok(())
    }
}

impl Drop for Tui {
    fn drop(&mut self) {
        let _ = self.restore_terminal();
    }
}

/// Runs the interactive TUI for a chat session.
pub async fn run(session: ChatSession) -> Result<()> {
    let mut tui = Tui::new()?;
    tui.run(session).await
}
