//! Headless mode for scripted testing and automation.
//!
//! Runs the TUI against a `TestBackend`, executing scripted events through the
//! same key handling and session pipeline as the interactive loop, and
//! captures the final screen for verification.

mod events;
mod output;

pub use events::{Assertion, Comparison, Event, EventParser};
pub use output::{format_report, screen_text};

use crate::app::{ChatSession, Notice, UiEvent};
use crate::cli::{Cli, OutputFormat};
use crate::error::{ChatError, Result};
use crate::session::ChatTurn;
use crate::tui::app::App;
use crate::tui::ui;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use ratatui::Terminal;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Configuration for headless mode execution.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Screen width in columns.
    pub width: u16,
    /// Screen height in rows.
    pub height: u16,
    /// Output format.
    pub output_format: OutputFormat,
    /// Whether to stop on first assertion failure.
    pub fail_fast: bool,
    /// Path to write output (None = stdout).
    pub output_file: Option<PathBuf>,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            width: 100,
            height: 30,
            output_format: OutputFormat::Text,
            fail_fast: false,
            output_file: None,
        }
    }
}

impl HeadlessConfig {
    /// Creates a HeadlessConfig from CLI arguments.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let (width, height) = cli.parse_screen_size().map_err(ChatError::config)?;
        let output_format = cli.parse_output_format().map_err(ChatError::config)?;

        Ok(Self {
            width,
            height,
            output_format,
            fail_fast: cli.fail_fast,
            output_file: cli.output_file.clone(),
        })
    }
}

/// Result of headless execution.
#[derive(Debug)]
pub struct HeadlessResult {
    /// Final screen content as text.
    pub screen: String,
    /// Chat turns at the end of the run, greeting included.
    pub transcript: Vec<ChatTurn>,
    /// Notice left on screen, if any.
    pub notice: Option<Notice>,
    /// Number of events executed.
    pub events_executed: usize,
    /// Total execution duration.
    pub duration: Duration,
    /// Number of assertions passed.
    pub assertions_passed: usize,
    /// Number of assertions failed.
    pub assertions_failed: usize,
    /// Application state snapshot.
    pub state: HeadlessState,
}

/// Snapshot of application state for JSON output.
#[derive(Debug, Clone, serde::Serialize)]
pub struct HeadlessState {
    /// Current question box text.
    pub input_text: String,
    /// Focused widget name.
    pub focus: String,
    /// Selected database mode.
    pub mode: String,
    pub is_processing: bool,
    /// Number of chat turns, greeting included.
    pub turn_count: usize,
    /// Whether the app is still running.
    pub running: bool,
}

impl HeadlessState {
    fn from_app(app: &App) -> Self {
        Self {
            input_text: app.question.text.clone(),
            focus: app.focus.name().to_string(),
            mode: app.mode().as_str().to_string(),
            is_processing: app.is_processing,
            turn_count: app.session.history().len(),
            running: app.running,
        }
    }
}

/// Runs the TUI in headless mode.
pub struct HeadlessRunner {
    config: HeadlessConfig,
    terminal: Terminal<TestBackend>,
    app: App,
    events: Vec<Event>,
    assertions_passed: usize,
    assertions_failed: usize,
}

impl HeadlessRunner {
    /// Creates a new headless runner over a chat session.
    pub fn new(config: HeadlessConfig, session: ChatSession) -> Result<Self> {
        let backend = TestBackend::new(config.width, config.height);
        let terminal = Terminal::new(backend)
            .map_err(|e| ChatError::internal(format!("Failed to create test terminal: {e}")))?;

        Ok(Self {
            config,
            terminal,
            app: App::new(session),
            events: Vec::new(),
            assertions_passed: 0,
            assertions_failed: 0,
        })
    }

    /// Loads events from a string (comma-separated or newline-separated).
    pub fn load_events(&mut self, input: &str) -> Result<()> {
        self.events = EventParser::new().parse_all(input)?;
        Ok(())
    }

    /// Loads events from a script file, or stdin for "-".
    pub fn load_script(&mut self, path: &str) -> Result<()> {
        let content = if path == "-" {
            std::io::read_to_string(std::io::stdin())
                .map_err(|e| ChatError::internal(format!("Failed to read stdin: {e}")))?
        } else {
            std::fs::read_to_string(path)
                .map_err(|e| ChatError::internal(format!("Failed to read script file: {e}")))?
        };

        self.load_events(&content)
    }

    /// Runs the headless execution and returns the result.
    pub async fn run(mut self) -> Result<HeadlessResult> {
        let start_time = Instant::now();

        // Same first cycle as the interactive loop
        self.app.dispatch(UiEvent::Refresh).await;
        self.draw()?;

        let events = std::mem::take(&mut self.events);
        let mut events_executed = 0;

        for event in events {
            debug!(event = %event, "Executing headless event");

            match event {
                Event::Key(key) => self.press(key).await?,
                Event::Type(text) => {
                    for c in text.chars() {
                        self.press(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
                            .await?;
                    }
                }
                Event::Focus(focus) => {
                    if let Some(ui_event) = self.app.set_focus(focus) {
                        self.app.dispatch(ui_event).await;
                    }
                }
                Event::Wait(duration) => tokio::time::sleep(duration).await,
                Event::Resize(w, h) => {
                    self.terminal
                        .resize(Rect::new(0, 0, w, h))
                        .map_err(|e| ChatError::internal(format!("Resize failed: {e}")))?;
                }
                Event::Assert(assertion) => {
                    self.draw()?;
                    let screen = self.render_screen();
                    if assertion.check(&screen, &self.app) {
                        self.assertions_passed += 1;
                    } else {
                        warn!(assertion = ?assertion, "Assertion failed");
                        self.assertions_failed += 1;
                        if self.config.fail_fast {
                            events_executed += 1;
                            break;
                        }
                    }
                }
            }

            events_executed += 1;
            self.draw()?;

            if !self.app.running {
                break;
            }
        }

        self.draw()?;
        Ok(HeadlessResult {
            screen: self.render_screen(),
            transcript: self.app.session.history().turns().to_vec(),
            notice: self.app.notice.clone(),
            events_executed,
            duration: start_time.elapsed(),
            assertions_passed: self.assertions_passed,
            assertions_failed: self.assertions_failed,
            state: HeadlessState::from_app(&self.app),
        })
    }

    async fn press(&mut self, key: KeyEvent) -> Result<()> {
        let Some(ui_event) = self.app.handle_key(key) else {
            return Ok(());
        };
        if let Some(pending) = self.app.begin(ui_event).await {
            self.draw()?;
            self.app.finish(pending).await;
        }
        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        let app = &self.app;
        self.terminal
            .draw(|frame| ui::render(frame, app))
            .map_err(|e| ChatError::internal(format!("Failed to render: {e}")))?;
        Ok(())
    }

    /// Renders the current screen to a string.
    fn render_screen(&self) -> String {
        screen_text(self.terminal.backend().buffer())
    }
}

/// Runs headless mode from CLI arguments. Returns the process exit code.
pub async fn run_headless(cli: &Cli, session: ChatSession) -> Result<i32> {
    cli.validate_headless().map_err(ChatError::config)?;

    let config = HeadlessConfig::from_cli(cli)?;
    let mut runner = HeadlessRunner::new(config.clone(), session)?;

    if let Some(ref events_str) = cli.events {
        runner.load_events(events_str)?;
    } else if let Some(ref script_path) = cli.script {
        runner.load_script(script_path)?;
    }

    let result = runner.run().await?;
    let output_str = format_report(&result, config.output_format);

    if let Some(ref path) = config.output_file {
        std::fs::write(path, &output_str)
            .map_err(|e| ChatError::internal(format!("Failed to write output file: {e}")))?;
    } else {
        print!("{}", output_str);
    }

    // Return exit code based on assertions
    if result.assertions_failed > 0 {
        Ok(1)
    } else {
        Ok(0)
    }
}
