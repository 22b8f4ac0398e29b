//! TUI chat interface for KasiRise Scholar
//!
//! Provides a full-screen terminal UI using ratatui + crossterm: an agent
//! selection screen and a per-session transcript screen.

pub mod app;
pub mod event;
pub mod ui;

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use kasirise_core::{AgentId, Dispatcher};
use kasirise_llm::{GeminiProvider, LlmProvider};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use app::App;

/// Run the TUI chat interface.
pub async fn run(initial_agent: Option<AgentId>, model: Option<String>) -> Result<()> {
    // ── Dispatcher bootstrap ───────────────────────────────────────

    let provider: Arc<dyn LlmProvider> = Arc::new(
        GeminiProvider::from_env()
            .context("Gemini is not configured. Set GEMINI_API_KEY (or GOOGLE_API_KEY).")?,
    );

    let mut dispatcher = Dispatcher::new(provider);
    if let Some(model) = model {
        dispatcher = dispatcher.with_model(model);
    }
    info!("TUI: model = {}", dispatcher.model());

    // ── Terminal setup ─────────────────────────────────────────────

    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("Failed to enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let mut app = App::new(Arc::new(dispatcher), initial_agent);

    // ── Main loop ──────────────────────────────────────────────────

    let tick_rate = Duration::from_millis(200);

    let run_result: Result<()> = loop {
        terminal.draw(|frame| ui::draw(frame, &app))?;

        if let Err(e) = event::handle_events(&mut app, tick_rate) {
            break Err(e);
        }

        if app.should_quit {
            break Ok(());
        }
    };

    // ── Restore terminal ───────────────────────────────────────────

    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    run_result
}
