//! TUI application state management

use kasirise_core::{describe, list_agents, AgentDescriptor, AgentId, Conversation, Dispatcher, Turn};
use ratatui::style::Style;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;
use tui_textarea::TextArea;
use uuid::Uuid;

/// Maximum number of input history entries retained.
const MAX_HISTORY: usize = 50;

/// Which screen is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// Agent selection
    Select,
    /// Active chat session
    Session,
}

/// Result of an in-flight dispatch, tagged with the session it belongs to.
///
/// The tag is what makes switching agents mid-dispatch safe: a result whose
/// conversation id no longer matches the active session is discarded instead
/// of being appended to the wrong transcript.
pub struct DispatchOutcome {
    pub conversation_id: Uuid,
    pub turn: Turn,
}

/// Main application state.
pub struct App {
    pub screen: Screen,
    /// Selection cursor into the agent catalog.
    pub cursor: usize,
    /// Active session transcript (None on the selection screen).
    pub conversation: Option<Conversation>,
    pub textarea: TextArea<'static>,
    pub is_loading: bool,
    pub loading_tick: usize,
    pub scroll_offset: usize,
    pub should_quit: bool,
    /// Transient shell message (command feedback); never enters the transcript.
    pub notice: Option<String>,
    /// Previous input history for up/down navigation.
    input_history: Vec<String>,
    /// Current position in input history (None = new input).
    history_index: Option<usize>,
    dispatcher: Arc<Dispatcher>,
    /// Sender side lives in App so `submit_message` can clone it into spawned tasks.
    response_tx: mpsc::UnboundedSender<DispatchOutcome>,
    /// Receiver side polled each frame by the event loop.
    pub response_rx: mpsc::UnboundedReceiver<DispatchOutcome>,
}

impl App {
    pub fn new(dispatcher: Arc<Dispatcher>, initial_agent: Option<AgentId>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        let mut app = Self {
            screen: Screen::Select,
            cursor: 0,
            conversation: None,
            textarea: new_textarea("Type your message..."),
            is_loading: false,
            loading_tick: 0,
            scroll_offset: 0,
            should_quit: false,
            notice: None,
            input_history: Vec::new(),
            history_index: None,
            dispatcher,
            response_tx: tx,
            response_rx: rx,
        };

        if let Some(agent) = initial_agent {
            app.open_session(agent);
        }
        app
    }

    /// Descriptor of the active session's agent, if any.
    pub fn active_agent(&self) -> Option<&'static AgentDescriptor> {
        self.conversation.as_ref().map(|c| describe(c.agent()))
    }

    /// Model requests are sent to (for the status bar).
    pub fn model(&self) -> &str {
        self.dispatcher.model()
    }

    // ── selection screen ────────────────────────────────────────────────

    pub fn select_prev(&mut self) {
        let count = list_agents().len();
        self.cursor = (self.cursor + count - 1) % count;
    }

    pub fn select_next(&mut self) {
        self.cursor = (self.cursor + 1) % list_agents().len();
    }

    /// Open a session for the agent under the cursor.
    pub fn open_cursor_selection(&mut self) {
        let agent = list_agents()[self.cursor].id;
        self.open_session(agent);
    }

    /// Transition selection -> session, seeding the welcome turn.
    pub fn open_session(&mut self, agent: AgentId) {
        let descriptor = describe(agent);
        self.conversation = Some(Conversation::start(descriptor));
        self.screen = Screen::Session;
        self.textarea = new_textarea(descriptor.input_placeholder);
        self.is_loading = false;
        self.scroll_offset = 0;
        self.notice = None;
    }

    /// Transition session -> selection, discarding the transcript.
    ///
    /// An in-flight dispatch keeps running; its result is dropped later by
    /// the id check in `apply_outcome`.
    pub fn leave_session(&mut self) {
        self.conversation = None;
        self.screen = Screen::Select;
        self.is_loading = false;
        self.scroll_offset = 0;
        self.notice = None;
        self.textarea = new_textarea("Type your message...");
    }

    // ── input handling ──────────────────────────────────────────────────

    /// Returns true if the textarea is empty (single empty line).
    pub fn is_input_empty(&self) -> bool {
        self.textarea.lines().len() == 1 && self.textarea.lines()[0].is_empty()
    }

    /// Returns true if there are previous inputs in history.
    pub fn has_history(&self) -> bool {
        !self.input_history.is_empty()
    }

    /// Navigate to the previous entry in input history.
    pub fn history_up(&mut self) {
        if self.input_history.is_empty() {
            return;
        }
        let idx = match self.history_index {
            None => self.input_history.len() - 1,
            Some(0) => return,
            Some(i) => i - 1,
        };
        self.history_index = Some(idx);
        let text = self.input_history[idx].clone();
        self.textarea = TextArea::new(vec![text]);
        self.textarea.set_cursor_line_style(Style::default());
    }

    /// Navigate to the next entry in input history, or clear if at the end.
    pub fn history_down(&mut self) {
        match self.history_index {
            None => {}
            Some(i) if i >= self.input_history.len() - 1 => {
                self.history_index = None;
                self.reset_textarea();
            }
            Some(i) => {
                self.history_index = Some(i + 1);
                let text = self.input_history[i + 1].clone();
                self.textarea = TextArea::new(vec![text]);
                self.textarea.set_cursor_line_style(Style::default());
            }
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(1);
    }

    pub fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(1);
    }

    /// Scroll to the bottom of the transcript.
    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    fn reset_textarea(&mut self) {
        let placeholder = self
            .active_agent()
            .map(|a| a.input_placeholder)
            .unwrap_or("Type your message...");
        self.textarea = new_textarea(placeholder);
    }

    // ── submit ──────────────────────────────────────────────────────────

    /// Process typed input: either a `/command` or a chat message.
    pub fn submit(&mut self) {
        let text = self.textarea.lines().join("\n").trim().to_string();
        if text.is_empty() {
            return;
        }

        // Store in history (cap at MAX_HISTORY)
        self.input_history.push(text.clone());
        if self.input_history.len() > MAX_HISTORY {
            self.input_history.remove(0);
        }
        self.history_index = None;

        self.reset_textarea();

        if text.starts_with('/') {
            self.handle_command(&text);
        } else {
            self.submit_message(text);
        }
    }

    fn handle_command(&mut self, cmd: &str) {
        let parts: Vec<&str> = cmd.splitn(2, ' ').collect();
        match parts[0] {
            "/quit" | "/exit" => {
                self.should_quit = true;
            }
            "/back" => {
                self.leave_session();
            }
            "/help" => {
                self.notice = Some(
                    "/back leave session \u{00b7} /quit exit \u{00b7} \
                     \u{2191}/\u{2193} history or scroll \u{00b7} Esc back"
                        .to_string(),
                );
            }
            _ => {
                self.notice = Some(format!("Unknown command: {}", parts[0]));
            }
        }
    }

    /// Append the user turn and start the dispatch.
    ///
    /// At most one dispatch may be outstanding per session: while one is
    /// pending this is a no-op, so one user turn can never collect two
    /// answers and history order is preserved.
    pub fn submit_message(&mut self, text: String) {
        if self.is_loading {
            return;
        }
        let Some(conversation) = self.conversation.as_mut() else {
            return;
        };

        // Dispatch sees the transcript as it was before this message.
        let history = conversation.turns().to_vec();
        conversation.push_user(text.clone());

        let conversation_id = conversation.id();
        let agent = conversation.agent();
        self.is_loading = true;
        self.loading_tick = 0;
        self.notice = None;
        self.scroll_to_bottom();

        let dispatcher = self.dispatcher.clone();
        let tx = self.response_tx.clone();

        tokio::spawn(async move {
            let turn = dispatcher.dispatch(agent, &history, &text).await;
            let _ = tx.send(DispatchOutcome {
                conversation_id,
                turn,
            });
        });
    }

    /// Called every tick to drain incoming dispatch results.
    pub fn poll_responses(&mut self) {
        while let Ok(outcome) = self.response_rx.try_recv() {
            self.apply_outcome(outcome);
        }
    }

    /// Append a dispatch result to the session it belongs to, or drop it.
    fn apply_outcome(&mut self, outcome: DispatchOutcome) {
        match self.conversation.as_mut() {
            Some(conversation) if conversation.id() == outcome.conversation_id => {
                conversation.push_assistant(outcome.turn);
                self.is_loading = false;
                self.scroll_to_bottom();
            }
            _ => {
                debug!(
                    conversation_id = %outcome.conversation_id,
                    "discarding stale dispatch result"
                );
            }
        }
    }

    /// Advance the loading spinner animation counter.
    pub fn tick(&mut self) {
        if self.is_loading {
            self.loading_tick = self.loading_tick.wrapping_add(1);
        }
    }
}

/// Create a fresh TextArea with default styling.
fn new_textarea(placeholder: &str) -> TextArea<'static> {
    let mut ta = TextArea::default();
    ta.set_cursor_line_style(Style::default());
    ta.set_placeholder_text(placeholder.to_string());
    ta
}
