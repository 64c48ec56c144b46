use ratatui::layout::Rect;
use ratatui::widgets::ListState;
use tokio::task::JoinHandle;

use crate::backend::{DocumentInfo, QueryResponse, RagClient, SourceRef};

/// Seed assistant turn; the transcript is never empty.
pub const GREETING: &str =
    "Hello! I'm your document assistant. Ask me a question about your ingested documents.";

/// Shown when the backend answers without usable text.
pub const FALLBACK_ANSWER: &str = "Sorry, I couldn't generate an answer.";

/// Shown when the request itself fails; the underlying error goes to the log.
pub const ERROR_ANSWER: &str =
    "Something went wrong while talking to the server. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub sources: Vec<SourceRef>,
    pub is_error: bool,
}

impl ChatMessage {
    pub fn user(content: String) -> Self {
        Self {
            role: ChatRole::User,
            content,
            sources: Vec::new(),
            is_error: false,
        }
    }

    pub fn assistant(content: String, sources: Vec<SourceRef>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content,
            sources,
            is_error: false,
        }
    }

    pub fn error(content: &str) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.to_string(),
            sources: Vec::new(),
            is_error: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Input,
    Transcript,
    Documents,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    // Conversation state
    pub messages: Vec<ChatMessage>,
    pub input: String,
    pub input_cursor: usize, // cursor position in input, in chars
    pub loading: bool,
    pub query_task: Option<JoinHandle<anyhow::Result<QueryResponse>>>,

    // Transcript viewport
    pub transcript_scroll: u16,
    pub transcript_height: u16, // inner height of the chat area
    pub transcript_width: u16,  // inner width, for wrap calculations

    // Ingested documents sidebar
    pub documents: Vec<DocumentInfo>,
    pub documents_task: Option<JoinHandle<anyhow::Result<Vec<DocumentInfo>>>>,
    pub documents_state: ListState,
    pub show_documents: bool,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub transcript_area: Option<Rect>,
    pub documents_area: Option<Rect>,

    pub client: RagClient,
}

impl App {
    pub fn new(client: RagClient) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            focus: FocusPane::Input,

            messages: vec![ChatMessage::assistant(GREETING.to_string(), Vec::new())],
            input: String::new(),
            input_cursor: 0,
            loading: false,
            query_task: None,

            transcript_scroll: 0,
            transcript_height: 0,
            transcript_width: 0,

            documents: Vec::new(),
            documents_task: None,
            documents_state: ListState::default(),
            show_documents: true,

            animation_frame: 0,

            transcript_area: None,
            documents_area: None,

            client,
        }
    }

    /// Kick off the one-shot document listing. Called once at startup; the
    /// result is applied by `poll_tasks` whenever it lands.
    pub fn start_document_fetch(&mut self) {
        let client = self.client.clone();
        self.documents_task = Some(tokio::spawn(async move { client.list_documents().await }));
    }

    /// Send the current input as a question. No-op while a request is in
    /// flight or when the trimmed input is empty.
    pub fn submit(&mut self) {
        let question = self.input.trim().to_string();
        if question.is_empty() || self.loading || self.query_task.is_some() {
            return;
        }

        self.messages.push(ChatMessage::user(question.clone()));
        self.input.clear();
        self.input_cursor = 0;
        self.loading = true;
        self.scroll_to_bottom();

        let client = self.client.clone();
        self.query_task = Some(tokio::spawn(async move { client.query(&question).await }));
    }

    /// Apply results of finished background tasks. Responses are consumed by
    /// value here, on the event loop, so a late reply can never race a newer
    /// transcript.
    pub async fn poll_tasks(&mut self) {
        if self.query_task.as_ref().is_some_and(|task| task.is_finished()) {
            if let Some(task) = self.query_task.take() {
                let result = match task.await {
                    Ok(result) => result,
                    Err(err) => Err(anyhow::anyhow!("query task failed: {err}")),
                };
                self.apply_query_result(result);
            }
        }

        if self.documents_task.as_ref().is_some_and(|task| task.is_finished()) {
            if let Some(task) = self.documents_task.take() {
                match task.await {
                    Ok(Ok(documents)) => {
                        tracing::info!("loaded {} ingested documents", documents.len());
                        self.documents = documents;
                        if !self.documents.is_empty() {
                            self.documents_state.select(Some(0));
                        }
                    }
                    // Not surfaced in the chat: the sidebar just stays empty.
                    Ok(Err(err)) => tracing::warn!("failed to fetch document list: {err:#}"),
                    Err(err) => tracing::warn!("document fetch task failed: {err}"),
                }
            }
        }
    }

    fn apply_query_result(&mut self, result: anyhow::Result<QueryResponse>) {
        match result {
            Ok(response) => {
                if let Some(error) = &response.error {
                    tracing::warn!("backend reported an error: {error}");
                }
                let content = if response.answer.trim().is_empty() {
                    FALLBACK_ANSWER.to_string()
                } else {
                    response.answer
                };
                self.messages
                    .push(ChatMessage::assistant(content, response.files_used));
            }
            Err(err) => {
                tracing::error!("query failed: {err:#}");
                self.messages.push(ChatMessage::error(ERROR_ANSWER));
            }
        }

        self.loading = false;
        self.scroll_to_bottom();
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Transcript scrolling. Line counts mirror what the render layer emits:
    // a role label, the wrapped content, an optional sources block, and a
    // blank separator per message, plus two lines for the loading indicator.
    fn transcript_lines(&self) -> u16 {
        let wrap_width = if self.transcript_width > 0 {
            self.transcript_width as usize
        } else {
            50
        };

        let mut total: u16 = 0;

        for message in &self.messages {
            total += 1; // role label
            for line in message.content.lines() {
                // Character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                if char_count == 0 {
                    total += 1;
                } else {
                    total += (char_count / wrap_width + 1) as u16;
                }
            }
            if !message.sources.is_empty() {
                total += 1 + message.sources.len() as u16;
            }
            total += 1; // blank line after message
        }

        if self.loading {
            total += 2; // label + "Thinking..."
        }

        total
    }

    /// Scroll so the newest message (or the loading indicator) is visible.
    pub fn scroll_to_bottom(&mut self) {
        let visible = if self.transcript_height > 0 {
            self.transcript_height
        } else {
            20
        };
        self.transcript_scroll = self.transcript_lines().saturating_sub(visible);
    }

    pub fn scroll_to_top(&mut self) {
        self.transcript_scroll = 0;
    }

    pub fn scroll_down(&mut self) {
        let max_scroll = self.transcript_lines().saturating_sub(self.transcript_height);
        if self.transcript_scroll < max_scroll {
            self.transcript_scroll = self.transcript_scroll.saturating_add(1);
        }
    }

    pub fn scroll_up(&mut self) {
        self.transcript_scroll = self.transcript_scroll.saturating_sub(1);
    }

    pub fn scroll_half_page_down(&mut self) {
        let half_page = self.transcript_height / 2;
        let max_scroll = self.transcript_lines().saturating_sub(self.transcript_height);
        self.transcript_scroll = (self.transcript_scroll + half_page).min(max_scroll);
    }

    pub fn scroll_half_page_up(&mut self) {
        let half_page = self.transcript_height / 2;
        self.transcript_scroll = self.transcript_scroll.saturating_sub(half_page);
    }

    // Documents sidebar
    pub fn toggle_documents(&mut self) {
        self.show_documents = !self.show_documents;
        if self.show_documents
            && self.documents_state.selected().is_none()
            && !self.documents.is_empty()
        {
            self.documents_state.select(Some(0));
        }
        if !self.show_documents && self.focus == FocusPane::Documents {
            self.focus = FocusPane::Transcript;
        }
    }

    pub fn documents_nav_down(&mut self) {
        let len = self.documents.len();
        if len > 0 {
            let i = self.documents_state.selected().unwrap_or(0);
            self.documents_state.select(Some((i + 1).min(len - 1)));
        }
    }

    pub fn documents_nav_up(&mut self) {
        let i = self.documents_state.selected().unwrap_or(0);
        self.documents_state.select(Some(i.saturating_sub(1)));
    }
}
