use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseEventKind};
use kbview::i18n::Catalog;
use kbview::notify::Toasts;
use kbview::view::{FilesRequest, RetrieveView};
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::warn;

use crate::tui::error::{Error, Result};
use crate::tui::event::{AppEvent, Event, EventHandler};

/// What the input field is editing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    #[default]
    Query,
    /// Ctrl-K prompt for another knowledge base id
    KnowledgeBase,
}

/// Application state
pub struct App {
    /// Retrieval state for the open knowledge base
    pub view: RetrieveView,
    /// Current input text
    pub input: String,
    /// What `input` is editing
    pub mode: InputMode,
    /// Query text put aside while the knowledge-base prompt is open
    stashed_query: String,
    /// Cursor position in the input field, in characters
    pub cursor_position: usize,
    /// Flag to indicate if the application should quit
    pub should_quit: bool,
    /// Error toasts
    pub toasts: Toasts,
    /// UI strings
    pub catalog: Catalog,
    /// Counter for spinner animation frames
    pub spinner_frame: usize,
    /// Current scroll position of the results pane
    pub scroll_position: usize,
    /// Event handler
    event_handler: EventHandler,
}

impl App {
    /// Create a new application state bound to the terminal
    pub fn new(kb_id: impl Into<String>, catalog: Catalog) -> Self {
        Self::with_handler(kb_id, catalog, EventHandler::new())
    }

    /// Create a new application state with a given event handler
    pub fn with_handler(
        kb_id: impl Into<String>,
        catalog: Catalog,
        event_handler: EventHandler,
    ) -> Self {
        Self {
            view: RetrieveView::new(kb_id),
            input: String::new(),
            mode: InputMode::Query,
            stashed_query: String::new(),
            cursor_position: 0,
            should_quit: false,
            toasts: Toasts::new(),
            catalog,
            spinner_frame: 0,
            scroll_position: 0,
            event_handler,
        }
    }

    /// Get the next event, applying it to the state first
    pub async fn next_event(&mut self) -> Option<Event> {
        let event = self.event_handler.next().await?;
        self.handle_event(&event);
        Some(event)
    }

    fn handle_event(&mut self, event: &Event) {
        let outcome = match event {
            Event::Terminal(term_event) => self.handle_terminal_event(term_event),
            Event::Tick => {
                self.tick();
                Ok(())
            }
            Event::App(AppEvent::Quit) => {
                self.should_quit = true;
                Ok(())
            }
            // Responses are applied by `apply_response`, which takes the payload
            Event::App(_) => Ok(()),
        };
        if let Err(e) = outcome {
            warn!("Error handling event: {}", e);
        }
    }

    /// Get the event sender
    pub fn event_sender(&self) -> mpsc::UnboundedSender<Event> {
        self.event_handler.sender()
    }

    fn send(&self, event: AppEvent) -> Result<()> {
        self.event_handler
            .sender()
            .send(Event::App(event))
            .map_err(|e| Error::Event(e.to_string()))
    }

    /// Handle terminal events
    fn handle_terminal_event(&mut self, event: &crossterm::event::Event) -> Result<()> {
        match event {
            crossterm::event::Event::Key(key) if key.kind != KeyEventKind::Release => {
                self.handle_key_event(*key)?
            }
            crossterm::event::Event::Mouse(mouse) => match mouse.kind {
                MouseEventKind::ScrollUp => self.scroll_by(-3),
                MouseEventKind::ScrollDown => self.scroll_by(3),
                _ => {}
            },
            crossterm::event::Event::Paste(text) => {
                for c in text.chars().filter(|c| !c.is_control()) {
                    self.insert_char(c);
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Apply a finished network call to the view
    pub fn apply_response(&mut self, event: AppEvent) {
        match event {
            AppEvent::FilesLoaded { ticket, result } => {
                self.view.finish_load_files(ticket, result);
            }
            AppEvent::RetrieveFinished { ticket, result } => {
                if self
                    .view
                    .finish_retrieve(ticket, result, &self.catalog, &mut self.toasts)
                {
                    self.scroll_position = 0;
                }
            }
            _ => {}
        }
    }

    /// Switch to another knowledge base, returning the file listing to run
    pub fn switch_knowledge_base(&mut self, kb_id: String) -> Option<FilesRequest> {
        let request = self.view.set_kb_id(kb_id)?;
        self.scroll_position = 0;
        Some(request)
    }

    fn open_kb_prompt(&mut self) {
        self.stashed_query = std::mem::replace(&mut self.input, self.view.kb_id().to_string());
        self.cursor_position = self.input.chars().count();
        self.mode = InputMode::KnowledgeBase;
    }

    fn close_kb_prompt(&mut self) {
        self.input = std::mem::take(&mut self.stashed_query);
        self.cursor_position = self.input.chars().count();
        self.mode = InputMode::Query;
    }

    /// Handle key events
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        if self.mode == InputMode::KnowledgeBase {
            match key.code {
                KeyCode::Esc => {
                    self.close_kb_prompt();
                    return Ok(());
                }
                KeyCode::Enter => {
                    let kb_id = self.input.trim().to_string();
                    self.close_kb_prompt();
                    if !kb_id.is_empty() {
                        self.send(AppEvent::SwitchKnowledgeBase(kb_id))?;
                    }
                    return Ok(());
                }
                _ => {}
            }
        }

        match key.code {
            KeyCode::Esc => self.send(AppEvent::Quit)?,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.send(AppEvent::Quit)?
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.send(AppEvent::ReloadFiles)?
            }
            KeyCode::Char('k') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if self.mode == InputMode::Query {
                    self.open_kb_prompt();
                }
            }
            KeyCode::Enter => {
                self.view.set_query(self.input.clone());
                if self.view.can_submit() {
                    self.send(AppEvent::Submit)?;
                }
            }
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete_char(),
            KeyCode::Left => self.move_cursor_left(),
            KeyCode::Right => self.move_cursor_right(),
            KeyCode::Home => self.cursor_position = 0,
            KeyCode::End => self.cursor_position = self.input.chars().count(),
            KeyCode::Up => self.scroll_by(-1),
            KeyCode::Down => self.scroll_by(1),
            KeyCode::PageUp => self.scroll_by(-10),
            KeyCode::PageDown => self.scroll_by(10),
            _ => {}
        }
        Ok(())
    }

    /// Byte offset of the cursor within `input`
    fn byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor_position)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    /// Move cursor left in the input field
    pub fn move_cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    /// Move cursor right in the input field
    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.input.chars().count() {
            self.cursor_position += 1;
        }
    }

    /// Insert character at cursor position
    pub fn insert_char(&mut self, c: char) {
        let index = self.byte_index();
        self.input.insert(index, c);
        self.cursor_position += 1;
    }

    /// Delete character at cursor position
    pub fn delete_char(&mut self) {
        if self.cursor_position < self.input.chars().count() {
            let index = self.byte_index();
            self.input.remove(index);
        }
    }

    /// Delete character before cursor position (backspace)
    pub fn backspace(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            let index = self.byte_index();
            self.input.remove(index);
        }
    }

    /// Scroll the results pane; the renderer clamps to the content height
    pub fn scroll_by(&mut self, delta: i32) {
        self.scroll_position = if delta < 0 {
            self.scroll_position.saturating_sub(delta.unsigned_abs() as usize)
        } else {
            self.scroll_position.saturating_add(delta as usize)
        };
    }

    /// Advance the spinner and drop expired toasts
    pub fn tick(&mut self) {
        if self.view.is_loading() {
            self.spinner_frame = (self.spinner_frame + 1) % 8;
        }
        self.toasts.expire(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::Event as CrosstermEvent;
    use kbview::Error as KbError;
    use kbview::knowledge::{ContentItem, ResultMetadata, RetrieveResult};

    fn app() -> App {
        App::with_handler("kb-1", Catalog::default(), EventHandler::detached())
    }

    fn key(code: KeyCode) -> Event {
        Event::Terminal(CrosstermEvent::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_event(&key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn test_editing_handles_multibyte_input() {
        let mut app = app();
        type_text(&mut app, "退款ab");
        app.handle_event(&key(KeyCode::Left));
        app.handle_event(&key(KeyCode::Left));
        app.handle_event(&key(KeyCode::Backspace));
        assert_eq!(app.input, "退ab");
        assert_eq!(app.cursor_position, 1);

        app.handle_event(&key(KeyCode::Delete));
        assert_eq!(app.input, "退b");
    }

    #[test]
    fn test_enter_with_blank_input_does_not_submit() {
        let mut app = app();
        type_text(&mut app, "   ");
        app.handle_event(&key(KeyCode::Enter));
        assert!(app.event_handler.try_next().is_none());
    }

    #[test]
    fn test_enter_submits_query() {
        let mut app = app();
        type_text(&mut app, "refund policy");
        app.handle_event(&key(KeyCode::Enter));

        assert!(matches!(
            app.event_handler.try_next(),
            Some(Event::App(AppEvent::Submit))
        ));
        assert_eq!(app.view.query(), "refund policy");
        // the query stays in the field after submitting
        assert_eq!(app.input, "refund policy");
    }

    #[test]
    fn test_failed_retrieval_raises_one_toast() {
        let mut app = app();
        type_text(&mut app, "q");
        app.view.set_query("q");
        let request = app.view.begin_retrieve().unwrap();

        app.apply_response(AppEvent::RetrieveFinished {
            ticket: request.ticket,
            result: Err(KbError::Other("offline".to_string())),
        });

        assert!(!app.view.is_loading());
        assert_eq!(app.toasts.visible().count(), 1);
    }

    #[test]
    fn test_new_results_reset_scroll() {
        let mut app = app();
        app.scroll_by(7);
        app.view.set_query("q");
        let request = app.view.begin_retrieve().unwrap();

        app.apply_response(AppEvent::RetrieveFinished {
            ticket: request.ticket,
            result: Ok(vec![RetrieveResult {
                id: "r1".to_string(),
                distance: 0.1,
                metadata: ResultMetadata::default(),
                content: Some(vec![ContentItem::text("hello")]),
            }]),
        });

        assert_eq!(app.scroll_position, 0);
        assert_eq!(app.view.results().len(), 1);
    }

    fn ctrl(c: char) -> Event {
        Event::Terminal(CrosstermEvent::Key(KeyEvent::new(
            KeyCode::Char(c),
            KeyModifiers::CONTROL,
        )))
    }

    #[test]
    fn test_kb_prompt_sends_switch_and_restores_query() {
        let mut app = app();
        type_text(&mut app, "refund");
        app.handle_event(&ctrl('k'));
        assert_eq!(app.mode, InputMode::KnowledgeBase);
        assert_eq!(app.input, "kb-1");

        for _ in 0.."kb-1".len() {
            app.handle_event(&key(KeyCode::Backspace));
        }
        type_text(&mut app, " kb-2 ");
        app.handle_event(&key(KeyCode::Enter));

        assert_eq!(app.mode, InputMode::Query);
        assert_eq!(app.input, "refund");
        assert_eq!(app.cursor_position, 6);
        match app.event_handler.try_next() {
            Some(Event::App(AppEvent::SwitchKnowledgeBase(kb_id))) => assert_eq!(kb_id, "kb-2"),
            other => panic!("expected a knowledge-base switch, got {:?}", other.is_some()),
        }
    }

    #[test]
    fn test_escape_in_kb_prompt_cancels_without_quitting() {
        let mut app = app();
        app.handle_event(&ctrl('k'));
        app.handle_event(&key(KeyCode::Esc));

        assert_eq!(app.mode, InputMode::Query);
        assert!(app.input.is_empty());
        assert!(app.event_handler.try_next().is_none());
        assert!(!app.should_quit);
    }

    #[test]
    fn test_switch_discards_in_flight_retrieval() {
        let mut app = app();
        app.view.set_query("q");
        let stale = app.view.begin_retrieve().unwrap();
        app.scroll_by(4);

        let files = app.switch_knowledge_base("kb-2".to_string()).unwrap();
        assert_eq!(files.kb_id, "kb-2");
        assert_eq!(app.view.kb_id(), "kb-2");
        assert_eq!(app.scroll_position, 0);
        assert!(!app.view.is_loading());

        app.apply_response(AppEvent::RetrieveFinished {
            ticket: stale.ticket,
            result: Err(KbError::Other("offline".to_string())),
        });
        assert_eq!(app.toasts.visible().count(), 0);

        // Same id again is a no-op
        assert!(app.switch_knowledge_base("kb-2".to_string()).is_none());
    }

    #[test]
    fn test_escape_requests_quit() {
        let mut app = app();
        app.handle_event(&key(KeyCode::Esc));
        let event = app.event_handler.try_next().unwrap();
        app.handle_event(&event);
        assert!(app.should_quit);
    }
}
