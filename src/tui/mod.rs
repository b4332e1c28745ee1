//! # Terminal User Interface Module
//!
//! Interactive retrieval screen: a query field, the ranked result cards and
//! error toasts. Network calls run on spawned tasks and report back through
//! the event channel, so the event loop is the only place state changes.
//!
//! ## Key Components
//!
//! - `app`: application state and input handling
//! - `error`: error types specific to the TUI
//! - `event`: terminal, tick and application events
//! - `ui`: rendering

pub mod app;
pub mod error;
pub mod event;
pub mod ui;

use crossterm::{
    event::{DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use kbview::i18n::Catalog;
use kbview::knowledge::KnowledgeBaseApi;
use kbview::prelude::Result;
use kbview::view::{FilesRequest, RetrievalRequest};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use crate::tui::app::App;
use crate::tui::event::{AppEvent, Event};
use crate::tui::ui::draw;

type Tui = Terminal<CrosstermBackend<io::Stdout>>;

/// Run the TUI application
pub async fn run(kb_id: String, api: Arc<dyn KnowledgeBaseApi>, catalog: Catalog) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = event_loop(&mut terminal, kb_id, api, catalog).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    outcome
}

async fn event_loop(
    terminal: &mut Tui,
    kb_id: String,
    api: Arc<dyn KnowledgeBaseApi>,
    catalog: Catalog,
) -> Result<()> {
    let mut app = App::new(kb_id, catalog);
    let sender = app.event_sender();

    info!("Opening knowledge base {}", app.view.kb_id());
    spawn_file_listing(api.clone(), app.view.begin_load_files(), sender.clone());

    terminal.clear()?;

    while !app.should_quit {
        terminal.draw(|f| draw(f, &mut app))?;

        let Some(event) = app.next_event().await else {
            break;
        };
        match event {
            Event::App(AppEvent::Submit) => {
                if let Some(request) = app.view.begin_retrieve() {
                    spawn_retrieval(api.clone(), request, sender.clone());
                }
            }
            Event::App(AppEvent::ReloadFiles) => {
                spawn_file_listing(api.clone(), app.view.begin_load_files(), sender.clone());
            }
            Event::App(AppEvent::SwitchKnowledgeBase(kb_id)) => {
                if let Some(request) = app.switch_knowledge_base(kb_id) {
                    spawn_file_listing(api.clone(), request, sender.clone());
                }
            }
            Event::App(response @ (AppEvent::FilesLoaded { .. } | AppEvent::RetrieveFinished { .. })) => {
                app.apply_response(response);
            }
            _ => {} // Other events are handled by the App
        }
    }

    Ok(())
}

fn spawn_file_listing(
    api: Arc<dyn KnowledgeBaseApi>,
    request: FilesRequest,
    sender: UnboundedSender<Event>,
) {
    tokio::spawn(async move {
        let result = api.list_files(&request.kb_id).await;
        let _ = sender.send(Event::App(AppEvent::FilesLoaded {
            ticket: request.ticket,
            result,
        }));
    });
}

fn spawn_retrieval(
    api: Arc<dyn KnowledgeBaseApi>,
    request: RetrievalRequest,
    sender: UnboundedSender<Event>,
) {
    tokio::spawn(async move {
        let result = api.retrieve(&request.kb_id, &request.query).await;
        let _ = sender.send(Event::App(AppEvent::RetrieveFinished {
            ticket: request.ticket,
            result,
        }));
    });
}
