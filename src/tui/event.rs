use crossterm::event::Event as CrosstermEvent;
use futures::{FutureExt, StreamExt};
use kbview::knowledge::{KnowledgeBaseFile, RetrieveResult};
use kbview::prelude::Result;
use kbview::view::Ticket;
use std::time::Duration;
use tokio::sync::mpsc;

/// The frequency at which tick events are emitted
const TICK_FPS: f64 = 15.0;

/// Events that can occur in the application
#[derive(Debug)]
pub enum Event {
    /// Terminal events (key presses, mouse events, etc.)
    Terminal(CrosstermEvent),
    /// Regular tick for the spinner and toast expiry
    Tick,
    /// Application specific events
    App(AppEvent),
}

/// Application specific events
#[derive(Debug)]
pub enum AppEvent {
    /// Run a retrieval for the current query
    Submit,
    /// Re-fetch the file list of the current knowledge base
    ReloadFiles,
    /// Open another knowledge base
    SwitchKnowledgeBase(String),
    /// File listing finished
    FilesLoaded {
        ticket: Ticket,
        result: Result<Vec<KnowledgeBaseFile>>,
    },
    /// Retrieval finished
    RetrieveFinished {
        ticket: Ticket,
        result: Result<Vec<RetrieveResult>>,
    },
    /// Quit the application
    Quit,
}

/// Event handler that manages the event stream
pub struct EventHandler {
    /// Event sender
    sender: mpsc::UnboundedSender<Event>,
    /// Event receiver
    receiver: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    /// Create a new event handler reading from the terminal
    pub fn new() -> Self {
        let handler = Self::detached();
        let event_sender = handler.sender.clone();

        tokio::spawn(async move {
            let tick_rate = Duration::from_secs_f64(1.0 / TICK_FPS);
            let mut reader = crossterm::event::EventStream::new();
            let mut tick = tokio::time::interval(tick_rate);

            loop {
                let tick_delay = tick.tick();
                let crossterm_event = reader.next().fuse();

                tokio::select! {
                    _ = event_sender.closed() => {
                        break;
                    }
                    _ = tick_delay => {
                        let _ = event_sender.send(Event::Tick);
                    }
                    Some(Ok(evt)) = crossterm_event => {
                        let _ = event_sender.send(Event::Terminal(evt));
                    }
                }
            }
        });

        handler
    }

    /// Create a handler that only carries application events
    pub fn detached() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self { sender, receiver }
    }

    /// Get the event sender
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.sender.clone()
    }

    /// Get the next event
    pub async fn next(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    /// Get the next event if one is already queued
    #[cfg(test)]
    pub fn try_next(&mut self) -> Option<Event> {
        self.receiver.try_recv().ok()
    }
}
