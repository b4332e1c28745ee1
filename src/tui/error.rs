use thiserror::Error;

/// Errors raised while handling terminal UI events
#[derive(Debug, Error)]
pub enum Error {
    /// The event channel was closed
    #[error("Event channel error: {0}")]
    Event(String),
}

pub type Result<T> = std::result::Result<T, Error>;
