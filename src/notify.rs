//! User-facing error notifications

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::warn;

/// How long a toast stays on screen
pub const TOAST_TTL: Duration = Duration::from_secs(4);

/// Most toasts kept at once; older ones are dropped first
const MAX_TOASTS: usize = 3;

/// Sink for messages the user should see
pub trait Notifier {
    /// Show an error message; fire-and-forget
    fn notify_error(&mut self, message: &str);
}

/// Notifier that only writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify_error(&mut self, message: &str) {
        warn!(target: "kbview::notify", "{}", message);
    }
}

/// A transient on-screen message
#[derive(Debug, Clone)]
pub struct Toast {
    pub message: String,
    pub raised_at: Instant,
}

/// Expiring toast queue, rendered by the terminal UI
#[derive(Debug, Default)]
pub struct Toasts {
    items: VecDeque<Toast>,
}

impl Toasts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toasts currently visible, oldest first
    pub fn visible(&self) -> impl Iterator<Item = &Toast> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop toasts older than `TOAST_TTL`
    pub fn expire(&mut self, now: Instant) {
        self.items
            .retain(|toast| now.saturating_duration_since(toast.raised_at) < TOAST_TTL);
    }

    fn push_at(&mut self, message: &str, raised_at: Instant) {
        if self.items.len() == MAX_TOASTS {
            self.items.pop_front();
        }
        self.items.push_back(Toast {
            message: message.to_string(),
            raised_at,
        });
    }
}

impl Notifier for Toasts {
    fn notify_error(&mut self, message: &str) {
        warn!(target: "kbview::notify", "{}", message);
        self.push_at(message, Instant::now());
    }
}
