//! # Retrieval View Module
//!
//! Front-end-agnostic state for the "query a knowledge base" screen. Both the
//! terminal UI and the one-shot CLI commands drive the same `RetrieveView`.
//!
//! ## Key Components
//!
//! - `RetrieveView`: query, results, file list and loading flag, plus the
//!   `idle → loading → displayed | errored` transitions
//! - `Generation` / `Ticket`: tags requests so late responses are dropped
//! - `ResultCard`: a hit prepared for display

mod controller;
mod generation;

pub use controller::{FilesRequest, ResultCard, RetrievalRequest, RetrieveView, ViewStatus};
pub use generation::{Generation, Ticket};
