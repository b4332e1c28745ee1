//! # kbview - Knowledge Base Retrieval Client
//!
//! This crate provides a client for knowledge-base retrieval services: send a
//! text query, get back ranked text snippets with a similarity distance and
//! the file they came from.
//!
//! ## Features
//!
//! - HTTP client with bearer auth, response-envelope handling and
//!   rate-limit retries
//! - Normalization of both the structured and the legacy result formats
//! - File id to file name resolution
//! - A front-end-agnostic view controller that discards stale responses
//! - Localized user-facing strings (English, Simplified Chinese, Japanese)
//!
//! ## Example
//!
//! ```rust,no_run
//! use kbview::i18n::Catalog;
//! use kbview::knowledge::KnowledgeBaseClient;
//! use kbview::notify::LogNotifier;
//! use kbview::view::RetrieveView;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = KnowledgeBaseClient::from_env()?;
//!     let mut view = RetrieveView::new("my-kb-id");
//!     view.load_files_with(&client).await;
//!
//!     view.set_query("refund policy");
//!     view.retrieve_with(&client, &Catalog::default(), &mut LogNotifier).await;
//!
//!     for card in view.cards() {
//!         println!("{} ({}): {}", card.title, card.distance, card.body);
//!     }
//!     Ok(())
//! }
//! ```

mod error;

pub mod config;
pub mod http;
pub mod i18n;
pub mod knowledge;
pub mod notify;
pub mod render;
pub mod view;

pub use error::Error;

/// Re-export of types module for public use
pub mod prelude {
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::i18n::Translator;
    pub use crate::knowledge::KnowledgeBaseApi;
    pub use crate::notify::Notifier;
}
