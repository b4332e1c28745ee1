//! # Knowledge Base Module
//!
//! Client-side model of a knowledge-base retrieval service: the wire types,
//! the HTTP-backed API, and the helpers that turn raw hits into something
//! displayable.
//!
//! ## Key Components
//!
//! - `KnowledgeBaseApi`: the two calls a retrieval view depends on
//! - `KnowledgeBaseClient`: HTTP implementation of that trait
//! - `ResultBody` / `extract_text`: folds both result formats into display text
//! - `FileIndex`: resolves file ids to file names

mod api;
mod files;
mod normalize;
mod types;

pub use api::{KnowledgeBaseApi, KnowledgeBaseClient};
pub use files::FileIndex;
pub use normalize::{ResultBody, TEXT_SEPARATOR, extract_text};
pub use types::{
    ContentItem, FilesResponse, KnowledgeBaseFile, ResultMetadata, RetrieveRequest,
    RetrieveResponse, RetrieveResult,
};
