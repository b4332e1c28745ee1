//! Wire types for the knowledge-base API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A file stored in a knowledge base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseFile {
    /// Stable identifier of the file
    pub uuid: String,

    /// Display name of the file
    #[serde(default)]
    pub file_name: String,

    /// File extension, when the server reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,

    /// Processing status, when the server reports one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl KnowledgeBaseFile {
    /// Create a file entry from an id and a name
    pub fn new(uuid: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            file_name: file_name.into(),
            extension: None,
            status: None,
        }
    }
}

/// Metadata attached to a retrieval hit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    /// Id of the file the chunk came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,

    /// Chunk text in the older flat result format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Any other metadata the server sends along
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One element of a structured result body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// Element kind; only `"text"` is displayed
    #[serde(rename = "type")]
    pub kind: String,

    /// Text of a `"text"` element
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl ContentItem {
    /// Create a text element
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: Some(text.into()),
        }
    }
}

/// A single ranked retrieval hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrieveResult {
    /// Stable key of the hit
    pub id: String,

    /// Similarity distance reported by the backend
    pub distance: f64,

    /// Hit metadata
    #[serde(default)]
    pub metadata: ResultMetadata,

    /// Structured body in the newer result format
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Vec<ContentItem>>,
}

/// Payload of the file listing endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilesResponse {
    /// Files of the knowledge base
    #[serde(default)]
    pub files: Vec<KnowledgeBaseFile>,
}

/// Payload of the retrieval endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrieveResponse {
    /// Ranked hits, in backend order
    #[serde(default)]
    pub results: Vec<RetrieveResult>,
}

/// Body of a retrieval request
#[derive(Debug, Clone, Serialize)]
pub struct RetrieveRequest<'a> {
    /// Text query
    pub query: &'a str,
}
