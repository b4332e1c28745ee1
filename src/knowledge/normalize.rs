//! # Result Normalization
//!
//! The retrieval endpoint has shipped two result shapes: an older one that
//! carries the chunk text in `metadata.text`, and a newer one with an ordered
//! `content` array of typed elements. Servers of either vintage are in the
//! wild, so every hit is folded into a `ResultBody` before display.
//!
//! Precedence is fixed: structured text elements win, the legacy metadata
//! field is the fallback, and an empty body is the last resort.

use super::types::RetrieveResult;

/// Separator placed between structured text elements
pub const TEXT_SEPARATOR: &str = "\n\n";

/// Content kind that carries displayable text
const TEXT_KIND: &str = "text";

/// Displayable body of a retrieval hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultBody {
    /// Text elements from the `content` array, in order
    Structured(Vec<String>),
    /// Text from `metadata.text`
    Legacy(String),
    /// Nothing displayable
    Empty,
}

impl ResultBody {
    /// Classify a result
    pub fn from_result(result: &RetrieveResult) -> Self {
        let parts: Vec<String> = result
            .content
            .iter()
            .flatten()
            .filter(|item| item.kind == TEXT_KIND)
            .filter_map(|item| item.text.as_deref())
            .filter(|text| !text.is_empty())
            .map(str::to_string)
            .collect();

        if !parts.is_empty() {
            return Self::Structured(parts);
        }

        match result.metadata.text.as_deref() {
            Some(text) if !text.is_empty() => Self::Legacy(text.to_string()),
            _ => Self::Empty,
        }
    }

    /// Render the body as a single string
    pub fn into_text(self) -> String {
        match self {
            Self::Structured(parts) => parts.join(TEXT_SEPARATOR),
            Self::Legacy(text) => text,
            Self::Empty => String::new(),
        }
    }
}

/// Best-available display text of a result
pub fn extract_text(result: &RetrieveResult) -> String {
    ResultBody::from_result(result).into_text()
}
