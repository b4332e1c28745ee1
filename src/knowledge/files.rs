//! File-name lookup for retrieval hits

use super::types::KnowledgeBaseFile;

/// Snapshot of a knowledge base's file list
#[derive(Debug, Clone, Default)]
pub struct FileIndex {
    files: Vec<KnowledgeBaseFile>,
}

impl FileIndex {
    /// Wrap a file list
    pub fn new(files: Vec<KnowledgeBaseFile>) -> Self {
        Self { files }
    }

    /// Files in server order
    pub fn files(&self) -> &[KnowledgeBaseFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Display name for a file id.
    ///
    /// No id yields an empty string; an unknown id (or a file with an empty
    /// name) yields the id itself.
    pub fn file_name(&self, file_id: Option<&str>) -> String {
        let Some(file_id) = file_id.filter(|id| !id.is_empty()) else {
            return String::new();
        };

        self.files
            .iter()
            .find(|f| f.uuid == file_id)
            .map(|f| f.file_name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(file_id)
            .to_string()
    }
}

impl From<Vec<KnowledgeBaseFile>> for FileIndex {
    fn from(files: Vec<KnowledgeBaseFile>) -> Self {
        Self::new(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> FileIndex {
        FileIndex::new(vec![
            KnowledgeBaseFile::new("f1", "policy.pdf"),
            KnowledgeBaseFile::new("f2", "handbook.md"),
            KnowledgeBaseFile::new("f3", ""),
        ])
    }

    #[test]
    fn test_missing_id_is_empty() {
        assert_eq!(index().file_name(None), "");
        assert_eq!(index().file_name(Some("")), "");
    }

    #[test]
    fn test_known_id_resolves_to_name() {
        assert_eq!(index().file_name(Some("f1")), "policy.pdf");
        assert_eq!(index().file_name(Some("f2")), "handbook.md");
    }

    #[test]
    fn test_unknown_id_passes_through() {
        assert_eq!(index().file_name(Some("f9")), "f9");
        assert_eq!(FileIndex::default().file_name(Some("f1")), "f1");
    }

    #[test]
    fn test_nameless_file_falls_back_to_id() {
        assert_eq!(index().file_name(Some("f3")), "f3");
    }
}
