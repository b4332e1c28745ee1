//! Retrieval view state and its transitions

use serde::Serialize;
use tracing::{debug, error, info};

use super::generation::{Generation, Ticket};
use crate::error::Result;
use crate::i18n::{Translator, keys};
use crate::knowledge::{
    FileIndex, KnowledgeBaseApi, KnowledgeBaseFile, RetrieveResult, extract_text,
};
use crate::notify::Notifier;

/// A file listing the caller should perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesRequest {
    pub ticket: Ticket,
    pub kb_id: String,
}

/// A retrieval the caller should perform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalRequest {
    pub ticket: Ticket,
    pub kb_id: String,
    pub query: String,
}

/// What the results area should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewStatus {
    /// A retrieval is in flight
    Loading,
    /// Nothing to show
    Empty,
    /// This many results are on display
    Showing(usize),
}

/// A retrieval hit prepared for display
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultCard {
    pub id: String,
    /// Resolved file name, or the raw file id
    pub title: String,
    /// Distance with four decimals
    pub distance: String,
    pub body: String,
}

impl ResultCard {
    fn build(result: &RetrieveResult, files: &FileIndex) -> Self {
        Self {
            id: result.id.clone(),
            title: files.file_name(result.metadata.file_id.as_deref()),
            distance: format!("{:.4}", result.distance),
            body: extract_text(result),
        }
    }
}

/// State of the retrieval view for one knowledge base.
///
/// Network calls are split into `begin_*` (issue a ticket, update state) and
/// `finish_*` (apply the response if its ticket is still current), so an
/// event loop can run the calls elsewhere and feed results back. The
/// `*_with` helpers do both halves inline.
#[derive(Debug)]
pub struct RetrieveView {
    kb_id: String,
    query: String,
    results: Vec<RetrieveResult>,
    files: FileIndex,
    loading: bool,
    files_generation: Generation,
    retrieve_generation: Generation,
}

impl RetrieveView {
    pub fn new(kb_id: impl Into<String>) -> Self {
        Self {
            kb_id: kb_id.into(),
            query: String::new(),
            results: Vec::new(),
            files: FileIndex::default(),
            loading: false,
            files_generation: Generation::new(),
            retrieve_generation: Generation::new(),
        }
    }

    pub fn kb_id(&self) -> &str {
        &self.kb_id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn results(&self) -> &[RetrieveResult] {
        &self.results
    }

    pub fn files(&self) -> &FileIndex {
        &self.files
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether submitting now would issue a retrieval
    pub fn can_submit(&self) -> bool {
        !self.loading && !self.query.trim().is_empty()
    }

    pub fn status(&self) -> ViewStatus {
        if self.loading {
            ViewStatus::Loading
        } else if self.results.is_empty() {
            ViewStatus::Empty
        } else {
            ViewStatus::Showing(self.results.len())
        }
    }

    /// Results projected for display, in backend order
    pub fn cards(&self) -> Vec<ResultCard> {
        self.results
            .iter()
            .map(|r| ResultCard::build(r, &self.files))
            .collect()
    }

    /// Switch to another knowledge base.
    ///
    /// Any in-flight retrieval becomes stale and the current results are
    /// dropped. Returns the file listing to run, or `None` if the id did not
    /// change.
    pub fn set_kb_id(&mut self, kb_id: impl Into<String>) -> Option<FilesRequest> {
        let kb_id = kb_id.into();
        if kb_id == self.kb_id {
            return None;
        }
        info!("Switching knowledge base from {} to {}", self.kb_id, kb_id);
        self.kb_id = kb_id;
        self.retrieve_generation.invalidate();
        self.loading = false;
        self.results.clear();
        Some(self.begin_load_files())
    }

    /// Issue a file listing for the current knowledge base
    pub fn begin_load_files(&mut self) -> FilesRequest {
        FilesRequest {
            ticket: self.files_generation.issue(),
            kb_id: self.kb_id.clone(),
        }
    }

    /// Apply a file listing response; returns whether it was applied.
    ///
    /// Failures are logged and leave the previous file list in place.
    pub fn finish_load_files(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<KnowledgeBaseFile>>,
    ) -> bool {
        if !self.files_generation.is_current(ticket) {
            debug!("Discarding stale file listing (ticket {})", ticket.value());
            return false;
        }
        match result {
            Ok(files) => {
                debug!("Loaded {} files", files.len());
                self.files = FileIndex::new(files);
                true
            }
            Err(e) => {
                error!("Failed to load files: {}", e);
                false
            }
        }
    }

    /// Start a retrieval for the current query.
    ///
    /// Returns `None` without touching state when the query is blank or a
    /// retrieval is already in flight. Otherwise clears the results and
    /// enters the loading state.
    pub fn begin_retrieve(&mut self) -> Option<RetrievalRequest> {
        let query = self.query.trim();
        if query.is_empty() || self.loading {
            return None;
        }
        let request = RetrievalRequest {
            ticket: self.retrieve_generation.issue(),
            kb_id: self.kb_id.clone(),
            query: query.to_string(),
        };
        self.loading = true;
        self.results.clear();
        Some(request)
    }

    /// Apply a retrieval response; returns whether it was applied.
    ///
    /// A failure sends one localized notification. Loading is cleared either
    /// way; stale responses change nothing.
    pub fn finish_retrieve(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<RetrieveResult>>,
        translator: &dyn Translator,
        notifier: &mut dyn Notifier,
    ) -> bool {
        if !self.retrieve_generation.is_current(ticket) {
            debug!("Discarding stale retrieval (ticket {})", ticket.value());
            return false;
        }
        self.loading = false;
        match result {
            Ok(results) => {
                debug!("Retrieved {} results", results.len());
                self.results = results;
            }
            Err(e) => {
                error!("Retrieve failed: {}", e);
                notifier.notify_error(&translator.translate(keys::RETRIEVE_ERROR));
            }
        }
        true
    }

    /// Load the file list through `api`
    pub async fn load_files_with<A: KnowledgeBaseApi + ?Sized>(&mut self, api: &A) -> bool {
        let request = self.begin_load_files();
        let result = api.list_files(&request.kb_id).await;
        self.finish_load_files(request.ticket, result)
    }

    /// Run a retrieval through `api`; returns whether one was issued
    pub async fn retrieve_with<A: KnowledgeBaseApi + ?Sized>(
        &mut self,
        api: &A,
        translator: &dyn Translator,
        notifier: &mut dyn Notifier,
    ) -> bool {
        let Some(request) = self.begin_retrieve() else {
            return false;
        };
        let result = api.retrieve(&request.kb_id, &request.query).await;
        self.finish_retrieve(request.ticket, result, translator, notifier);
        true
    }
}
