//! Knowledge-base API client

use async_trait::async_trait;
use tracing::{debug, instrument};

use super::types::{
    FilesResponse, KnowledgeBaseFile, RetrieveRequest, RetrieveResponse, RetrieveResult,
};
use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::http::HttpClient;

/// Operations the retrieval view needs from a knowledge-base service
#[async_trait]
pub trait KnowledgeBaseApi: Send + Sync {
    /// List the files stored in a knowledge base
    async fn list_files(&self, kb_id: &str) -> Result<Vec<KnowledgeBaseFile>>;

    /// Run a retrieval query against a knowledge base
    async fn retrieve(&self, kb_id: &str, query: &str) -> Result<Vec<RetrieveResult>>;
}

/// HTTP implementation of `KnowledgeBaseApi`
#[derive(Clone)]
pub struct KnowledgeBaseClient {
    http: HttpClient,
}

impl KnowledgeBaseClient {
    /// Create a client from a resolved configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            http: HttpClient::new(config)?,
        })
    }

    /// Create a client configured from the environment
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Wrap an existing HTTP client
    pub fn with_http(http: HttpClient) -> Self {
        Self { http }
    }

    /// Underlying HTTP client
    pub fn http(&self) -> &HttpClient {
        &self.http
    }
}

fn require_kb_id(kb_id: &str) -> Result<()> {
    if kb_id.trim().is_empty() {
        return Err(Error::InvalidRequest(
            "knowledge base id must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[async_trait]
impl KnowledgeBaseApi for KnowledgeBaseClient {
    #[instrument(skip(self), level = "debug")]
    async fn list_files(&self, kb_id: &str) -> Result<Vec<KnowledgeBaseFile>> {
        require_kb_id(kb_id)?;
        let response: FilesResponse = self
            .http
            .get(&["knowledge", "bases", kb_id, "files"])
            .await?;
        debug!("Loaded {} files for knowledge base {}", response.files.len(), kb_id);
        Ok(response.files)
    }

    #[instrument(skip(self), level = "debug")]
    async fn retrieve(&self, kb_id: &str, query: &str) -> Result<Vec<RetrieveResult>> {
        require_kb_id(kb_id)?;
        let response: RetrieveResponse = self
            .http
            .post(
                &["knowledge", "bases", kb_id, "retrieve"],
                &RetrieveRequest { query },
            )
            .await?;
        debug!("Retrieved {} results for knowledge base {}", response.results.len(), kb_id);
        Ok(response.results)
    }
}
