//! Core traits defining the interfaces between components.

use std::collections::BTreeSet;

use async_trait::async_trait;
use ulid::Ulid;

use crate::config::{LimitMode, RetrievalConfig};
use crate::error::Result;
use crate::types::{ChunkRecord, DocumentInfo, EmbedderHandle, RetrievalResult, SearchHit};
use crate::OptionDescriptor;

/// Parameters of a backend search.
#[derive(Debug, Clone, Copy)]
pub struct SearchRequest<'a> {
    /// Query text for the keyword side.
    pub query: &'a str,

    /// Query vector for the vector side.
    pub vector: &'a [f32],

    /// How the backend bounds the candidate set.
    pub limit_mode: LimitMode,

    /// Autocut sensitivity or fixed result count.
    pub limit: u32,

    /// Only documents carrying at least one of these labels.
    pub labels: Option<&'a [String]>,

    /// Only these documents.
    pub document_filter: Option<&'a [Ulid]>,
}

/// Read-only access to the search backend.
///
/// Implementations are shared across concurrent retrieval calls and must not
/// rely on per-call state.
#[async_trait]
pub trait StoreGateway: Send + Sync {
    /// Ranked chunk search combining vector and keyword relevance.
    async fn hybrid_search(&self, request: SearchRequest<'_>) -> Result<Vec<SearchHit>>;

    /// Fetch document metadata. `None` when the document does not exist.
    async fn get_document(&self, doc_id: Ulid) -> Result<Option<DocumentInfo>>;

    /// Fetch chunks of one document by ordinal.
    ///
    /// Ordinals outside the document are skipped, so fewer chunks than
    /// requested may come back.
    async fn get_chunks_by_ids(
        &self,
        doc_id: Ulid,
        ordinals: &BTreeSet<u32>,
    ) -> Result<Vec<ChunkRecord>>;
}

/// A retrieval query.
#[derive(Debug, Clone, Default)]
pub struct RetrievalQuery {
    /// Query text.
    pub query: String,

    /// Embedding of the query text.
    pub vector: Vec<f32>,

    /// Optional label filter.
    pub labels: Option<Vec<String>>,

    /// Optional document filter.
    pub document_filter: Option<Vec<Ulid>>,
}

impl RetrievalQuery {
    /// Create an unfiltered query.
    pub fn new(query: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            query: query.into(),
            vector,
            labels: None,
            document_filter: None,
        }
    }

    /// Restrict the search to documents carrying one of these labels.
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = Some(labels);
        self
    }

    /// Restrict the search to these documents.
    pub fn with_document_filter(mut self, documents: Vec<Ulid>) -> Self {
        self.document_filter = Some(documents);
        self
    }
}

/// Retrieval strategy turning a query into ranked documents and a context blob.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Short name shown in configuration UIs.
    fn name(&self) -> &str;

    /// One-line description.
    fn description(&self) -> &str;

    /// Tunable options with their defaults.
    fn options(&self) -> Vec<OptionDescriptor>;

    /// Run one retrieval call against the store.
    async fn retrieve(
        &self,
        query: &RetrievalQuery,
        config: &RetrievalConfig,
        store: &dyn StoreGateway,
        embedder: &EmbedderHandle,
    ) -> Result<RetrievalResult>;
}
