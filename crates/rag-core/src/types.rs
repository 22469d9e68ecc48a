//! Core domain types for retrieval.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Message returned in place of a context blob when the search yields nothing.
pub const NO_CHUNKS_MESSAGE: &str = "We couldn't find any chunks to the query";

/// Opaque key/value metadata attached to a document.
///
/// Ordered so that rendering it is stable across calls.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// A chunk as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Unique identifier.
    pub id: Ulid,

    /// Owning document.
    pub doc_id: Ulid,

    /// Position within the document (0-based, unique per document).
    pub ordinal: u32,

    /// Chunk text content.
    pub content: String,
}

/// A chunk returned by a search, with the backend-assigned score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Raw relevance score (higher is better).
    pub score: f32,

    /// The matched chunk.
    pub chunk: ChunkRecord,
}

impl SearchHit {
    /// Create a new search hit.
    pub fn new(chunk: ChunkRecord, score: f32) -> Self {
        Self { score, chunk }
    }
}

/// Document metadata as reported by the store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentInfo {
    /// Document title.
    pub title: String,

    /// User-provided metadata, may be empty.
    #[serde(default)]
    pub metadata: Metadata,
}

/// Opaque reference to the embedder that produced the query vector.
///
/// Attached to every emitted chunk for downstream identification; retrieval
/// never inspects it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbedderHandle(String);

impl EmbedderHandle {
    /// Create a handle from any name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The wrapped name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmbedderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A retrieved or context-expanded chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier.
    pub id: Ulid,

    /// Owning document.
    pub doc_id: Ulid,

    /// Position within the document.
    pub ordinal: u32,

    /// Chunk text content.
    pub content: String,

    /// Raw search score, `0` for chunks added only for context.
    pub score: f32,

    /// Embedder the query vector came from.
    pub embedder: EmbedderHandle,
}

impl Chunk {
    /// Whether this chunk was matched by the search rather than added as context.
    pub fn is_match(&self) -> bool {
        self.score > 0.0
    }
}

/// A document grouping the chunks that share its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document identifier.
    pub id: Ulid,

    /// Document title.
    pub title: String,

    /// Document metadata.
    #[serde(default)]
    pub metadata: Metadata,

    /// Chunks in ascending ordinal order.
    pub chunks: Vec<Chunk>,

    /// Sum of the raw scores of the chunks matched by the search.
    pub score: f32,
}

/// Output of a retrieval call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// Documents ordered by descending score, ties by ascending id.
    pub documents: Vec<Document>,

    /// Rendered context for the generation stage.
    pub context: String,
}

impl RetrievalResult {
    /// The result of a search that returned no chunks.
    pub fn no_chunks() -> Self {
        Self {
            documents: Vec::new(),
            context: NO_CHUNKS_MESSAGE.to_string(),
        }
    }

    /// True when no document was retrieved.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Total number of chunks across all documents.
    pub fn chunk_count(&self) -> usize {
        self.documents.iter().map(|d| d.chunks.len()).sum()
    }
}
