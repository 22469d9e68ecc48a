//! In-memory store gateway.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};
use ulid::Ulid;

use rag_core::{
    ChunkRecord, DocumentInfo, LimitMode, RagError, Result, SearchHit, SearchRequest,
    StoreGateway,
};

use crate::autocut::autocut;
use crate::corpus::{CorpusDocument, CorpusFile};
use crate::fusion::relative_score_fusion;

/// Weight of vector similarity in the hybrid score; keyword overlap gets the rest.
const VECTOR_WEIGHT: f32 = 0.75;

/// In-memory store gateway.
///
/// Documents are kept in an ordered map behind a `tokio::sync::RwLock`, so
/// searches over an unchanged store are deterministic.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<BTreeMap<Ulid, StoredDocument>>,
}

#[derive(Debug, Clone)]
struct StoredDocument {
    info: DocumentInfo,
    labels: Vec<String>,
    chunks: BTreeMap<u32, StoredChunk>,
}

#[derive(Debug, Clone)]
struct StoredChunk {
    id: Ulid,
    content: String,
    embedding: Vec<f32>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding every document of `corpus`.
    pub fn from_corpus(corpus: CorpusFile) -> Self {
        let documents = corpus.documents.into_iter().map(build_document).collect();
        Self {
            documents: RwLock::new(documents),
        }
    }

    /// Load a JSON corpus file.
    pub fn load(path: &Path) -> Result<Self> {
        let corpus = CorpusFile::load(path)?;
        let store = Self::from_corpus(corpus);
        info!("Loaded corpus from {:?}", path);
        Ok(store)
    }

    /// Insert or replace a document. Returns its id.
    pub async fn insert_document(&self, document: CorpusDocument) -> Ulid {
        let (id, stored) = build_document(document);
        self.documents.write().await.insert(id, stored);
        id
    }

    /// Remove a document. Returns whether it existed.
    pub async fn remove_document(&self, id: Ulid) -> bool {
        self.documents.write().await.remove(&id).is_some()
    }

    /// Number of stored documents.
    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }
}

fn build_document(document: CorpusDocument) -> (Ulid, StoredDocument) {
    let id = document.id.unwrap_or_else(Ulid::new);
    let chunks = document
        .chunks
        .into_iter()
        .enumerate()
        .map(|(ordinal, chunk)| {
            (
                ordinal as u32,
                StoredChunk {
                    id: chunk.id.unwrap_or_else(Ulid::new),
                    content: chunk.content,
                    embedding: chunk.embedding,
                },
            )
        })
        .collect();

    let stored = StoredDocument {
        info: DocumentInfo {
            title: document.title,
            metadata: document.metadata,
        },
        labels: document.labels,
        chunks,
    };
    (id, stored)
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 for empty or mismatched vectors and for zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// A query vector must match the dimension of every embedded chunk it is compared with.
///
/// Chunks stored without an embedding and queries without a vector are keyword-only.
fn check_dimensions(vector: &[f32], chunk: &StoredChunk) -> Result<()> {
    if vector.is_empty() || chunk.embedding.is_empty() || vector.len() == chunk.embedding.len() {
        return Ok(());
    }
    Err(RagError::invalid_argument(format!(
        "query vector has {} dimensions, chunk {} has {}",
        vector.len(),
        chunk.id,
        chunk.embedding.len()
    )))
}

fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Fraction of the query terms present in `content`.
fn keyword_score(terms: &BTreeSet<String>, content: &str) -> f32 {
    if terms.is_empty() {
        return 0.0;
    }
    let words = tokenize(content);
    let matched = terms.iter().filter(|term| words.contains(*term)).count();
    matched as f32 / terms.len() as f32
}

fn matches_filters(id: &Ulid, document: &StoredDocument, request: &SearchRequest<'_>) -> bool {
    if let Some(filter) = request.document_filter.filter(|f| !f.is_empty()) {
        if !filter.contains(id) {
            return false;
        }
    }
    if let Some(labels) = request.labels.filter(|l| !l.is_empty()) {
        if !document.labels.iter().any(|label| labels.contains(label)) {
            return false;
        }
    }
    true
}

#[async_trait]
impl StoreGateway for MemoryStore {
    async fn hybrid_search(&self, request: SearchRequest<'_>) -> Result<Vec<SearchHit>> {
        let documents = self.documents.read().await;
        let terms = tokenize(request.query);

        let mut vector_scores = Vec::new();
        let mut keyword_scores = Vec::new();
        let mut records: HashMap<Ulid, ChunkRecord> = HashMap::new();

        for (doc_id, document) in documents
            .iter()
            .filter(|(id, document)| matches_filters(id, document, &request))
        {
            for (ordinal, chunk) in &document.chunks {
                check_dimensions(request.vector, chunk)?;
                let similarity = cosine_similarity(&chunk.embedding, request.vector);
                vector_scores.push((chunk.id, similarity));
                keyword_scores.push((chunk.id, keyword_score(&terms, &chunk.content)));
                records.insert(
                    chunk.id,
                    ChunkRecord {
                        id: chunk.id,
                        doc_id: *doc_id,
                        ordinal: *ordinal,
                        content: chunk.content.clone(),
                    },
                );
            }
        }

        let fused = relative_score_fusion(vec![
            (vector_scores, VECTOR_WEIGHT),
            (keyword_scores, 1.0 - VECTOR_WEIGHT),
        ]);
        let candidates: Vec<(Ulid, f32)> =
            fused.into_iter().filter(|(_, score)| *score > 0.0).collect();

        let keep = match request.limit_mode {
            LimitMode::Fixed => candidates.len().min(request.limit as usize),
            LimitMode::Autocut => {
                let scores: Vec<f32> = candidates.iter().map(|(_, score)| *score).collect();
                autocut(&scores, request.limit)
            }
        };

        debug!(
            "Hybrid search: {} candidates, keeping {} ({})",
            candidates.len(),
            keep,
            request.limit_mode
        );

        Ok(candidates
            .into_iter()
            .take(keep)
            .filter_map(|(id, score)| {
                records
                    .remove(&id)
                    .map(|record| SearchHit::new(record, score))
            })
            .collect())
    }

    async fn get_document(&self, doc_id: Ulid) -> Result<Option<DocumentInfo>> {
        let documents = self.documents.read().await;
        Ok(documents.get(&doc_id).map(|document| document.info.clone()))
    }

    async fn get_chunks_by_ids(
        &self,
        doc_id: Ulid,
        ordinals: &BTreeSet<u32>,
    ) -> Result<Vec<ChunkRecord>> {
        let documents = self.documents.read().await;
        let Some(document) = documents.get(&doc_id) else {
            return Ok(Vec::new());
        };

        Ok(ordinals
            .iter()
            .filter_map(|ordinal| {
                document.chunks.get(ordinal).map(|chunk| ChunkRecord {
                    id: chunk.id,
                    doc_id,
                    ordinal: *ordinal,
                    content: chunk.content.clone(),
                })
            })
            .collect())
    }
}
