//! Grouping of search hits into their parent documents.

use std::collections::{BTreeMap, HashMap, HashSet};

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, warn};
use ulid::Ulid;

use rag_core::{
    Chunk, ChunkRecord, Document, DocumentInfo, EmbedderHandle, Result, SearchHit, StoreGateway,
};

/// A document being assembled during one retrieval call.
#[derive(Debug, Clone)]
pub(crate) struct PendingDocument {
    pub id: Ulid,
    info: DocumentInfo,
    /// Keyed by ordinal; the first chunk written for an ordinal is kept.
    chunks: BTreeMap<u32, Chunk>,
    score: f32,
}

impl PendingDocument {
    pub fn new(id: Ulid, info: DocumentInfo) -> Self {
        Self {
            id,
            info,
            chunks: BTreeMap::new(),
            score: 0.0,
        }
    }

    /// Add a search hit and count its score. Returns false if the ordinal was already present.
    pub fn add_hit(&mut self, hit: SearchHit, embedder: &EmbedderHandle) -> bool {
        let SearchHit { score, chunk } = hit;
        if self.insert(chunk, score, embedder) {
            self.score += score;
            true
        } else {
            false
        }
    }

    /// Add a chunk for context only. It carries score 0 and leaves the document score alone.
    pub fn add_context(&mut self, record: ChunkRecord, embedder: &EmbedderHandle) -> bool {
        self.insert(record, 0.0, embedder)
    }

    fn insert(&mut self, record: ChunkRecord, score: f32, embedder: &EmbedderHandle) -> bool {
        if self.chunks.contains_key(&record.ordinal) {
            return false;
        }
        self.chunks.insert(
            record.ordinal,
            Chunk {
                id: record.id,
                doc_id: self.id,
                ordinal: record.ordinal,
                content: record.content,
                score,
                embedder: embedder.clone(),
            },
        );
        true
    }

    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.values()
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn into_document(self) -> Document {
        Document {
            id: self.id,
            title: self.info.title,
            metadata: self.info.metadata,
            chunks: self.chunks.into_values().collect(),
            score: self.score,
        }
    }
}

/// Documents built from the hits, plus the raw score of every hit.
#[derive(Debug)]
pub(crate) struct Aggregation {
    /// Documents in order of first sighting.
    pub documents: Vec<PendingDocument>,

    /// One raw score per hit, in arrival order.
    pub scores: Vec<f32>,

    /// Hits dropped because their document is missing or the ordinal repeated.
    pub dropped: usize,
}

/// Group hits by document, fetching each document's metadata once.
///
/// Hits for documents the store reports missing are dropped. Metadata lookups
/// run concurrently, at most `concurrency` at a time.
pub(crate) async fn aggregate(
    store: &dyn StoreGateway,
    hits: Vec<SearchHit>,
    embedder: &EmbedderHandle,
    concurrency: usize,
) -> Result<Aggregation> {
    let mut seen = HashSet::new();
    let first_seen: Vec<Ulid> = hits
        .iter()
        .map(|hit| hit.chunk.doc_id)
        .filter(|doc_id| seen.insert(*doc_id))
        .collect();

    let lookups: Vec<(Ulid, Option<DocumentInfo>)> = stream::iter(first_seen)
        .map(move |doc_id| async move {
            let info = store.get_document(doc_id).await?;
            Ok::<_, rag_core::RagError>((doc_id, info))
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let mut index: HashMap<Ulid, usize> = HashMap::with_capacity(lookups.len());
    let mut documents = Vec::with_capacity(lookups.len());
    for (doc_id, info) in lookups {
        match info {
            Some(info) => {
                index.insert(doc_id, documents.len());
                documents.push(PendingDocument::new(doc_id, info));
            }
            None => warn!("Document {} not found, dropping its chunks", doc_id),
        }
    }

    let mut scores = Vec::with_capacity(hits.len());
    let mut dropped = 0;
    for hit in hits {
        scores.push(hit.score);
        let Some(&position) = index.get(&hit.chunk.doc_id) else {
            dropped += 1;
            continue;
        };
        let ordinal = hit.chunk.ordinal;
        if !documents[position].add_hit(hit, embedder) {
            debug!(
                "Ignoring repeated chunk {} of document {}",
                ordinal, documents[position].id
            );
            dropped += 1;
        }
    }

    debug!(
        "Aggregated {} hits into {} documents ({} dropped)",
        scores.len(),
        documents.len(),
        dropped
    );

    Ok(Aggregation {
        documents,
        scores,
        dropped,
    })
}
