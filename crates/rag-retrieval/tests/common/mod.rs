//! Scripted store gateway shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use ulid::Ulid;

use rag_core::{
    ChunkRecord, DocumentInfo, LimitMode, RagError, Result, SearchHit, SearchRequest,
    StoreGateway,
};

/// A store call, as observed by [`ScriptedStore`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Search {
        limit_mode: LimitMode,
        limit: u32,
        labels: Option<Vec<String>>,
        document_filter: Option<Vec<Ulid>>,
    },
    GetDocument(Ulid),
    GetChunks(Ulid, Vec<u32>),
}

/// Store returning a fixed hit list and recording every call.
#[derive(Debug, Default)]
pub struct ScriptedStore {
    hits: Vec<SearchHit>,
    documents: HashMap<Ulid, DocumentInfo>,
    chunks: HashMap<Ulid, BTreeMap<u32, ChunkRecord>>,
    fail_chunk_fetch: bool,
    calls: Mutex<Vec<Call>>,
}

pub fn doc_id(n: u128) -> Ulid {
    Ulid::from(n)
}

fn chunk_id(doc: Ulid, ordinal: u32) -> Ulid {
    Ulid::from((u128::from(doc) << 32) | u128::from(ordinal))
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document with `chunk_count` chunks whose content is `<title> #<ordinal>`.
    pub fn document(mut self, id: Ulid, title: &str, chunk_count: u32) -> Self {
        self.documents.insert(
            id,
            DocumentInfo {
                title: title.to_string(),
                metadata: Default::default(),
            },
        );
        let chunks = (0..chunk_count)
            .map(|ordinal| {
                (
                    ordinal,
                    ChunkRecord {
                        id: chunk_id(id, ordinal),
                        doc_id: id,
                        ordinal,
                        content: format!("{title} #{ordinal}"),
                    },
                )
            })
            .collect();
        self.chunks.insert(id, chunks);
        self
    }

    /// Add a metadata entry to an existing document.
    pub fn metadata(mut self, id: Ulid, key: &str, value: serde_json::Value) -> Self {
        if let Some(info) = self.documents.get_mut(&id) {
            info.metadata.insert(key.to_string(), value);
        }
        self
    }

    /// Queue a search hit. The document does not need to exist.
    pub fn hit(mut self, doc: Ulid, ordinal: u32, score: f32) -> Self {
        let record = self
            .chunks
            .get(&doc)
            .and_then(|chunks| chunks.get(&ordinal))
            .cloned()
            .unwrap_or_else(|| ChunkRecord {
                id: chunk_id(doc, ordinal),
                doc_id: doc,
                ordinal,
                content: format!("orphan #{ordinal}"),
            });
        self.hits.push(SearchHit::new(record, score));
        self
    }

    /// Make every chunk fetch fail.
    pub fn failing_chunk_fetch(mut self) -> Self {
        self.fail_chunk_fetch = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn chunk_fetches(&self) -> Vec<(Ulid, Vec<u32>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::GetChunks(doc, ordinals) => Some((doc, ordinals)),
                _ => None,
            })
            .collect()
    }

    pub fn document_lookups(&self) -> Vec<Ulid> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::GetDocument(doc) => Some(doc),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl StoreGateway for ScriptedStore {
    async fn hybrid_search(&self, request: SearchRequest<'_>) -> Result<Vec<SearchHit>> {
        self.record(Call::Search {
            limit_mode: request.limit_mode,
            limit: request.limit,
            labels: request.labels.map(<[String]>::to_vec),
            document_filter: request.document_filter.map(<[Ulid]>::to_vec),
        });
        Ok(self.hits.clone())
    }

    async fn get_document(&self, doc_id: Ulid) -> Result<Option<DocumentInfo>> {
        self.record(Call::GetDocument(doc_id));
        Ok(self.documents.get(&doc_id).cloned())
    }

    async fn get_chunks_by_ids(
        &self,
        doc_id: Ulid,
        ordinals: &BTreeSet<u32>,
    ) -> Result<Vec<ChunkRecord>> {
        self.record(Call::GetChunks(doc_id, ordinals.iter().copied().collect()));
        if self.fail_chunk_fetch {
            return Err(RagError::store("chunk fetch unavailable"));
        }
        let Some(chunks) = self.chunks.get(&doc_id) else {
            return Ok(Vec::new());
        };
        Ok(ordinals
            .iter()
            .filter_map(|ordinal| chunks.get(ordinal).cloned())
            .collect())
    }
}
