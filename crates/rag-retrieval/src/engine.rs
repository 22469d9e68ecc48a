//! Windowed retrieval engine.

use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, info};

use rag_core::{
    EmbedderHandle, OptionDescriptor, RagError, Result, RetrievalConfig, RetrievalOptions,
    RetrievalQuery, RetrievalResult, Retriever, StoreGateway,
};

use crate::aggregate::{aggregate, Aggregation};
use crate::assemble::assemble;
use crate::normalize::ScoreNormalizer;
use crate::search::fetch_candidates;
use crate::window::{expand_windows, WindowSettings};

/// Retriever that ranks documents and expands relevant chunks with their neighbours.
///
/// One call runs four phases against the store:
///
/// 1. search for candidate chunks,
/// 2. group them by document, fetching each document's metadata once,
/// 3. normalize chunk scores across the candidate set,
/// 4. fetch the neighbours of chunks at or above the threshold, one
///    batched request per document.
///
/// All intermediate state belongs to the call. Dropping the returned future
/// abandons the call without leaving anything behind.
#[derive(Debug, Clone, Default)]
pub struct WindowRetriever {
    /// Defaults reported by [`Retriever::options`].
    defaults: RetrievalOptions,
}

impl WindowRetriever {
    /// Create a retriever with the default option values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a retriever reporting `defaults` as its option values.
    pub fn with_defaults(defaults: RetrievalOptions) -> Self {
        Self { defaults }
    }

    /// Run one retrieval call.
    pub async fn retrieve(
        &self,
        query: &RetrievalQuery,
        config: &RetrievalConfig,
        store: &dyn StoreGateway,
        embedder: &EmbedderHandle,
    ) -> Result<RetrievalResult> {
        let start = Instant::now();

        info!("Retrieving for: {:?}", query.query);

        let hits = fetch_candidates(store, query, config).await?;
        if hits.is_empty() {
            info!("Search returned no chunks");
            return Ok(RetrievalResult::no_chunks());
        }

        let hit_count = hits.len();
        debug!("Search ({}) returned {} hits", config.search_mode(), hit_count);

        let Aggregation {
            documents,
            scores,
            dropped,
        } = aggregate(store, hits, embedder, config.fetch_concurrency()).await?;

        let normalizer = ScoreNormalizer::from_scores(&scores)
            .ok_or_else(|| RagError::internal("no scores for a non-empty candidate set"))?;

        debug!(
            "Score range [{}, {}], threshold {}, window {}",
            normalizer.min(),
            normalizer.max(),
            config.threshold(),
            config.chunk_window()
        );

        let settings = WindowSettings {
            normalizer,
            threshold: config.threshold(),
            window: config.chunk_window(),
            embedder,
        };
        let documents =
            expand_windows(store, documents, settings, config.fetch_concurrency()).await?;

        let result = assemble(documents)?;

        info!(
            "Retrieval completed in {}ms: {} hits ({} dropped), {} documents, {} chunks",
            start.elapsed().as_millis(),
            hit_count,
            dropped,
            result.documents.len(),
            result.chunk_count()
        );

        Ok(result)
    }
}

#[async_trait]
impl Retriever for WindowRetriever {
    fn name(&self) -> &str {
        "Advanced"
    }

    fn description(&self) -> &str {
        "Retrieve relevant chunks from Vector Database"
    }

    fn options(&self) -> Vec<OptionDescriptor> {
        self.defaults.descriptors()
    }

    async fn retrieve(
        &self,
        query: &RetrievalQuery,
        config: &RetrievalConfig,
        store: &dyn StoreGateway,
        embedder: &EmbedderHandle,
    ) -> Result<RetrievalResult> {
        WindowRetriever::retrieve(self, query, config, store, embedder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriever_identity() {
        let retriever = WindowRetriever::new();
        assert_eq!(Retriever::name(&retriever), "Advanced");
        assert_eq!(retriever.options().len(), 5);
    }

    #[test]
    fn test_custom_defaults_are_reported() {
        let retriever = WindowRetriever::with_defaults(RetrievalOptions {
            chunk_window: 3,
            ..RetrievalOptions::default()
        });
        let window = retriever
            .options()
            .into_iter()
            .find(|option| option.name == "Chunk Window")
            .unwrap();
        assert_eq!(window.value, "3");
    }
}
