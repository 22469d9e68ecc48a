//! Context window expansion around highly relevant chunks.

use std::collections::BTreeSet;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::debug;

use rag_core::{EmbedderHandle, Result, StoreGateway};

use crate::aggregate::PendingDocument;
use crate::normalize::ScoreNormalizer;

/// Ordinals within `window` of `ordinal` on either side, excluding `ordinal`.
///
/// Positions before the start of the document are not produced.
pub fn window_ordinals(ordinal: u32, window: u32) -> impl Iterator<Item = u32> {
    let start = ordinal.saturating_sub(window);
    let end = ordinal.saturating_add(window);
    (start..=end).filter(move |o| *o != ordinal)
}

/// Union of the neighbour ordinals of every chunk at or above the threshold.
pub(crate) fn plan_window(
    document: &PendingDocument,
    normalizer: &ScoreNormalizer,
    threshold: f32,
    window: u32,
) -> BTreeSet<u32> {
    if window == 0 {
        return BTreeSet::new();
    }

    document
        .chunks()
        .filter(|chunk| normalizer.normalize(chunk.score) >= threshold)
        .flat_map(|chunk| window_ordinals(chunk.ordinal, window))
        .collect()
}

/// Settings shared by every document's expansion.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WindowSettings<'a> {
    pub normalizer: ScoreNormalizer,
    pub threshold: f32,
    pub window: u32,
    pub embedder: &'a EmbedderHandle,
}

/// Fetch the neighbours of relevant chunks, one batched request per document.
///
/// Each document is moved into the future that expands it, so a document
/// is only ever written by one task. Output order matches input order.
pub(crate) async fn expand_windows(
    store: &dyn StoreGateway,
    documents: Vec<PendingDocument>,
    settings: WindowSettings<'_>,
    concurrency: usize,
) -> Result<Vec<PendingDocument>> {
    stream::iter(documents)
        .map(move |document| expand_document(store, document, settings))
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}

async fn expand_document(
    store: &dyn StoreGateway,
    mut document: PendingDocument,
    settings: WindowSettings<'_>,
) -> Result<PendingDocument> {
    let ordinals = plan_window(
        &document,
        &settings.normalizer,
        settings.threshold,
        settings.window,
    );
    if ordinals.is_empty() {
        return Ok(document);
    }

    debug!(
        "Requesting {} neighbour chunks for document {} (score {})",
        ordinals.len(),
        document.id,
        document.score()
    );

    let records = store.get_chunks_by_ids(document.id, &ordinals).await?;
    let returned = records.len();
    let added = records
        .into_iter()
        .map(|record| document.add_context(record, settings.embedder))
        .filter(|added| *added)
        .count();

    debug!(
        "Document {}: {} of {} returned chunks added for context",
        document.id, added, returned
    );

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rag_core::{ChunkRecord, DocumentInfo, SearchHit};
    use ulid::Ulid;

    fn document_with(hits: &[(u32, f32)]) -> PendingDocument {
        let doc_id = Ulid::from(7u128);
        let embedder = EmbedderHandle::new("test");
        let mut doc = PendingDocument::new(doc_id, DocumentInfo::default());
        for &(ordinal, score) in hits {
            let record = ChunkRecord {
                id: Ulid::from(u128::from(ordinal) + 100),
                doc_id,
                ordinal,
                content: format!("chunk {ordinal}"),
            };
            doc.add_hit(SearchHit::new(record, score), &embedder);
        }
        doc
    }

    #[test]
    fn test_window_ordinals() {
        let ordinals: Vec<u32> = window_ordinals(5, 2).collect();
        assert_eq!(ordinals, [3, 4, 6, 7]);
    }

    #[test]
    fn test_window_ordinals_at_document_start() {
        let ordinals: Vec<u32> = window_ordinals(0, 1).collect();
        assert_eq!(ordinals, [1]);

        let ordinals: Vec<u32> = window_ordinals(1, 3).collect();
        assert_eq!(ordinals, [0, 2, 3, 4]);
    }

    #[test]
    fn test_window_ordinals_zero_window() {
        assert_eq!(window_ordinals(4, 0).count(), 0);
    }

    #[test]
    fn test_plan_only_above_threshold() {
        let doc = document_with(&[(0, 90.0), (2, 10.0)]);
        let normalizer = ScoreNormalizer::from_scores(&[90.0, 10.0]).unwrap();

        let plan = plan_window(&doc, &normalizer, 0.8, 1);
        assert_eq!(plan.into_iter().collect::<Vec<_>>(), [1]);
    }

    #[test]
    fn test_plan_unions_overlapping_windows() {
        let doc = document_with(&[(3, 1.0), (5, 1.0)]);
        let normalizer = ScoreNormalizer::from_scores(&[1.0, 1.0]).unwrap();

        let plan = plan_window(&doc, &normalizer, 0.8, 2);
        // Present ordinals are still requested; they are filtered on arrival.
        assert_eq!(plan.into_iter().collect::<Vec<_>>(), [1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_plan_threshold_is_inclusive() {
        let doc = document_with(&[(0, 0.0), (4, 5.0), (8, 10.0)]);
        let normalizer = ScoreNormalizer::from_scores(&[0.0, 5.0, 10.0]).unwrap();

        let plan = plan_window(&doc, &normalizer, 0.5, 1);
        assert_eq!(plan.into_iter().collect::<Vec<_>>(), [3, 5, 7, 9]);
    }
}
