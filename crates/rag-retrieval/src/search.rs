//! Initial candidate fetch, dispatched on the configured search mode.

use rag_core::{
    Result, RetrievalConfig, RetrievalQuery, SearchHit, SearchMode, SearchRequest, StoreGateway,
};

/// Issue the ranked chunk query for `query` against the store.
pub(crate) async fn fetch_candidates(
    store: &dyn StoreGateway,
    query: &RetrievalQuery,
    config: &RetrievalConfig,
) -> Result<Vec<SearchHit>> {
    let request = SearchRequest {
        query: &query.query,
        vector: &query.vector,
        limit_mode: config.limit_mode(),
        limit: config.limit(),
        labels: query.labels.as_deref(),
        document_filter: query.document_filter.as_deref(),
    };

    match config.search_mode() {
        SearchMode::Hybrid => store.hybrid_search(request).await,
    }
}
