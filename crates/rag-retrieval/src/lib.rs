//! rag-retrieval - Windowed document retrieval
//!
//! This crate turns a query and its embedding into ranked documents and a
//! single context blob for a generation stage. Chunks returned by the store
//! are grouped by document and scored, and the neighbours of highly relevant
//! chunks are fetched so the generator sees coherent passages.
//!
//! # Features
//!
//! - Document aggregation with one metadata lookup per document
//! - Min-max score normalization with a defined rule for equal scores
//! - Batched window expansion, one store request per document
//! - Deterministic document order and context rendering
//!
//! # Example
//!
//! ```rust,ignore
//! use rag_core::{EmbedderHandle, RetrievalConfig, RetrievalQuery};
//! use rag_retrieval::WindowRetriever;
//!
//! let retriever = WindowRetriever::new();
//! let query = RetrievalQuery::new("error handling", vector);
//! let result = retriever
//!     .retrieve(&query, &RetrievalConfig::default(), &store, &EmbedderHandle::new("nomic"))
//!     .await?;
//! println!("{}", result.context);
//! ```

mod aggregate;
mod assemble;
mod engine;
mod normalize;
mod search;
mod window;

pub use assemble::{render_context, sort_documents};
pub use engine::WindowRetriever;
pub use normalize::ScoreNormalizer;
pub use window::window_ordinals;

// Re-export for convenience
pub use rag_core::{Document, RetrievalResult, NO_CHUNKS_MESSAGE};
