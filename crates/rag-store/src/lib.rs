//! rag-store - In-memory store gateway
//!
//! This crate provides [`MemoryStore`], a [`rag_core::StoreGateway`] that keeps
//! documents and chunks in memory. It scores chunks with a blend of vector
//! similarity and keyword overlap and bounds results with the Autocut or
//! Fixed limit modes. It backs the CLI and the integration tests.

mod autocut;
mod corpus;
mod fusion;
mod memory;

pub use autocut::autocut;
pub use corpus::{CorpusChunk, CorpusDocument, CorpusFile};
pub use fusion::relative_score_fusion;
pub use memory::MemoryStore;
