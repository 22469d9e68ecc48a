//! rag-core - Core types and traits for windowed retrieval
//!
//! This crate provides the domain types, the store gateway and retriever
//! traits, configuration, and error handling shared by the retrieval
//! engine, the store implementations, and the CLI.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{RagError, Result};
pub use traits::*;
pub use types::*;
