//! JSON corpus files loaded into a [`crate::MemoryStore`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use rag_core::{Metadata, Result};

/// A corpus file: a list of already-chunked documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusFile {
    pub documents: Vec<CorpusDocument>,
}

/// A document in a corpus file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusDocument {
    /// Identifier, generated when absent.
    #[serde(default)]
    pub id: Option<Ulid>,

    pub title: String,

    #[serde(default)]
    pub metadata: Metadata,

    /// Labels usable as a search filter.
    #[serde(default)]
    pub labels: Vec<String>,

    /// Chunks in reading order; a chunk's ordinal is its position here.
    #[serde(default)]
    pub chunks: Vec<CorpusChunk>,
}

/// A chunk in a corpus file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorpusChunk {
    /// Identifier, generated when absent.
    #[serde(default)]
    pub id: Option<Ulid>,

    pub content: String,

    /// Precomputed embedding, may be empty.
    #[serde(default)]
    pub embedding: Vec<f32>,
}

impl CorpusFile {
    /// Load a corpus from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse a corpus from JSON text.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

impl CorpusDocument {
    /// Create a document from plain chunk texts, without embeddings.
    pub fn from_texts<I, S>(title: &str, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: None,
            title: title.to_string(),
            metadata: Metadata::new(),
            labels: Vec::new(),
            chunks: texts
                .into_iter()
                .map(|text| CorpusChunk {
                    id: None,
                    content: text.into(),
                    embedding: Vec::new(),
                })
                .collect(),
        }
    }

    /// Set the identifier.
    pub fn with_id(mut self, id: Ulid) -> Self {
        self.id = Some(id);
        self
    }

    /// Add a label.
    pub fn with_label(mut self, label: &str) -> Self {
        self.labels.push(label.to_string());
        self
    }
}
