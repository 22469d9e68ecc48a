//! Configuration types for retrieval.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Largest number of neighbours recovered on each side of a relevant chunk.
pub const MAX_CHUNK_WINDOW: u32 = 10;

/// Upper bound of the user-facing threshold scale.
pub const MAX_THRESHOLD: i64 = 100;

/// Main configuration file contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Retrieval options.
    #[serde(default)]
    pub retrieval: RetrievalOptions,
}

/// Backend query strategy.
///
/// Serialized as its label; deserialized through [`FromStr`], so config files
/// accept the same spellings as the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum SearchMode {
    /// Combined vector and keyword search.
    #[default]
    #[serde(rename = "Hybrid Search")]
    Hybrid,
}

impl SearchMode {
    /// All supported modes.
    pub const ALL: &'static [SearchMode] = &[SearchMode::Hybrid];

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Hybrid => "Hybrid Search",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SearchMode {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "hybrid search" | "hybrid" => Ok(Self::Hybrid),
            other => Err(RagError::config(format!("unknown search mode: {other}"))),
        }
    }
}

impl TryFrom<String> for SearchMode {
    type Error = RagError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// How the backend bounds the candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum LimitMode {
    /// Cut the result list at natural score drops; the limit is the sensitivity.
    #[default]
    Autocut,

    /// Return at most `limit` results.
    Fixed,
}

impl LimitMode {
    /// All supported modes.
    pub const ALL: &'static [LimitMode] = &[LimitMode::Autocut, LimitMode::Fixed];

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Autocut => "Autocut",
            Self::Fixed => "Fixed",
        }
    }
}

impl fmt::Display for LimitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for LimitMode {
    type Err = RagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "autocut" => Ok(Self::Autocut),
            "fixed" => Ok(Self::Fixed),
            other => Err(RagError::config(format!("unknown limit mode: {other}"))),
        }
    }
}

impl TryFrom<String> for LimitMode {
    type Error = RagError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Raw, user-tunable retrieval options.
///
/// Numeric values are accepted as given and clamped by [`RetrievalOptions::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalOptions {
    /// Backend query strategy.
    #[serde(default)]
    pub search_mode: SearchMode,

    /// Candidate set bounding strategy.
    #[serde(default)]
    pub limit_mode: LimitMode,

    /// Autocut sensitivity or fixed result count.
    #[serde(default = "default_limit")]
    pub limit: i64,

    /// Neighbouring chunks to recover per side of a relevant chunk.
    #[serde(default = "default_chunk_window")]
    pub chunk_window: i64,

    /// Relevance cutoff in percent for window expansion.
    #[serde(default = "default_threshold")]
    pub threshold: i64,

    /// Maximum concurrent per-document store requests.
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            search_mode: SearchMode::default(),
            limit_mode: LimitMode::default(),
            limit: default_limit(),
            chunk_window: default_chunk_window(),
            threshold: default_threshold(),
            fetch_concurrency: default_fetch_concurrency(),
        }
    }
}

impl RetrievalOptions {
    /// Clamp the raw values into a usable configuration. Never fails.
    pub fn validate(&self) -> RetrievalConfig {
        RetrievalConfig::new(
            self.search_mode,
            self.limit_mode,
            self.limit,
            self.chunk_window,
            self.threshold,
        )
        .with_fetch_concurrency(self.fetch_concurrency)
    }

    /// Describe each option for configuration UIs.
    pub fn descriptors(&self) -> Vec<OptionDescriptor> {
        vec![
            OptionDescriptor {
                name: "Search Mode",
                kind: OptionKind::Dropdown,
                value: self.search_mode.label().to_string(),
                description: "Switch between search types.",
                values: SearchMode::ALL.iter().map(|m| m.label().to_string()).collect(),
            },
            OptionDescriptor {
                name: "Limit Mode",
                kind: OptionKind::Dropdown,
                value: self.limit_mode.label().to_string(),
                description: "Method for limiting the results. Autocut decides automatically \
                              how many chunks to retrieve, while fixed sets a fixed limit.",
                values: LimitMode::ALL.iter().map(|m| m.label().to_string()).collect(),
            },
            OptionDescriptor {
                name: "Limit/Sensitivity",
                kind: OptionKind::Number,
                value: self.limit.to_string(),
                description: "Value for limiting the results. Value controls Autocut \
                              sensitivity and Fixed Size",
                values: Vec::new(),
            },
            OptionDescriptor {
                name: "Chunk Window",
                kind: OptionKind::Number,
                value: self.chunk_window.to_string(),
                description: "Number of surrounding chunks of retrieved chunks to add to context",
                values: Vec::new(),
            },
            OptionDescriptor {
                name: "Threshold",
                kind: OptionKind::Number,
                value: self.threshold.to_string(),
                description: "Threshold of chunk score to apply window technique (1-100)",
                values: Vec::new(),
            },
        ]
    }
}

/// Input widget kind of a tunable option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Dropdown,
    Number,
}

/// Description of a tunable option.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptionDescriptor {
    /// Label shown to users.
    pub name: &'static str,

    /// Widget kind.
    #[serde(rename = "type")]
    pub kind: OptionKind,

    /// Current value.
    pub value: String,

    /// Help text.
    pub description: &'static str,

    /// Allowed values for dropdowns, empty otherwise.
    pub values: Vec<String>,
}

/// Validated retrieval configuration.
///
/// Every value is clamped on construction, so the accessors always return
/// in-range values.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalConfig {
    search_mode: SearchMode,
    limit_mode: LimitMode,
    limit: u32,
    chunk_window: u32,
    threshold: f32,
    fetch_concurrency: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        RetrievalOptions::default().validate()
    }
}

impl RetrievalConfig {
    /// Build a configuration, clamping out-of-range values.
    ///
    /// `chunk_window` is clamped to `[0, 10]`, `threshold` to `[0, 100]` and
    /// then scaled to `[0, 1]`, `limit` to at least 1.
    pub fn new(
        search_mode: SearchMode,
        limit_mode: LimitMode,
        limit: i64,
        chunk_window: i64,
        threshold: i64,
    ) -> Self {
        let limit = limit.clamp(1, i64::from(u32::MAX)) as u32;
        let chunk_window = chunk_window.clamp(0, i64::from(MAX_CHUNK_WINDOW)) as u32;
        let threshold = threshold.clamp(0, MAX_THRESHOLD) as f32 / MAX_THRESHOLD as f32;

        Self {
            search_mode,
            limit_mode,
            limit,
            chunk_window,
            threshold,
            fetch_concurrency: default_fetch_concurrency(),
        }
    }

    /// Set the per-document fetch concurrency (at least 1).
    pub fn with_fetch_concurrency(mut self, fetch_concurrency: usize) -> Self {
        self.fetch_concurrency = fetch_concurrency.max(1);
        self
    }

    pub fn search_mode(&self) -> SearchMode {
        self.search_mode
    }

    pub fn limit_mode(&self) -> LimitMode {
        self.limit_mode
    }

    /// Autocut sensitivity or fixed result count.
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Neighbours per side, in `[0, 10]`.
    pub fn chunk_window(&self) -> u32 {
        self.chunk_window
    }

    /// Normalized relevance cutoff, in `[0, 1]`.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn fetch_concurrency(&self) -> usize {
        self.fetch_concurrency
    }
}

// Default value functions

fn default_limit() -> i64 {
    1
}

fn default_chunk_window() -> i64 {
    1
}

fn default_threshold() -> i64 {
    80
}

fn default_fetch_concurrency() -> usize {
    4
}

impl RagConfig {
    /// Load configuration from file.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| RagError::config(format!("Failed to parse config: {}", e)))
    }

    /// Load configuration from default paths.
    pub fn load_default() -> Result<Self> {
        // Try user config first
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("rag-retrieval").join("config.toml");
            if user_config.exists() {
                return Self::load(&user_config);
            }
        }

        // Try local config
        let local_config = PathBuf::from("rag-retrieval.toml");
        if local_config.exists() {
            return Self::load(&local_config);
        }

        Ok(Self::default())
    }
}
