//! The embedding record persisted by every vector store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::symbols::SymbolIdentity;

/// Free-form record metadata.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A scalar metadata value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Str(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Str(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

/// An embedding of one symbol.
///
/// `document` is the embedded text (source code or documentation). Once a
/// record is considered fresh it equals the symbol's current source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Identity of the embedded symbol
    pub key: SymbolIdentity,
    /// The embedding vector
    pub vector: Vec<f32>,
    /// The text the vector was computed from
    pub document: String,
    /// Builder-specific metadata
    #[serde(default)]
    pub metadata: Metadata,
}

impl EmbeddingRecord {
    /// Create a new record with empty metadata.
    pub fn new(key: SymbolIdentity, vector: Vec<f32>, document: impl Into<String>) -> Self {
        Self {
            key,
            vector,
            document: document.into(),
            metadata: Metadata::new(),
        }
    }

    /// Add a metadata entry.
    pub fn with_metadata(
        mut self,
        key: impl Into<String>,
        value: impl Into<MetadataValue>,
    ) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// The storage key of this record.
    pub fn dotted_path(&self) -> &str {
        self.key.dotted_path()
    }

    /// A copy of this record moved to `key` and `document`, keeping the vector
    /// and metadata.
    pub fn rolled_forward(&self, key: SymbolIdentity, document: impl Into<String>) -> Self {
        Self {
            key,
            document: document.into(),
            ..self.clone()
        }
    }
}
