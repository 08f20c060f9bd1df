//! The vector store contract shared by every backend.
//!
//! Stores map a dotted path to exactly one [`EmbeddingRecord`]. `add` is a raw
//! insert: resolving staleness is the caller's job.

use std::sync::Arc;

use crate::record::EmbeddingRecord;
use crate::remote_store::SYMBOL_URI_FIELD;
use crate::symbols::SymbolParseError;

/// Error type for vector store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("No embedding stored for '{0}'")]
    NotFound(String),
    /// More than one record resolved for a key. The uniqueness invariant is broken.
    #[error("Found {count} embeddings for '{key}', the store is corrupt")]
    AmbiguousKey { key: String, count: usize },
    #[error("Metadata key '{0}' is reserved")]
    ReservedMetadataKey(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Collection error: {0}")]
    Collection(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<SymbolParseError> for StoreError {
    fn from(e: SymbolParseError) -> Self {
        StoreError::InvalidData(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Check that a record can be written and read back by every backend.
///
/// The key must survive its uri form, the vector must be finite, and the
/// metadata must not use the reserved [`SYMBOL_URI_FIELD`] key.
pub fn check_record(record: &EmbeddingRecord) -> Result<()> {
    record.key.check()?;
    if record.metadata.contains_key(SYMBOL_URI_FIELD) {
        return Err(StoreError::ReservedMetadataKey(SYMBOL_URI_FIELD.to_string()));
    }
    if let Some(value) = record.vector.iter().find(|v| !v.is_finite()) {
        return Err(StoreError::InvalidData(format!(
            "Vector for '{}' contains non-finite value {}",
            record.dotted_path(),
            value
        )));
    }
    Ok(())
}

/// Key-value storage of embedding records, keyed by dotted path.
pub trait VectorStore: Send + Sync {
    /// Get the record stored under `key`.
    fn get(&self, key: &str) -> Result<EmbeddingRecord>;

    /// Check whether a record exists for `key`.
    fn contains(&self, key: &str) -> Result<bool>;

    /// Insert a record under its dotted path.
    fn add(&self, record: EmbeddingRecord) -> Result<()>;

    /// Remove the record for `key`. Absent keys are ignored.
    fn discard(&self, key: &str) -> Result<()>;

    /// Replace the record stored under `record`'s dotted path.
    fn update(&self, record: EmbeddingRecord) -> Result<()> {
        check_record(&record)?;
        self.discard(record.dotted_path())?;
        self.add(record)
    }

    /// Remove every record.
    fn clear(&self) -> Result<()>;

    /// All records, sorted by dotted path.
    fn ordered_records(&self) -> Result<Vec<EmbeddingRecord>>;

    /// Number of stored records.
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Load persisted state. A no-op for live backends.
    fn load(&self) -> Result<()>;

    /// Persist the current state. A no-op for live backends.
    fn save(&self) -> Result<()>;
}

/// Thread-safe handle to a vector store.
pub type SharedVectorStore = Arc<dyn VectorStore>;
