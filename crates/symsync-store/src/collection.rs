//! Client contract for a live vector index.
//!
//! A collection only understands string ids, a flat JSON metadata map, a
//! document string and a numeric vector. Transport is up to the implementor;
//! [`InMemoryCollection`] keeps everything in process.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::{Result, StoreError};

/// Flat metadata map as stored by a collection.
pub type CollectionMetadata = Map<String, Value>;

/// Columnar batch of entries for `add` and `update`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionEntries {
    pub ids: Vec<String>,
    pub documents: Vec<String>,
    pub metadatas: Vec<CollectionMetadata>,
    pub embeddings: Vec<Vec<i64>>,
}

impl CollectionEntries {
    /// Number of entries, after checking every column has the same length.
    pub fn validated_len(&self) -> Result<usize> {
        let len = self.ids.len();
        if self.documents.len() != len || self.metadatas.len() != len || self.embeddings.len() != len
        {
            return Err(StoreError::Collection(format!(
                "Column length mismatch: {} ids, {} documents, {} metadatas, {} embeddings",
                len,
                self.documents.len(),
                self.metadatas.len(),
                self.embeddings.len()
            )));
        }
        Ok(len)
    }
}

/// Optional columns to return from `get`. Ids are always returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Include {
    Documents,
    Metadatas,
    Embeddings,
}

/// Columnar result of a `get`. Columns not requested are `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GetResult {
    pub ids: Vec<String>,
    pub documents: Option<Vec<String>>,
    pub metadatas: Option<Vec<CollectionMetadata>>,
    pub embeddings: Option<Vec<Vec<f64>>>,
}

/// A live vector index collection. Every mutating call is durable on return.
pub trait Collection: Send + Sync {
    /// Name of the collection.
    fn name(&self) -> &str;

    /// Insert new entries. Existing ids are rejected.
    fn add(&self, entries: CollectionEntries) -> Result<()>;

    /// Overwrite existing entries in place. Unknown ids are rejected.
    fn update(&self, entries: CollectionEntries) -> Result<()>;

    /// Fetch entries by id, or every entry when `ids` is `None`.
    fn get(&self, ids: Option<&[String]>, include: &[Include]) -> Result<GetResult>;

    /// Delete entries by id. Unknown ids are ignored.
    fn delete(&self, ids: &[String]) -> Result<()>;

    /// Number of entries.
    fn count(&self) -> Result<usize>;
}

/// Thread-safe handle to a collection client.
pub type SharedCollection = Arc<dyn Collection>;

#[derive(Debug, Clone)]
struct StoredEntry {
    document: String,
    metadata: CollectionMetadata,
    embedding: Vec<i64>,
}

/// Collection kept in process memory.
#[derive(Debug, Default)]
pub struct InMemoryCollection {
    name: String,
    entries: RwLock<BTreeMap<String, StoredEntry>>,
}

impl InMemoryCollection {
    /// Create a new empty collection.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a shared instance.
    pub fn shared(name: impl Into<String>) -> SharedCollection {
        Arc::new(Self::new(name))
    }

    fn write_entries(&self, entries: CollectionEntries, replace: bool) -> Result<()> {
        entries.validated_len()?;

        let mut stored = self
            .entries
            .write()
            .map_err(|e| StoreError::Collection(format!("Failed to acquire write lock: {}", e)))?;

        // Check the whole batch before touching anything
        for id in &entries.ids {
            match (replace, stored.contains_key(id)) {
                (false, true) => {
                    return Err(StoreError::Collection(format!(
                        "Id '{}' already exists in collection '{}'",
                        id, self.name
                    )));
                }
                (true, false) => return Err(StoreError::NotFound(id.clone())),
                _ => {}
            }
        }

        let CollectionEntries {
            ids,
            documents,
            metadatas,
            embeddings,
        } = entries;
        for (((id, document), metadata), embedding) in
            ids.into_iter().zip(documents).zip(metadatas).zip(embeddings)
        {
            stored.insert(
                id,
                StoredEntry {
                    document,
                    metadata,
                    embedding,
                },
            );
        }
        Ok(())
    }
}

impl Collection for InMemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn add(&self, entries: CollectionEntries) -> Result<()> {
        self.write_entries(entries, false)
    }

    fn update(&self, entries: CollectionEntries) -> Result<()> {
        self.write_entries(entries, true)
    }

    fn get(&self, ids: Option<&[String]>, include: &[Include]) -> Result<GetResult> {
        let stored = self
            .entries
            .read()
            .map_err(|e| StoreError::Collection(format!("Failed to acquire read lock: {}", e)))?;

        let matched: Vec<(&String, &StoredEntry)> = match ids {
            Some(ids) => ids
                .iter()
                .filter_map(|id| stored.get_key_value(id))
                .collect(),
            None => stored.iter().collect(),
        };

        let mut result = GetResult {
            ids: matched.iter().map(|(id, _)| (*id).clone()).collect(),
            ..Default::default()
        };
        if include.contains(&Include::Documents) {
            result.documents = Some(matched.iter().map(|(_, e)| e.document.clone()).collect());
        }
        if include.contains(&Include::Metadatas) {
            result.metadatas = Some(matched.iter().map(|(_, e)| e.metadata.clone()).collect());
        }
        if include.contains(&Include::Embeddings) {
            result.embeddings = Some(
                matched
                    .iter()
                    .map(|(_, e)| e.embedding.iter().map(|v| *v as f64).collect())
                    .collect(),
            );
        }
        Ok(result)
    }

    fn delete(&self, ids: &[String]) -> Result<()> {
        let mut stored = self
            .entries
            .write()
            .map_err(|e| StoreError::Collection(format!("Failed to acquire write lock: {}", e)))?;
        for id in ids {
            stored.remove(id);
        }
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        let stored = self
            .entries
            .read()
            .map_err(|e| StoreError::Collection(format!("Failed to acquire read lock: {}", e)))?;
        Ok(stored.len())
    }
}
