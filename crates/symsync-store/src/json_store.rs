//! Flat-file vector store.
//!
//! The whole store lives in memory between [`VectorStore::load`] and
//! [`VectorStore::save`]. Saving rewrites the file as one JSON document:
//!
//! ```json
//! {"version": 1, "records": {"pkg.mod.f": {"key": "...", "vector": [...], ...}}}
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::record::EmbeddingRecord;
use crate::store::{Result, StoreError, VectorStore, check_record};

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    records: BTreeMap<String, EmbeddingRecord>,
}

/// Vector store persisted to a single JSON file.
#[derive(Debug)]
pub struct JsonVectorStore {
    path: PathBuf,
    records: RwLock<BTreeMap<String, EmbeddingRecord>>,
}

impl JsonVectorStore {
    /// Create an empty store backed by `path`. Nothing is read until `load`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create a store and load its file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(path);
        store.load()?;
        Ok(store)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, EmbeddingRecord>>> {
        self.records
            .read()
            .map_err(|e| StoreError::InvalidData(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, EmbeddingRecord>>> {
        self.records
            .write()
            .map_err(|e| StoreError::InvalidData(format!("Failed to acquire write lock: {}", e)))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl VectorStore for JsonVectorStore {
    fn get(&self, key: &str) -> Result<EmbeddingRecord> {
        self.read()?
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.read()?.contains_key(key))
    }

    fn add(&self, record: EmbeddingRecord) -> Result<()> {
        check_record(&record)?;
        let key = record.dotted_path().to_string();
        if self.write()?.insert(key.clone(), record).is_some() {
            warn!("Replaced existing embedding for {}", key);
        }
        Ok(())
    }

    fn discard(&self, key: &str) -> Result<()> {
        self.write()?.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.write()?.clear();
        Ok(())
    }

    fn ordered_records(&self) -> Result<Vec<EmbeddingRecord>> {
        // BTreeMap iterates in key order
        Ok(self.read()?.values().cloned().collect())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    fn load(&self) -> Result<()> {
        if !self.path.exists() {
            debug!(
                "No embedding file at {}, starting empty",
                self.path.display()
            );
            self.write()?.clear();
            return Ok(());
        }

        let content = fs::read_to_string(&self.path)?;
        let file: StoreFile = serde_json::from_str(&content)?;
        if file.version != FORMAT_VERSION {
            return Err(StoreError::InvalidData(format!(
                "Unsupported embedding file version {} in {} (expected {})",
                file.version,
                self.path.display(),
                FORMAT_VERSION
            )));
        }

        for (key, record) in &file.records {
            if key != record.dotted_path() {
                return Err(StoreError::InvalidData(format!(
                    "Record stored under '{}' belongs to '{}'",
                    key,
                    record.dotted_path()
                )));
            }
        }

        info!(
            "Loaded {} embeddings from {}",
            file.records.len(),
            self.path.display()
        );
        *self.write()? = file.records;
        Ok(())
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = StoreFile {
            version: FORMAT_VERSION,
            records: self.read()?.clone(),
        };
        let json = serde_json::to_string(&file)?;

        // Write to a sibling file first so a crash never leaves a partial store
        let temp = self.temp_path();
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.path)?;

        info!(
            "Saved {} embeddings to {}",
            file.records.len(),
            self.path.display()
        );
        Ok(())
    }
}
