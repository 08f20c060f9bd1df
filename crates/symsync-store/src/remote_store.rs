//! Vector store backed by a live index collection.
//!
//! The collection cannot hold a typed symbol key, so the symbol uri is packed
//! into the reserved `symbol_uri` metadata field on write and parsed back on
//! read. Vectors are truncated to integers on write; the fractional part is
//! lost.

use serde_json::Value;
use tracing::debug;

use crate::collection::{
    CollectionEntries, CollectionMetadata, GetResult, Include, SharedCollection,
};
use crate::record::{EmbeddingRecord, Metadata, MetadataValue};
use crate::store::{Result, StoreError, VectorStore, check_record};
use crate::symbols::SymbolIdentity;

/// Metadata field holding the serialized symbol identity.
pub const SYMBOL_URI_FIELD: &str = "symbol_uri";

const ALL_COLUMNS: [Include; 3] = [Include::Documents, Include::Metadatas, Include::Embeddings];

/// Vector store writing through to a [`Collection`](crate::collection::Collection).
///
/// Every call is immediately durable, so `load` and `save` do nothing.
pub struct RemoteVectorStore {
    collection: SharedCollection,
}

impl RemoteVectorStore {
    pub fn new(collection: SharedCollection) -> Self {
        Self { collection }
    }

    /// Name of the underlying collection.
    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }

    fn fetch(&self, key: &str) -> Result<GetResult> {
        self.collection.get(Some(&[key.to_string()]), &ALL_COLUMNS)
    }
}

impl std::fmt::Debug for RemoteVectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteVectorStore")
            .field("collection", &self.collection.name())
            .finish()
    }
}

impl VectorStore for RemoteVectorStore {
    fn get(&self, key: &str) -> Result<EmbeddingRecord> {
        let result = self.fetch(key)?;
        match result.ids.len() {
            0 => Err(StoreError::NotFound(key.to_string())),
            1 => records_from_result(result)?
                .pop()
                .ok_or_else(|| StoreError::NotFound(key.to_string())),
            count => Err(StoreError::AmbiguousKey {
                key: key.to_string(),
                count,
            }),
        }
    }

    fn contains(&self, key: &str) -> Result<bool> {
        let result = self.collection.get(Some(&[key.to_string()]), &[])?;
        Ok(!result.ids.is_empty())
    }

    fn add(&self, record: EmbeddingRecord) -> Result<()> {
        debug!(
            "Adding {} to collection {}",
            record.dotted_path(),
            self.collection.name()
        );
        self.collection.add(to_entries(&record)?)
    }

    fn discard(&self, key: &str) -> Result<()> {
        self.collection.delete(&[key.to_string()])
    }

    fn update(&self, record: EmbeddingRecord) -> Result<()> {
        debug!(
            "Updating {} in collection {}",
            record.dotted_path(),
            self.collection.name()
        );
        self.collection.update(to_entries(&record)?)
    }

    fn clear(&self) -> Result<()> {
        let ids = self.collection.get(None, &[])?.ids;
        self.collection.delete(&ids)
    }

    fn ordered_records(&self) -> Result<Vec<EmbeddingRecord>> {
        let mut records = records_from_result(self.collection.get(None, &ALL_COLUMNS)?)?;
        records.sort_by(|a, b| a.dotted_path().cmp(b.dotted_path()));
        Ok(records)
    }

    fn len(&self) -> Result<usize> {
        self.collection.count()
    }

    fn load(&self) -> Result<()> {
        Ok(())
    }

    fn save(&self) -> Result<()> {
        Ok(())
    }
}

/// Truncate a vector toward zero for storage.
pub fn quantize(vector: &[f32]) -> Vec<i64> {
    vector.iter().map(|v| *v as i64).collect()
}

/// Convert a record to a single-entry batch, packing the symbol uri into metadata.
fn to_entries(record: &EmbeddingRecord) -> Result<CollectionEntries> {
    check_record(record)?;

    let mut metadata: CollectionMetadata = record
        .metadata
        .iter()
        .map(|(k, v)| (k.clone(), metadata_to_json(v)))
        .collect();
    metadata.insert(
        SYMBOL_URI_FIELD.to_string(),
        Value::String(record.key.uri()),
    );

    Ok(CollectionEntries {
        ids: vec![record.dotted_path().to_string()],
        documents: vec![record.document.clone()],
        metadatas: vec![metadata],
        embeddings: vec![quantize(&record.vector)],
    })
}

fn metadata_to_json(value: &MetadataValue) -> Value {
    match value {
        MetadataValue::Bool(b) => Value::Bool(*b),
        MetadataValue::Int(i) => Value::from(*i),
        MetadataValue::Float(f) => Value::from(*f),
        MetadataValue::Str(s) => Value::String(s.clone()),
    }
}

fn metadata_from_json(key: &str, value: Value) -> Result<MetadataValue> {
    match value {
        Value::Bool(b) => Ok(MetadataValue::Bool(b)),
        Value::String(s) => Ok(MetadataValue::Str(s)),
        Value::Number(n) => n
            .as_i64()
            .map(MetadataValue::Int)
            .or_else(|| n.as_f64().map(MetadataValue::Float))
            .ok_or_else(|| {
                StoreError::InvalidData(format!("Metadata '{}' is out of range: {}", key, n))
            }),
        other => Err(StoreError::InvalidData(format!(
            "Metadata '{}' is not a scalar: {}",
            key, other
        ))),
    }
}

/// Rebuild typed records from a loosely typed collection result.
fn records_from_result(result: GetResult) -> Result<Vec<EmbeddingRecord>> {
    let missing = |column: &str| StoreError::InvalidData(format!("Result is missing {}", column));
    let documents = result.documents.ok_or_else(|| missing("documents"))?;
    let metadatas = result.metadatas.ok_or_else(|| missing("metadatas"))?;
    let embeddings = result.embeddings.ok_or_else(|| missing("embeddings"))?;

    let len = result.ids.len();
    if documents.len() != len || metadatas.len() != len || embeddings.len() != len {
        return Err(StoreError::InvalidData(format!(
            "Result column lengths disagree with {} ids",
            len
        )));
    }

    result
        .ids
        .into_iter()
        .zip(documents)
        .zip(metadatas)
        .zip(embeddings)
        .map(|(((id, document), metadata), embedding)| {
            record_from_parts(id, document, metadata, embedding)
        })
        .collect()
}

fn record_from_parts(
    id: String,
    document: String,
    mut metadata: CollectionMetadata,
    embedding: Vec<f64>,
) -> Result<EmbeddingRecord> {
    let uri = match metadata.remove(SYMBOL_URI_FIELD) {
        Some(Value::String(uri)) => uri,
        Some(other) => {
            return Err(StoreError::InvalidData(format!(
                "Entry '{}' has a non-string {}: {}",
                id, SYMBOL_URI_FIELD, other
            )));
        }
        None => {
            return Err(StoreError::InvalidData(format!(
                "Entry '{}' is missing {}",
                id, SYMBOL_URI_FIELD
            )));
        }
    };

    let key = SymbolIdentity::parse_uri(&uri)?;
    if key.dotted_path() != id {
        return Err(StoreError::InvalidData(format!(
            "Entry '{}' carries the uri of '{}'",
            id,
            key.dotted_path()
        )));
    }

    let metadata = metadata
        .into_iter()
        .map(|(k, v)| {
            let value = metadata_from_json(&k, v)?;
            Ok((k, value))
        })
        .collect::<Result<Metadata>>()?;

    Ok(EmbeddingRecord {
        key,
        vector: embedding.into_iter().map(|v| v.trunc() as f32).collect(),
        document,
        metadata,
    })
}
