//! symsync-store: Symbol embedding storage
//!
//! This crate provides the storage layer for symsync:
//! - Symbol identities (stable dotted path plus revision-carrying uri)
//! - Embedding records
//! - The `VectorStore` contract with a flat-file and a live-index backend

pub mod collection;
pub mod json_store;
pub mod record;
pub mod remote_store;
pub mod store;
pub mod symbols;

pub use collection::{
    Collection, CollectionEntries, CollectionMetadata, GetResult, InMemoryCollection, Include,
    SharedCollection,
};
pub use json_store::{FORMAT_VERSION, JsonVectorStore};
pub use record::{EmbeddingRecord, Metadata, MetadataValue};
pub use remote_store::{RemoteVectorStore, SYMBOL_URI_FIELD, quantize};
pub use store::{Result, SharedVectorStore, StoreError, VectorStore, check_record};
pub use symbols::{SymbolIdentity, SymbolKind, SymbolParseError, URI_SCHEME};
