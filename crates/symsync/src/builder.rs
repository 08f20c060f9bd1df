//! The embedding builder capability.
//!
//! Builders sit on top of the source extraction layer and the embedding
//! provider. They are injected into the handler; nothing here computes
//! vectors itself.

use std::sync::Arc;

use symsync_store::{EmbeddingRecord, SymbolIdentity};

use crate::error::{Result, SyncError};

/// Supplies source text for symbols and builds fresh records from it.
pub trait EmbeddingBuilder: Send + Sync {
    /// Current source text for `symbol`. `None` means no source is available.
    fn fetch_source(&self, symbol: &SymbolIdentity) -> Result<Option<String>>;

    /// Build a fresh record, computing its vector from `source`.
    fn build(&self, source: &str, symbol: &SymbolIdentity) -> Result<EmbeddingRecord>;

    /// Build a fresh record for a symbol that is not a class.
    ///
    /// Only documentation builders provide this.
    fn build_non_class(&self, _source: &str, symbol: &SymbolIdentity) -> Result<EmbeddingRecord> {
        Err(SyncError::UnsupportedBuilder {
            operation: "build_non_class",
            symbol: symbol.uri(),
        })
    }
}

/// Thread-safe handle to a builder.
pub type SharedBuilder = Arc<dyn EmbeddingBuilder>;
