//! Error types for embedding synchronization.

use symsync_store::{StoreError, SymbolParseError};
use thiserror::Error;

/// Result type alias for synchronization operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors that can occur while processing a symbol.
///
/// Every error is local to the symbol being processed.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Error from the vector store, including `NotFound` and `AmbiguousKey`.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The symbol identity cannot be stored.
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(#[from] SymbolParseError),

    /// The builder returned no source text for the symbol.
    #[error("Symbol {0} has no source text")]
    EmptySource(String),

    /// The builder cannot construct this kind of record.
    #[error("Builder does not support {operation} (symbol {symbol})")]
    UnsupportedBuilder {
        /// The builder operation that was requested.
        operation: &'static str,
        /// Uri of the symbol being built.
        symbol: String,
    },

    /// The builder produced a record that does not match its input.
    #[error("Invalid record for {symbol}: {reason}")]
    InvalidRecord {
        /// Uri of the symbol being built.
        symbol: String,
        /// What was wrong with the record.
        reason: String,
    },

    /// The builder failed.
    #[error("Builder error: {0}")]
    Builder(String),
}

impl SyncError {
    /// Returns true if the error signals a broken store rather than a bad symbol.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            SyncError::Store(StoreError::AmbiguousKey { .. } | StoreError::InvalidData(_))
        )
    }
}
