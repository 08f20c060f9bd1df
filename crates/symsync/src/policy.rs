//! Staleness policies for code and documentation embeddings.
//!
//! The handler runs one algorithm for both embedding kinds. A policy decides
//! whether an existing record is stale and how a missing record is first
//! built.

use std::fmt;

use serde::{Deserialize, Serialize};
use symsync_store::{EmbeddingRecord, SymbolIdentity};

use crate::builder::EmbeddingBuilder;
use crate::error::Result;

/// Which text an embedding is computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingKind {
    /// Embeddings of symbol source code
    Code,
    /// Embeddings of symbol documentation
    Doc,
}

impl EmbeddingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingKind::Code => "code",
            EmbeddingKind::Doc => "doc",
        }
    }
}

impl fmt::Display for EmbeddingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict on an existing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    /// The record matches the symbol and its source.
    Fresh,
    /// The record must be rebuilt, vector included.
    Rebuild,
    /// Key and document move forward, the vector is reused.
    RollForward,
}

/// Policy parameterizing the synchronization algorithm.
pub trait EmbeddingPolicy: Send + Sync {
    fn kind(&self) -> EmbeddingKind;

    /// Judge `existing` against the symbol's current identity and source text.
    fn assess(
        &self,
        existing: &EmbeddingRecord,
        source: &str,
        symbol: &SymbolIdentity,
    ) -> Staleness;

    /// Build the first record for a symbol that has none.
    fn build_fresh(
        &self,
        builder: &dyn EmbeddingBuilder,
        source: &str,
        symbol: &SymbolIdentity,
    ) -> Result<EmbeddingRecord>;
}

/// Source code embeddings. Any text change triggers a full rebuild.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodePolicy;

impl EmbeddingPolicy for CodePolicy {
    fn kind(&self) -> EmbeddingKind {
        EmbeddingKind::Code
    }

    fn assess(
        &self,
        existing: &EmbeddingRecord,
        source: &str,
        symbol: &SymbolIdentity,
    ) -> Staleness {
        if existing.document != source {
            Staleness::Rebuild
        } else if existing.key != *symbol {
            Staleness::RollForward
        } else {
            Staleness::Fresh
        }
    }

    fn build_fresh(
        &self,
        builder: &dyn EmbeddingBuilder,
        source: &str,
        symbol: &SymbolIdentity,
    ) -> Result<EmbeddingRecord> {
        builder.build(source, symbol)
    }
}

/// Documentation embeddings.
///
/// Identity or text drift only rolls the record forward: the vector is kept
/// even when the text changed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocPolicy;

impl EmbeddingPolicy for DocPolicy {
    fn kind(&self) -> EmbeddingKind {
        EmbeddingKind::Doc
    }

    fn assess(
        &self,
        existing: &EmbeddingRecord,
        source: &str,
        symbol: &SymbolIdentity,
    ) -> Staleness {
        if existing.key != *symbol || existing.document != source {
            Staleness::RollForward
        } else {
            Staleness::Fresh
        }
    }

    fn build_fresh(
        &self,
        builder: &dyn EmbeddingBuilder,
        source: &str,
        symbol: &SymbolIdentity,
    ) -> Result<EmbeddingRecord> {
        if symbol.kind().is_class() {
            builder.build(source, symbol)
        } else {
            builder.build_non_class(source, symbol)
        }
    }
}
