//! The embedding synchronization engine.
//!
//! [`EmbeddingHandler::process`] brings the stored record for one symbol in
//! line with the symbol's current source text:
//!
//! 1. Fetch the source text. Empty text fails the symbol and writes nothing.
//! 2. No record yet: build one through the policy and add it (`Created`).
//! 3. Otherwise ask the policy whether the record is stale and rebuild it,
//!    roll it forward, or leave it alone.
//!
//! Replacement records are fully built before the store is touched, so a
//! failing builder never leaves a key without a record.

use std::fmt;

use symsync_store::{EmbeddingRecord, SharedVectorStore, SymbolIdentity, check_record};
use tracing::debug;

use crate::builder::SharedBuilder;
use crate::error::{Result, SyncError};
use crate::policy::{CodePolicy, DocPolicy, EmbeddingKind, EmbeddingPolicy, Staleness};

/// What processing did to a symbol's record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A new record was built and added.
    Created,
    /// The record was replaced by a freshly built one.
    Rebuilt,
    /// Key and document were moved forward, the vector was reused.
    RolledForward,
    /// Nothing changed.
    Passed,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Created => "created",
            Outcome::Rebuilt => "rebuilt",
            Outcome::RolledForward => "rolled-forward",
            Outcome::Passed => "passed",
        }
    }

    /// Returns true if the store was written.
    pub fn is_write(&self) -> bool {
        !matches!(self, Outcome::Passed)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keeps one vector store in sync with the symbols it embeds.
pub struct EmbeddingHandler<P: EmbeddingPolicy> {
    store: SharedVectorStore,
    builder: SharedBuilder,
    policy: P,
}

/// Handler for source code embeddings.
pub type CodeEmbeddingHandler = EmbeddingHandler<CodePolicy>;

/// Handler for documentation embeddings.
pub type DocEmbeddingHandler = EmbeddingHandler<DocPolicy>;

impl EmbeddingHandler<CodePolicy> {
    /// Create a handler for source code embeddings.
    pub fn code(store: SharedVectorStore, builder: SharedBuilder) -> Self {
        Self::new(store, builder, CodePolicy)
    }
}

impl EmbeddingHandler<DocPolicy> {
    /// Create a handler for documentation embeddings.
    pub fn doc(store: SharedVectorStore, builder: SharedBuilder) -> Self {
        Self::new(store, builder, DocPolicy)
    }
}

impl<P: EmbeddingPolicy> EmbeddingHandler<P> {
    pub fn new(store: SharedVectorStore, builder: SharedBuilder, policy: P) -> Self {
        Self {
            store,
            builder,
            policy,
        }
    }

    pub fn kind(&self) -> EmbeddingKind {
        self.policy.kind()
    }

    /// The store this handler writes to.
    pub fn store(&self) -> &SharedVectorStore {
        &self.store
    }

    /// Synchronize the stored record for `symbol` with its current source.
    pub fn process(&self, symbol: &SymbolIdentity) -> Result<Outcome> {
        symbol.check()?;

        let source = self
            .builder
            .fetch_source(symbol)?
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SyncError::EmptySource(symbol.uri()))?;

        let key = symbol.dotted_path();
        if !self.store.contains(key)? {
            let record = self.build_fresh(&source, symbol)?;
            self.store.add(record)?;
            debug!("Created {} embedding for {}", self.kind(), symbol);
            return Ok(Outcome::Created);
        }

        let existing = self.store.get(key)?;
        match self.policy.assess(&existing, &source, symbol) {
            Staleness::Fresh => {
                debug!("Passing for {}", symbol);
                Ok(Outcome::Passed)
            }
            Staleness::Rebuild => {
                debug!("Building a new {} embedding for {}", self.kind(), symbol);
                let record = self.build_fresh(&source, symbol)?;
                self.store.update(record)?;
                Ok(Outcome::Rebuilt)
            }
            Staleness::RollForward => {
                debug!(
                    "Rolling forward the {} embedding for {} to {}",
                    self.kind(),
                    existing.key,
                    symbol
                );
                self.store
                    .update(existing.rolled_forward(symbol.clone(), source))?;
                Ok(Outcome::RolledForward)
            }
        }
    }

    /// The stored record for `symbol`.
    pub fn get_embedding(&self, symbol: &SymbolIdentity) -> Result<EmbeddingRecord> {
        Ok(self.store.get(symbol.dotted_path())?)
    }

    /// Stored records for `symbols`, in input order.
    pub fn get_embeddings(&self, symbols: &[SymbolIdentity]) -> Result<Vec<EmbeddingRecord>> {
        symbols.iter().map(|s| self.get_embedding(s)).collect()
    }

    /// Every stored record, sorted by dotted path.
    pub fn ordered_embeddings(&self) -> Result<Vec<EmbeddingRecord>> {
        Ok(self.store.ordered_records()?)
    }

    fn build_fresh(&self, source: &str, symbol: &SymbolIdentity) -> Result<EmbeddingRecord> {
        let record = self
            .policy
            .build_fresh(self.builder.as_ref(), source, symbol)?;
        validate(&record, source, symbol)?;
        Ok(record)
    }
}

/// Reject builder output that would break store invariants.
fn validate(record: &EmbeddingRecord, source: &str, symbol: &SymbolIdentity) -> Result<()> {
    let reason = if record.key != *symbol {
        format!("record is keyed by {}", record.key)
    } else if record.vector.is_empty() {
        "vector is empty".to_string()
    } else if record.document != source {
        "document differs from the source text".to_string()
    } else if let Err(e) = check_record(record) {
        e.to_string()
    } else {
        return Ok(());
    };

    Err(SyncError::InvalidRecord {
        symbol: symbol.uri(),
        reason,
    })
}
