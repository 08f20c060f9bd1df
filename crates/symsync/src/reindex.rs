//! Batch reindexing over all symbols of a project.
//!
//! A reindex pass loads the store, processes symbols one at a time and saves
//! the store at the end. Failures are local to their symbol; they are
//! collected in the report and the pass moves on unless configured to stop.

use std::collections::BTreeMap;

use symsync_store::SymbolIdentity;
use tracing::{info, warn};

use crate::error::{Result, SyncError};
use crate::handler::{EmbeddingHandler, Outcome};
use crate::policy::EmbeddingPolicy;

/// Options for a reindex pass.
#[derive(Debug, Clone)]
pub struct ReindexOptions {
    /// Keep going after a symbol fails.
    pub continue_on_error: bool,
}

impl Default for ReindexOptions {
    fn default() -> Self {
        Self {
            continue_on_error: true,
        }
    }
}

/// A symbol that could not be processed.
#[derive(Debug)]
pub struct SymbolFailure {
    pub symbol: SymbolIdentity,
    pub error: SyncError,
}

/// Summary of a reindex pass.
#[derive(Debug, Default)]
pub struct ReindexReport {
    pub created: usize,
    pub rebuilt: usize,
    pub rolled_forward: usize,
    pub passed: usize,
    pub failures: Vec<SymbolFailure>,
    /// True if the pass stopped before processing every symbol.
    pub aborted: bool,
}

impl ReindexReport {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Created => self.created += 1,
            Outcome::Rebuilt => self.rebuilt += 1,
            Outcome::RolledForward => self.rolled_forward += 1,
            Outcome::Passed => self.passed += 1,
        }
    }

    /// Number of symbols processed successfully.
    pub fn succeeded(&self) -> usize {
        self.created + self.rebuilt + self.rolled_forward + self.passed
    }

    /// Number of records written to the store.
    pub fn written(&self) -> usize {
        self.created + self.rebuilt + self.rolled_forward
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.aborted
    }

    /// Outcome counts keyed by outcome name.
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        BTreeMap::from([
            (Outcome::Created.as_str(), self.created),
            (Outcome::Rebuilt.as_str(), self.rebuilt),
            (Outcome::RolledForward.as_str(), self.rolled_forward),
            (Outcome::Passed.as_str(), self.passed),
        ])
    }
}

/// Drives a handler over a batch of symbols.
///
/// Holding the reindexer mutably serializes batches on the same handler.
pub struct Reindexer<P: EmbeddingPolicy> {
    handler: EmbeddingHandler<P>,
    options: ReindexOptions,
}

impl<P: EmbeddingPolicy> Reindexer<P> {
    pub fn new(handler: EmbeddingHandler<P>) -> Self {
        Self::with_options(handler, ReindexOptions::default())
    }

    pub fn with_options(handler: EmbeddingHandler<P>, options: ReindexOptions) -> Self {
        Self { handler, options }
    }

    pub fn handler(&self) -> &EmbeddingHandler<P> {
        &self.handler
    }

    pub fn into_handler(self) -> EmbeddingHandler<P> {
        self.handler
    }

    /// Process every symbol, persisting the store once at the end.
    ///
    /// Only store `load`/`save` failures fail the whole pass. The initial
    /// `load` drops unsaved changes held by a file-backed store.
    pub fn run<'a, I>(&mut self, symbols: I) -> Result<ReindexReport>
    where
        I: IntoIterator<Item = &'a SymbolIdentity>,
    {
        let store = self.handler.store().clone();
        store.load()?;

        let mut report = ReindexReport::default();
        for symbol in symbols {
            match self.handler.process(symbol) {
                Ok(outcome) => report.record(outcome),
                Err(error) => {
                    warn!("Failed to process {}: {}", symbol, error);
                    report.failures.push(SymbolFailure {
                        symbol: symbol.clone(),
                        error,
                    });
                    if !self.options.continue_on_error {
                        report.aborted = true;
                        break;
                    }
                }
            }
        }

        // Progress made before a failure is kept
        store.save()?;

        info!(
            "Reindexed {} embeddings: {} created, {} rebuilt, {} rolled forward, {} passed, {} failed",
            self.handler.kind(),
            report.created,
            report.rebuilt,
            report.rolled_forward,
            report.passed,
            report.failures.len()
        );
        Ok(report)
    }
}
