//! Mock embedding builder for testing.
//!
//! Sources are served from an in-memory map keyed by dotted path. Vectors are
//! derived from the text, so the same text always yields the same vector and
//! different texts yield different ones.

use std::collections::HashMap;
use std::sync::Mutex;

use symsync_store::{EmbeddingRecord, SymbolIdentity, SymbolKind};

use crate::builder::EmbeddingBuilder;
use crate::error::{Result, SyncError};

/// A builder method invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderCall {
    Build(String),
    BuildNonClass(String),
}

/// A configurable mock builder.
#[derive(Debug, Default)]
pub struct MockBuilder {
    sources: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<BuilderCall>>,
    non_class: bool,
    fail_builds: bool,
}

impl MockBuilder {
    /// Create a builder without non-class support.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a documentation builder that supports non-class symbols.
    pub fn with_non_class() -> Self {
        Self {
            non_class: true,
            ..Self::default()
        }
    }

    /// Make every build call fail.
    pub fn failing(mut self) -> Self {
        self.fail_builds = true;
        self
    }

    /// Set the source text served for `symbol`.
    pub fn set_source(&self, symbol: &SymbolIdentity, source: &str) {
        self.sources
            .lock()
            .unwrap()
            .insert(symbol.dotted_path().to_string(), source.to_string());
    }

    /// Stop serving source text for `symbol`.
    pub fn remove_source(&self, symbol: &SymbolIdentity) {
        self.sources.lock().unwrap().remove(symbol.dotted_path());
    }

    /// Every build call so far.
    pub fn calls(&self) -> Vec<BuilderCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of build calls so far.
    pub fn build_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn record(
        &self,
        call: BuilderCall,
        source: &str,
        symbol: &SymbolIdentity,
    ) -> Result<EmbeddingRecord> {
        self.calls.lock().unwrap().push(call);
        if self.fail_builds {
            return Err(SyncError::Builder(format!(
                "embedding provider unavailable for {}",
                symbol.dotted_path()
            )));
        }
        Ok(
            EmbeddingRecord::new(symbol.clone(), text_vector(source), source)
                .with_metadata("builder", "mock"),
        )
    }
}

impl EmbeddingBuilder for MockBuilder {
    fn fetch_source(&self, symbol: &SymbolIdentity) -> Result<Option<String>> {
        Ok(self
            .sources
            .lock()
            .unwrap()
            .get(symbol.dotted_path())
            .cloned())
    }

    fn build(&self, source: &str, symbol: &SymbolIdentity) -> Result<EmbeddingRecord> {
        self.record(
            BuilderCall::Build(symbol.dotted_path().to_string()),
            source,
            symbol,
        )
    }

    fn build_non_class(&self, source: &str, symbol: &SymbolIdentity) -> Result<EmbeddingRecord> {
        if !self.non_class {
            return Err(SyncError::UnsupportedBuilder {
                operation: "build_non_class",
                symbol: symbol.uri(),
            });
        }
        self.record(
            BuilderCall::BuildNonClass(symbol.dotted_path().to_string()),
            source,
            symbol,
        )
    }
}

/// Deterministic vector for a text: length, byte sum and a rolling hash.
pub fn text_vector(text: &str) -> Vec<f32> {
    let bytes = text.as_bytes();
    let sum: u64 = bytes.iter().map(|b| u64::from(*b)).sum();
    let hash = bytes
        .iter()
        .fold(7u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(*b)));
    vec![bytes.len() as f32, sum as f32, (hash % 10_007) as f32]
}

pub fn function(path: &str, revision: &str) -> SymbolIdentity {
    SymbolIdentity::new(path, SymbolKind::Function, revision)
}

pub fn method(path: &str, revision: &str) -> SymbolIdentity {
    SymbolIdentity::new(path, SymbolKind::Method, revision)
}

pub fn class(path: &str, revision: &str) -> SymbolIdentity {
    SymbolIdentity::new(path, SymbolKind::Class, revision)
}
