//! symsync: Symbol embedding synchronization
//!
//! This crate keeps stored symbol embeddings consistent with source text:
//! - Builder abstraction supplying source text and fresh records
//! - Code and documentation staleness policies
//! - The per-symbol synchronization handler
//! - Batch reindexing with per-symbol failure reporting
//! - Configuration and logging setup

pub mod builder;
pub mod config;
pub mod error;
pub mod handler;
pub mod logging;
pub mod policy;
pub mod reindex;


pub use builder::{EmbeddingBuilder, SharedBuilder};
pub use config::{Backend, Config, ConfigValidationError, ReindexConfig, StoreConfig};
pub use error::{Result, SyncError};
pub use handler::{CodeEmbeddingHandler, DocEmbeddingHandler, EmbeddingHandler, Outcome};
pub use policy::{CodePolicy, DocPolicy, EmbeddingKind, EmbeddingPolicy, Staleness};
pub use reindex::{ReindexOptions, ReindexReport, Reindexer, SymbolFailure};

pub use symsync_store as store;
