//! Configuration file support for symsync.
//!
//! All symsync data is stored in a `.symsync/` directory:
//! - `.symsync/config.toml` - Configuration file
//! - `.symsync/code_embeddings.json` - Code embedding store (json backend)
//! - `.symsync/doc_embeddings.json` - Documentation embedding store (json backend)
//! - `.symsync/logs/` - Log files
//!
//! Config discovery searches for `.symsync/config.toml` starting from a
//! directory and walking up to its parents.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use symsync_store::{JsonVectorStore, RemoteVectorStore, SharedCollection, SharedVectorStore};

use crate::policy::EmbeddingKind;
use crate::reindex::ReindexOptions;

/// The symsync data directory name.
pub const SYMSYNC_DIR: &str = ".symsync";
/// The config file name within the symsync directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Storage backend for embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// One JSON file per embedding kind, saved explicitly.
    Json,
    /// A live index collection per embedding kind.
    Remote,
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct Config {
    /// Embedding store settings.
    pub store: StoreConfig,
    /// Batch reindex settings.
    pub reindex: ReindexConfig,
}

/// Embedding store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Which backend to use.
    pub backend: Backend,
    /// Code embedding file, relative to `.symsync/` unless absolute.
    pub code_path: PathBuf,
    /// Documentation embedding file, relative to `.symsync/` unless absolute.
    pub doc_path: PathBuf,
    /// Collection name for code embeddings (remote backend).
    pub code_collection: String,
    /// Collection name for documentation embeddings (remote backend).
    pub doc_collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Json,
            code_path: PathBuf::from("code_embeddings.json"),
            doc_path: PathBuf::from("doc_embeddings.json"),
            code_collection: "code-embeddings".to_string(),
            doc_collection: "doc-embeddings".to_string(),
        }
    }
}

/// Batch reindex configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReindexConfig {
    /// Keep processing after a symbol fails.
    pub continue_on_error: bool,
}

impl Default for ReindexConfig {
    fn default() -> Self {
        Self {
            continue_on_error: true,
        }
    }
}

impl From<&ReindexConfig> for ReindexOptions {
    fn from(config: &ReindexConfig) -> Self {
        ReindexOptions {
            continue_on_error: config.continue_on_error,
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Find and load configuration starting from a specific directory.
    ///
    /// Looks for `.symsync/config.toml` in the directory and its parents.
    /// Returns the config and the `.symsync` directory it was found in.
    pub fn find_and_load_from(start: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut dir = start.to_path_buf();

        loop {
            let symsync_dir = dir.join(SYMSYNC_DIR);
            let config_path = symsync_dir.join(CONFIG_FILE);
            if config_path.exists() {
                let config = Self::from_file(&config_path)?;
                return Ok(Some((config, symsync_dir)));
            }

            if !dir.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Load configuration from `start` or its parents, or use defaults.
    pub fn load_or_default(start: &Path) -> Self {
        match Self::find_and_load_from(start) {
            Ok(Some((config, path))) => {
                tracing::info!("Loaded config from {}", path.display());
                config
            }
            Ok(None) => {
                tracing::debug!("No .symsync/config.toml found, using defaults");
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to load config: {:#}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Resolve a store path relative to the .symsync directory.
    pub fn resolve_path(&self, kind: EmbeddingKind, symsync_dir: Option<&Path>) -> PathBuf {
        let path = match kind {
            EmbeddingKind::Code => &self.store.code_path,
            EmbeddingKind::Doc => &self.store.doc_path,
        };

        if path.is_absolute() {
            path.clone()
        } else if let Some(dir) = symsync_dir {
            dir.join(path)
        } else {
            PathBuf::from(SYMSYNC_DIR).join(path)
        }
    }

    /// Collection name used for an embedding kind.
    pub fn collection_name(&self, kind: EmbeddingKind) -> &str {
        match kind {
            EmbeddingKind::Code => &self.store.code_collection,
            EmbeddingKind::Doc => &self.store.doc_collection,
        }
    }

    /// Open the vector store for an embedding kind.
    ///
    /// The remote backend writes through `client`, which must be provided and
    /// must be the collection configured for `kind`. The store is not loaded.
    pub fn open_store(
        &self,
        kind: EmbeddingKind,
        symsync_dir: Option<&Path>,
        client: Option<SharedCollection>,
    ) -> Result<SharedVectorStore> {
        match self.store.backend {
            Backend::Json => {
                let path = self.resolve_path(kind, symsync_dir);
                tracing::debug!("Using {} embedding file {}", kind, path.display());
                Ok(Arc::new(JsonVectorStore::new(path)))
            }
            Backend::Remote => {
                let Some(client) = client else {
                    bail!("The remote backend needs a collection client for {} embeddings", kind);
                };
                let expected = self.collection_name(kind);
                if client.name() != expected {
                    bail!(
                        "Collection '{}' does not match configured {} collection '{}'",
                        client.name(),
                        kind,
                        expected
                    );
                }
                Ok(Arc::new(RemoteVectorStore::new(client)))
            }
        }
    }

    /// Reindex options from the configuration.
    pub fn reindex_options(&self) -> ReindexOptions {
        ReindexOptions::from(&self.reindex)
    }
}

/// Configuration validation error.
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigValidationError {}

impl Config {
    /// Validate the configuration.
    ///
    /// Returns a list of validation errors if any are found.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        match self.store.backend {
            Backend::Json => {
                for (field, path) in [
                    ("store.code_path", &self.store.code_path),
                    ("store.doc_path", &self.store.doc_path),
                ] {
                    if path.as_os_str().is_empty() {
                        errors.push(ConfigValidationError {
                            field: field.to_string(),
                            message: "Embedding file path cannot be empty.".to_string(),
                        });
                    }
                }

                if !self.store.code_path.as_os_str().is_empty()
                    && self.store.code_path == self.store.doc_path
                {
                    errors.push(ConfigValidationError {
                        field: "store.doc_path".to_string(),
                        message: "Code and doc embeddings cannot share a file.".to_string(),
                    });
                }
            }
            Backend::Remote => {
                for (field, name) in [
                    ("store.code_collection", &self.store.code_collection),
                    ("store.doc_collection", &self.store.doc_collection),
                ] {
                    if name.trim().is_empty() {
                        errors.push(ConfigValidationError {
                            field: field.to_string(),
                            message: "Collection name cannot be empty.".to_string(),
                        });
                    }
                }

                if self.store.code_collection == self.store.doc_collection {
                    errors.push(ConfigValidationError {
                        field: "store.doc_collection".to_string(),
                        message: "Code and doc embeddings cannot share a collection.".to_string(),
                    });
                }
            }
        }

        errors
    }
}
