//! Cross-crate integration tests
//!
//! These tests drive the synchronization handler against both store backends
//! through the public API, the way a reindex job would.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use symsync::{
    Backend, Config, EmbeddingBuilder, EmbeddingHandler, EmbeddingKind, Outcome, Reindexer,
    SyncError,
};
use symsync_store::{
    Collection, EmbeddingRecord, InMemoryCollection, Include, JsonVectorStore, SYMBOL_URI_FIELD,
    SharedVectorStore, SymbolIdentity, SymbolKind, VectorStore,
};

/// Builder over an in-memory project snapshot.
///
/// Vectors carry fractional parts so the remote backend's truncation is visible.
#[derive(Default)]
struct ProjectBuilder {
    sources: Mutex<HashMap<String, String>>,
    docs: bool,
}

impl ProjectBuilder {
    fn code() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn docs() -> Arc<Self> {
        Arc::new(Self {
            docs: true,
            ..Self::default()
        })
    }

    fn write(&self, path: &str, source: &str) {
        self.sources
            .lock()
            .unwrap()
            .insert(path.to_string(), source.to_string());
    }

    fn embed(source: &str, symbol: &SymbolIdentity) -> EmbeddingRecord {
        let len = source.len() as f32;
        let words = source.split_whitespace().count() as f32;
        EmbeddingRecord::new(symbol.clone(), vec![len + 0.75, words + 0.25, -len / 4.0], source)
            .with_metadata("kind", symbol.kind().as_str())
    }
}

impl EmbeddingBuilder for ProjectBuilder {
    fn fetch_source(&self, symbol: &SymbolIdentity) -> symsync::Result<Option<String>> {
        Ok(self
            .sources
            .lock()
            .unwrap()
            .get(symbol.dotted_path())
            .cloned())
    }

    fn build(&self, source: &str, symbol: &SymbolIdentity) -> symsync::Result<EmbeddingRecord> {
        Ok(Self::embed(source, symbol))
    }

    fn build_non_class(
        &self,
        source: &str,
        symbol: &SymbolIdentity,
    ) -> symsync::Result<EmbeddingRecord> {
        if !self.docs {
            return Err(SyncError::UnsupportedBuilder {
                operation: "build_non_class",
                symbol: symbol.uri(),
            });
        }
        Ok(Self::embed(source, symbol).with_metadata("non_class", true))
    }
}

fn sym(path: &str, kind: SymbolKind, revision: &str) -> SymbolIdentity {
    SymbolIdentity::new(path, kind, revision)
}

fn project() -> (Arc<ProjectBuilder>, Vec<SymbolIdentity>) {
    let builder = ProjectBuilder::code();
    builder.write("pkg.tools.search", "def search(query): return index.find(query)");
    builder.write("pkg.agent.Agent", "class Agent:\n    pass");
    builder.write("pkg.agent.Agent.run", "def run(self): return self.loop()");

    let symbols = vec![
        sym("pkg.tools.search", SymbolKind::Function, "c0ffee"),
        sym("pkg.agent.Agent", SymbolKind::Class, "c0ffee"),
        sym("pkg.agent.Agent.run", SymbolKind::Method, "c0ffee"),
    ];
    (builder, symbols)
}

fn keys(store: &SharedVectorStore) -> Vec<String> {
    store
        .ordered_records()
        .unwrap()
        .into_iter()
        .map(|r| r.dotted_path().to_string())
        .collect()
}

/// Reindex a project into a json store, change it, and reindex again.
#[test]
fn test_json_reindex_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default();
    let store = config
        .open_store(EmbeddingKind::Code, Some(dir.path()), None)
        .unwrap();

    let (builder, symbols) = project();
    let mut reindexer = Reindexer::with_options(
        EmbeddingHandler::code(store.clone(), builder.clone()),
        config.reindex_options(),
    );

    let report = reindexer.run(&symbols).unwrap();
    assert_eq!(report.created, 3);
    assert_eq!(
        keys(&store),
        vec!["pkg.agent.Agent", "pkg.agent.Agent.run", "pkg.tools.search"]
    );

    // New commit: one body changed, everything else only moved revision
    builder.write("pkg.agent.Agent.run", "def run(self): return self.loop(max_steps=10)");
    let next: Vec<_> = symbols.iter().map(|s| s.at_revision("beef01")).collect();
    let report = reindexer.run(&next).unwrap();
    assert_eq!(report.rebuilt, 1);
    assert_eq!(report.rolled_forward, 2);
    assert!(report.is_clean());

    // Everything was persisted to the configured file
    let path = config.resolve_path(EmbeddingKind::Code, Some(dir.path()));
    let reopened = JsonVectorStore::open(&path).unwrap();
    let records = reopened.ordered_records().unwrap();
    assert_eq!(records.len(), 3);
    for record in &records {
        assert_eq!(record.key.revision(), "beef01");
    }
    let run = reopened.get("pkg.agent.Agent.run").unwrap();
    assert_eq!(run.document, "def run(self): return self.loop(max_steps=10)");
    // The json backend keeps full precision
    assert_eq!(run.vector[0].fract(), 0.75);
}

/// The remote backend stores the wire shape and still round-trips typed records.
#[test]
fn test_remote_reindex_packs_records() {
    let mut config = Config::default();
    config.store.backend = Backend::Remote;

    let collection = Arc::new(InMemoryCollection::new("code-embeddings"));
    let store = config
        .open_store(EmbeddingKind::Code, None, Some(collection.clone()))
        .unwrap();

    let (builder, symbols) = project();
    let handler = EmbeddingHandler::code(store.clone(), builder.clone());
    for symbol in &symbols {
        assert_eq!(handler.process(symbol).unwrap(), Outcome::Created);
    }

    let raw = collection
        .get(
            Some(&["pkg.agent.Agent".to_string()]),
            &[Include::Metadatas, Include::Embeddings, Include::Documents],
        )
        .unwrap();
    assert_eq!(raw.ids, vec!["pkg.agent.Agent"]);
    let metadata = &raw.metadatas.as_ref().unwrap()[0];
    assert_eq!(metadata[SYMBOL_URI_FIELD], "symsync c0ffee class pkg.agent.Agent");
    assert_eq!(metadata["kind"], "class");
    for value in &raw.embeddings.as_ref().unwrap()[0] {
        assert_eq!(value.fract(), 0.0);
    }

    let record = handler.get_embedding(&symbols[1]).unwrap();
    assert_eq!(record.key, symbols[1]);
    assert_eq!(record.document, "class Agent:\n    pass");
    assert!(!record.metadata.contains_key(SYMBOL_URI_FIELD));

    // Reprocessing after truncation still compares by text and identity only
    for symbol in &symbols {
        assert_eq!(handler.process(symbol).unwrap(), Outcome::Passed);
    }
    assert_eq!(collection.count().unwrap(), 3);
}

/// Both backends end in the same logical state after the same history.
#[test]
fn test_backends_agree() {
    let dir = tempfile::tempdir().unwrap();
    let json: SharedVectorStore = Arc::new(JsonVectorStore::new(dir.path().join("code.json")));
    let remote: SharedVectorStore = Arc::new(symsync_store::RemoteVectorStore::new(
        InMemoryCollection::shared("code-embeddings"),
    ));

    let mut snapshots = Vec::new();
    for store in [json, remote] {
        let (builder, symbols) = project();
        let handler = EmbeddingHandler::code(store.clone(), builder.clone());

        for symbol in &symbols {
            handler.process(symbol).unwrap();
        }
        builder.write("pkg.tools.search", "def search(query, k=5): return index.find(query, k)");
        for symbol in &symbols {
            handler.process(&symbol.at_revision("d00d")).unwrap();
        }

        let snapshot: Vec<_> = store
            .ordered_records()
            .unwrap()
            .into_iter()
            .map(|r| (r.dotted_path().to_string(), r.key.uri(), r.document))
            .collect();
        snapshots.push(snapshot);
    }

    assert_eq!(snapshots[0], snapshots[1]);
    assert_eq!(snapshots[0].len(), 3);
}

/// Code and doc handlers run side by side over their own stores.
#[test]
fn test_code_and_doc_handlers() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default();
    let code_store = config
        .open_store(EmbeddingKind::Code, Some(dir.path()), None)
        .unwrap();
    let doc_store = config
        .open_store(EmbeddingKind::Doc, Some(dir.path()), None)
        .unwrap();

    let (code_builder, symbols) = project();
    let doc_builder = ProjectBuilder::docs();
    doc_builder.write("pkg.tools.search", "Search the index for a query.");
    doc_builder.write("pkg.agent.Agent", "An agent that loops over tools.");
    doc_builder.write("pkg.agent.Agent.run", "Run the agent loop.");

    let code = EmbeddingHandler::code(code_store.clone(), code_builder.clone());
    let docs = EmbeddingHandler::doc(doc_store.clone(), doc_builder.clone());

    for symbol in &symbols {
        code.process(symbol).unwrap();
        docs.process(symbol).unwrap();
    }

    let agent_doc = docs.get_embedding(&symbols[1]).unwrap();
    assert!(!agent_doc.metadata.contains_key("non_class"));
    let run_doc = docs.get_embedding(&symbols[2]).unwrap();
    assert!(run_doc.metadata.contains_key("non_class"));

    // Docs changed: the doc record rolls forward with its old vector,
    // the unchanged code record is left alone
    doc_builder.write("pkg.agent.Agent.run", "Run the agent loop until it terminates.");
    assert_eq!(docs.process(&symbols[2]).unwrap(), Outcome::RolledForward);
    assert_eq!(code.process(&symbols[2]).unwrap(), Outcome::Passed);

    let rolled = docs.get_embedding(&symbols[2]).unwrap();
    assert_eq!(rolled.document, "Run the agent loop until it terminates.");
    assert_eq!(rolled.vector, run_doc.vector);

    code_store.save().unwrap();
    doc_store.save().unwrap();
    assert!(dir.path().join("code_embeddings.json").exists());
    assert!(dir.path().join("doc_embeddings.json").exists());
}

/// A symbol without source fails alone; the rest of the batch still lands.
#[test]
fn test_missing_source_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let store: SharedVectorStore = Arc::new(JsonVectorStore::new(dir.path().join("code.json")));
    let (builder, mut symbols) = project();
    symbols.push(sym("pkg.tools.deleted", SymbolKind::Function, "c0ffee"));

    let mut reindexer = Reindexer::new(EmbeddingHandler::code(store.clone(), builder));
    let report = reindexer.run(&symbols).unwrap();

    assert_eq!(report.created, 3);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0].error, SyncError::EmptySource(_)));
    assert!(!store.contains("pkg.tools.deleted").unwrap());
}
