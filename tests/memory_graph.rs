use brain_graph::config::GraphConfig;
use brain_graph::domain::{DocumentKind, NodeKind, RelationKind};
use brain_graph::ingestion::IngestionPipeline;
use brain_graph::memory::KnowledgeGraphLoader;
use brain_graph::reasoning::{
    entities_by_type, ConnectionSuggester, ContextAssembler, GraphStats, PathExplainer,
    RelationQueryService,
};
use brain_graph::store::MemoryStore;
use brain_graph::GraphError;
use serde_json::json;
use std::fs;
use std::path::Path;

fn write_document(store: &MemoryStore, kind: DocumentKind, body: serde_json::Value) {
    fs::write(store.document_path(kind), serde_json::to_vec_pretty(&body).unwrap()).unwrap();
}

fn populated_store(root: &Path) -> MemoryStore {
    let store = MemoryStore::new(root);
    store.init().unwrap();
    write_document(
        &store,
        DocumentKind::Context,
        json!({
            "user": { "preferences": ["short telegram replies"] },
            "facts": ["Telegram bot streams voice replies"]
        }),
    );
    write_document(
        &store,
        DocumentKind::History,
        json!({
            "conversations": [{
                "date": "2024-05-02",
                "summary": "Added encryption to the memory store",
                "tags": ["security"]
            }]
        }),
    );
    write_document(
        &store,
        DocumentKind::Projects,
        json!({
            "projects": {
                "second-brain": {
                    "path": "~/code/second-brain",
                    "status": "active",
                    "description": "Electron app with sqlite storage",
                    "notes": ["add encryption"]
                }
            }
        }),
    );
    store
}

#[test]
fn read_verbs_require_a_built_graph() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new(dir.path());
    let config = GraphConfig::default();
    let path = IngestionPipeline::new(&store, &config).graph_path();

    let err = KnowledgeGraphLoader::load_from_path(&path).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<GraphError>(),
        Some(GraphError::NotBuilt(missing)) if missing == &path
    ));
}

#[test]
fn build_then_query_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = populated_store(dir.path());
    let config = GraphConfig::default();

    let outcome = IngestionPipeline::new(&store, &config).run().unwrap();
    assert_eq!(outcome.summary.records["history.json"], 1);
    assert_eq!(outcome.summary.records["projects.json"], 1);

    let graph = KnowledgeGraphLoader::load_from_path(&outcome.graph_path).unwrap();
    assert_eq!(graph.node_count(), outcome.summary.nodes);
    assert_eq!(graph.edge_count(), outcome.summary.edges);
    assert_eq!(graph.node("telegram").unwrap().kind, NodeKind::Service);
    assert_eq!(graph.node("second-brain").unwrap().kind, NodeKind::Project);

    let related = RelationQueryService::new(&graph)
        .related("second", 10)
        .unwrap();
    assert_eq!(related.resolved, "second-brain");
    let names: Vec<&str> = related.related.iter().map(|r| r.entity.as_str()).collect();
    for expected in ["electron", "sqlite", "encryption"] {
        assert!(names.contains(&expected), "missing {expected} in {names:?}");
    }
    let weights: Vec<f64> = related.related.iter().map(|r| r.weight).collect();
    assert!(weights.windows(2).all(|pair| pair[0] >= pair[1]));

    let notes = RelationQueryService::new(&graph)
        .filter_by_kind("second-brain", RelationKind::ProjectNote, 10)
        .unwrap();
    assert!(notes
        .related
        .iter()
        .all(|r| r.relation == RelationKind::ProjectNote));
}

#[test]
fn context_reports_neighbours_and_mentions() {
    let dir = tempfile::tempdir().unwrap();
    let store = populated_store(dir.path());
    let config = GraphConfig::default();
    let (graph, _) = IngestionPipeline::new(&store, &config).build_graph().unwrap();
    let documents = store.load_all(DocumentKind::all()).unwrap();

    let context = ContextAssembler::new(&graph, &config.limits)
        .with_documents(&documents)
        .assemble("Encryption");
    assert!(context.found);
    assert_eq!(context.topic, "encryption");
    assert!(context.sources.contains(&"history.json".to_string()));
    assert!(context.related.iter().any(|r| r.entity == "security"));
    assert!(context
        .excerpts
        .iter()
        .any(|e| e.document == "history.json" && e.path == "$.conversations[0].summary"));

    let missing = ContextAssembler::new(&graph, &config.limits).assemble("kubernetes");
    assert!(!missing.found);
    assert!(!missing.available_topics.is_empty());
}

#[test]
fn reasoning_over_a_built_graph() {
    let dir = tempfile::tempdir().unwrap();
    let store = populated_store(dir.path());
    let config = GraphConfig::default();
    let (graph, _) = IngestionPipeline::new(&store, &config).build_graph().unwrap();

    for suggestion in ConnectionSuggester::new(&graph).suggest(2, 20) {
        assert!(!graph.is_connected(&suggestion.entity1, &suggestion.entity2));
        assert!(suggestion.strength >= 2);
    }

    let path = PathExplainer::new(&graph)
        .explain("second-brain", "security", 4)
        .unwrap();
    assert_eq!(path.len(), 2);
    assert_eq!(path[0].from, "second-brain");
    assert_eq!(path[1].to, "security");

    let stats = GraphStats::collect(&graph);
    assert_eq!(stats.total_nodes, graph.node_count());
    assert_eq!(stats.nodes_by_type["project"], 1);
    assert!(stats.hubs.len() <= 5);

    let groups = entities_by_type(&graph);
    assert_eq!(groups["tag"], vec!["security".to_string()]);
}

#[test]
fn init_is_idempotent_and_private() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("memory");
    let store = MemoryStore::new(&root);

    let first = store.init().unwrap();
    assert_eq!(first.created.len(), DocumentKind::all().len());
    write_document(&store, DocumentKind::Goals, json!({ "goals": ["ship it"] }));

    let second = store.init().unwrap();
    assert!(second.created.is_empty());
    assert_eq!(second.kept.len(), DocumentKind::all().len());
    let goals = store.load(DocumentKind::Goals).unwrap();
    assert_eq!(goals.body["goals"][0], json!("ship it"));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let dir_mode = fs::metadata(&root).unwrap().permissions().mode() & 0o777;
        assert_eq!(dir_mode, 0o700);
        for kind in DocumentKind::all() {
            let mode = fs::metadata(store.document_path(*kind))
                .unwrap()
                .permissions()
                .mode()
                & 0o777;
            assert_eq!(mode, 0o600, "{}", kind.file_name());
        }
    }
}
