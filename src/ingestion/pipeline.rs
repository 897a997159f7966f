use super::builder::{BuildSummary, GraphBuilder};
use crate::config::GraphConfig;
use crate::domain::DocumentKind;
use crate::memory::{KnowledgeGraph, KnowledgeGraphWriter};
use crate::store::{graph_freshness, Freshness, MemoryStore};
use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

pub struct IngestionPipeline<'a> {
    store: &'a MemoryStore,
    config: &'a GraphConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct BuildOutcome {
    pub graph_path: PathBuf,
    #[serde(flatten)]
    pub summary: BuildSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefreshOutcome {
    pub freshness: Freshness,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rebuilt: Option<BuildOutcome>,
}

impl<'a> IngestionPipeline<'a> {
    pub fn new(store: &'a MemoryStore, config: &'a GraphConfig) -> Self {
        Self { store, config }
    }

    pub fn graph_path(&self) -> PathBuf {
        self.config.graph_path(self.store.root())
    }

    /// Rebuild the graph from the store's documents without writing it.
    pub fn build_graph(&self) -> Result<(KnowledgeGraph, BuildSummary)> {
        let documents = self
            .store
            .load_all(DocumentKind::graph_sources())
            .context("failed to load memory documents")?;
        let (mut graph, summary) = GraphBuilder::new(self.config).build(&documents)?;
        graph.set_updated(Utc::now());
        Ok((graph, summary))
    }

    /// Rebuild and overwrite the graph file.
    pub fn run(&self) -> Result<BuildOutcome> {
        let graph_path = self.graph_path();
        let (graph, summary) = self.build_graph()?;
        KnowledgeGraphWriter::save_to_path(&graph_path, &graph)?;
        info!(
            nodes = summary.nodes,
            edges = summary.edges,
            path = %graph_path.display(),
            "graph built"
        );
        Ok(BuildOutcome {
            graph_path,
            summary,
        })
    }

    /// Rebuild only if the graph is missing or lags history by more than
    /// `tolerance`.
    pub fn refresh(&self, tolerance: Duration) -> Result<RefreshOutcome> {
        let graph_path = self.graph_path();
        let freshness = graph_freshness(self.store, &graph_path, tolerance)?;
        if !freshness.needs_rebuild() {
            info!(path = %graph_path.display(), "graph is up to date");
            return Ok(RefreshOutcome {
                freshness,
                rebuilt: None,
            });
        }
        info!(?freshness, "graph is stale, rebuilding");
        let outcome = self.run()?;
        Ok(RefreshOutcome {
            freshness,
            rebuilt: Some(outcome),
        })
    }
}
