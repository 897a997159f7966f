use super::graph::{GraphSnapshot, KnowledgeGraph};
use crate::error::GraphError;
use crate::store::{ensure_private_dir, write_private_atomic};
use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::Path;

pub struct KnowledgeGraphLoader;

impl KnowledgeGraphLoader {
    /// Load a built graph. A missing file is [`GraphError::NotBuilt`].
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<KnowledgeGraph> {
        let path = path.as_ref();
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(GraphError::NotBuilt(path.to_path_buf()).into());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to read graph from {:?}", path));
            }
        };
        let snapshot: GraphSnapshot = serde_json::from_str(&data)
            .with_context(|| format!("invalid graph JSON in {:?}", path))?;
        Ok(KnowledgeGraph::from_snapshot(snapshot))
    }
}

pub struct KnowledgeGraphWriter;

impl KnowledgeGraphWriter {
    /// Replace the graph file atomically, owner-readable only.
    pub fn save_to_path(path: impl AsRef<Path>, graph: &KnowledgeGraph) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                ensure_private_dir(parent)?;
            }
        }
        let data = serde_json::to_vec_pretty(&graph.snapshot())?;
        write_private_atomic(path, &data)
            .with_context(|| format!("failed to write graph to {:?}", path))?;
        Ok(())
    }
}
