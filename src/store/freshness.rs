use super::memory_store::modified_at;
use super::MemoryStore;
use crate::domain::DocumentKind;
use anyhow::Result;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_STALE_TOLERANCE: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    Missing,
    Stale { behind_secs: u64 },
    Fresh,
}

impl Freshness {
    pub fn needs_rebuild(self) -> bool {
        !matches!(self, Freshness::Fresh)
    }
}

/// Compare the graph file against the conversation history.
///
/// The graph counts as stale once history was written more than `tolerance`
/// after the graph.
pub fn graph_freshness(
    store: &MemoryStore,
    graph_path: &Path,
    tolerance: Duration,
) -> Result<Freshness> {
    let Some(graph_time) = modified_at(graph_path)? else {
        return Ok(Freshness::Missing);
    };
    let Some(history_time) = store.modified(DocumentKind::History)? else {
        return Ok(Freshness::Fresh);
    };
    match history_time.duration_since(graph_time) {
        Ok(behind) if behind > tolerance => Ok(Freshness::Stale {
            behind_secs: behind.as_secs(),
        }),
        _ => Ok(Freshness::Fresh),
    }
}
