use crate::domain::{GraphEdge, GraphNode, NodeKind, RelationKind};
use crate::error::GraphError;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// The persisted form of a graph: nodes by identifier and each undirected
/// edge once, with `source < target`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: BTreeMap<String, GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
}

/// One side of an undirected edge as seen from a node's adjacency list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Link {
    pub weight: f64,
    pub co_occurrences: u32,
    pub relation: RelationKind,
}

/// Weighted undirected concept graph.
///
/// Adjacency is kept symmetric: `a -> b` and `b -> a` always carry the same
/// link. Both maps are ordered so every traversal and every tie-break is
/// deterministic.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    nodes: BTreeMap<String, GraphNode>,
    adjacency: BTreeMap<String, BTreeMap<String, Link>>,
    updated: Option<DateTime<Utc>>,
}

impl KnowledgeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the in-memory graph from a snapshot.
    ///
    /// Edges that would break the graph's invariants (self-loops, unknown
    /// endpoints, negative or non-finite weights) are dropped with a warning.
    /// An edge listed twice is merged.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Self {
        let mut graph = Self {
            nodes: snapshot.nodes,
            adjacency: BTreeMap::new(),
            updated: snapshot.updated,
        };
        for edge in snapshot.edges {
            if edge.source == edge.target {
                warn!(node = %edge.source, "dropping self-loop from snapshot");
                continue;
            }
            if let Err(err) = graph.check_edge(&edge.source, &edge.target, edge.weight) {
                warn!(error = %err, "dropping edge from snapshot");
                continue;
            }
            graph.accumulate(
                &edge.source,
                &edge.target,
                edge.weight,
                edge.co_occurrences,
                edge.relation,
            );
        }
        graph
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        let mut edges = Vec::with_capacity(self.edge_count());
        for (source, links) in &self.adjacency {
            for (target, link) in links.iter().filter(|(target, _)| *target > source) {
                edges.push(GraphEdge {
                    source: source.clone(),
                    target: target.clone(),
                    relation: link.relation,
                    weight: link.weight,
                    co_occurrences: link.co_occurrences,
                });
            }
        }
        GraphSnapshot {
            nodes: self.nodes.clone(),
            edges,
            updated: self.updated,
        }
    }

    /// Insert a node or bump an existing one.
    ///
    /// The first kind an entity is seen with is kept. Every call counts
    /// towards the node's frequency, records `source`, and merges `metadata`.
    pub fn add_node(
        &mut self,
        id: &str,
        kind: NodeKind,
        source: Option<&str>,
        metadata: Option<BTreeMap<String, Value>>,
    ) -> &GraphNode {
        let node = self
            .nodes
            .entry(id.to_string())
            .or_insert_with(|| GraphNode::new(kind));
        node.frequency += 1;
        if let Some(source) = source {
            node.record_source(source);
        }
        if let Some(metadata) = metadata {
            node.merge_metadata(metadata);
        }
        node
    }

    /// Add `weight` to the undirected edge between `a` and `b`, creating it
    /// if needed. A pair of identical endpoints is ignored.
    pub fn add_edge(&mut self, a: &str, b: &str, weight: f64, relation: RelationKind) -> Result<()> {
        if a == b {
            return Ok(());
        }
        self.check_edge(a, b, weight)?;
        self.accumulate(a, b, weight, 1, relation);
        Ok(())
    }

    fn check_edge(&self, a: &str, b: &str, weight: f64) -> Result<(), GraphError> {
        if !weight.is_finite() || weight < 0.0 {
            return Err(GraphError::InvalidWeight {
                left: a.to_string(),
                right: b.to_string(),
                weight,
            });
        }
        for endpoint in [a, b] {
            if !self.nodes.contains_key(endpoint) {
                return Err(GraphError::UnknownEndpoint(endpoint.to_string()));
            }
        }
        Ok(())
    }

    fn accumulate(&mut self, a: &str, b: &str, weight: f64, count: u32, relation: RelationKind) {
        let link = {
            let entry = self
                .adjacency
                .entry(a.to_string())
                .or_default()
                .entry(b.to_string())
                .or_insert(Link {
                    weight: 0.0,
                    co_occurrences: 0,
                    relation,
                });
            entry.weight += weight;
            entry.co_occurrences = entry.co_occurrences.saturating_add(count);
            *entry
        };
        self.adjacency
            .entry(b.to_string())
            .or_default()
            .insert(a.to_string(), link);
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&String, &GraphNode)> {
        self.nodes.iter()
    }

    pub fn kind_of(&self, id: &str) -> NodeKind {
        self.nodes.get(id).map(|node| node.kind).unwrap_or_default()
    }

    pub fn neighbors(&self, id: &str) -> Option<&BTreeMap<String, Link>> {
        self.adjacency.get(id).filter(|links| !links.is_empty())
    }

    pub fn link(&self, a: &str, b: &str) -> Option<&Link> {
        self.adjacency.get(a).and_then(|links| links.get(b))
    }

    pub fn is_connected(&self, a: &str, b: &str) -> bool {
        self.link(a, b).is_some()
    }

    pub fn degree(&self, id: &str) -> usize {
        self.adjacency.get(id).map_or(0, BTreeMap::len)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeMap::len).sum::<usize>() / 2
    }

    pub fn total_weight(&self) -> f64 {
        self.adjacency
            .values()
            .flat_map(|links| links.values())
            .map(|link| link.weight)
            .sum::<f64>()
            / 2.0
    }

    pub fn updated(&self) -> Option<DateTime<Utc>> {
        self.updated
    }

    pub fn set_updated(&mut self, at: DateTime<Utc>) {
        self.updated = Some(at);
    }

    /// Resolve a topic to a node that has at least one edge: exact match
    /// first, then the first node (in identifier order) whose identifier
    /// contains the topic or is contained in it.
    pub fn resolve_connected(&self, topic: &str) -> Option<&str> {
        resolve(
            self.adjacency
                .iter()
                .filter(|(_, links)| !links.is_empty())
                .map(|(id, _)| id.as_str()),
            topic,
        )
    }

    /// Like [`resolve_connected`](Self::resolve_connected), over every node.
    pub fn resolve_node(&self, topic: &str) -> Option<&str> {
        resolve(self.nodes.keys().map(String::as_str), topic)
    }
}

fn resolve<'a>(mut candidates: impl Iterator<Item = &'a str> + Clone, topic: &str) -> Option<&'a str> {
    let topic = topic.trim().to_lowercase();
    if topic.is_empty() {
        return None;
    }
    if let Some(exact) = candidates.clone().find(|id| *id == topic) {
        return Some(exact);
    }
    candidates.find(|id| id.contains(topic.as_str()) || topic.contains(*id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(nodes: &[&str]) -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();
        for id in nodes {
            graph.add_node(id, NodeKind::Keyword, None, None);
        }
        graph
    }

    #[test]
    fn edges_are_symmetric_and_accumulate() {
        let mut graph = graph_with(&["python", "sqlite"]);
        graph
            .add_edge("python", "sqlite", 1.0, RelationKind::CoOccurrence)
            .unwrap();
        graph
            .add_edge("sqlite", "python", 1.5, RelationKind::Tagged)
            .unwrap();

        let forward = graph.link("python", "sqlite").unwrap();
        let backward = graph.link("sqlite", "python").unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward.weight, 2.5);
        assert_eq!(forward.co_occurrences, 2);
        assert_eq!(forward.relation, RelationKind::CoOccurrence);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.total_weight(), 2.5);
    }

    #[test]
    fn duplicated_snapshot_edge_counts_saturate() {
        let mut nodes = BTreeMap::new();
        for id in ["a1", "b1"] {
            nodes.insert(id.to_string(), GraphNode::new(NodeKind::Keyword));
        }
        let edge = |co_occurrences| GraphEdge {
            source: "a1".to_string(),
            target: "b1".to_string(),
            relation: RelationKind::CoOccurrence,
            weight: 1.0,
            co_occurrences,
        };
        let graph = KnowledgeGraph::from_snapshot(GraphSnapshot {
            nodes,
            edges: vec![edge(u32::MAX), edge(1)],
            updated: None,
        });

        let link = graph.link("a1", "b1").unwrap();
        assert_eq!(link.co_occurrences, u32::MAX);
        assert_eq!(link.weight, 2.0);
        assert_eq!(graph.link("b1", "a1"), Some(link));
    }

    #[test]
    fn self_loops_are_ignored() {
        let mut graph = graph_with(&["bot"]);
        graph.add_edge("bot", "bot", 1.0, RelationKind::CoOccurrence).unwrap();
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.neighbors("bot").is_none());
    }

    #[test]
    fn invalid_weights_and_unknown_endpoints_are_rejected() {
        let mut graph = graph_with(&["a1", "b1"]);
        let err = graph
            .add_edge("a1", "b1", -1.0, RelationKind::CoOccurrence)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GraphError>(),
            Some(GraphError::InvalidWeight { .. })
        ));
        assert!(graph
            .add_edge("a1", "b1", f64::NAN, RelationKind::CoOccurrence)
            .is_err());
        let err = graph
            .add_edge("a1", "ghost", 1.0, RelationKind::CoOccurrence)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GraphError>(),
            Some(GraphError::UnknownEndpoint(id)) if id == "ghost"
        ));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn first_kind_wins_and_frequency_counts_insertions() {
        let mut graph = KnowledgeGraph::new();
        graph.add_node("moltbook", NodeKind::Project, Some("projects.json"), None);
        graph.add_node("moltbook", NodeKind::Service, Some("history.json"), None);
        let node = graph.node("moltbook").unwrap();
        assert_eq!(node.kind, NodeKind::Project);
        assert_eq!(node.frequency, 2);
        assert_eq!(node.sources, vec!["projects.json", "history.json"]);
    }

    #[test]
    fn snapshot_lists_each_edge_once_in_order() {
        let mut graph = graph_with(&["alpha", "beta", "gamma"]);
        graph.add_edge("gamma", "alpha", 1.0, RelationKind::CoOccurrence).unwrap();
        graph.add_edge("beta", "alpha", 2.0, RelationKind::Tagged).unwrap();
        let snapshot = graph.snapshot();
        let pairs: Vec<_> = snapshot
            .edges
            .iter()
            .map(|edge| (edge.source.as_str(), edge.target.as_str()))
            .collect();
        assert_eq!(pairs, vec![("alpha", "beta"), ("alpha", "gamma")]);

        let restored = KnowledgeGraph::from_snapshot(snapshot.clone());
        assert_eq!(restored.snapshot(), snapshot);
    }

    #[test]
    fn loading_drops_edges_that_break_invariants() {
        let mut graph = graph_with(&["alpha", "beta"]);
        graph.add_edge("alpha", "beta", 1.0, RelationKind::CoOccurrence).unwrap();
        let mut snapshot = graph.snapshot();
        snapshot.edges.push(GraphEdge {
            source: "alpha".into(),
            target: "missing".into(),
            relation: RelationKind::CoOccurrence,
            weight: 1.0,
            co_occurrences: 1,
        });
        snapshot.edges.push(GraphEdge {
            source: "beta".into(),
            target: "beta".into(),
            relation: RelationKind::CoOccurrence,
            weight: 1.0,
            co_occurrences: 1,
        });
        let restored = KnowledgeGraph::from_snapshot(snapshot);
        assert_eq!(restored.edge_count(), 1);
        assert!(restored.neighbors("missing").is_none());
    }

    #[test]
    fn resolution_prefers_exact_then_first_partial() {
        let mut graph = graph_with(&["claude-chat", "chat", "telegram-claude-bot", "lonely"]);
        graph.add_edge("claude-chat", "telegram-claude-bot", 1.0, RelationKind::CoOccurrence).unwrap();
        graph.add_edge("chat", "telegram-claude-bot", 1.0, RelationKind::CoOccurrence).unwrap();

        assert_eq!(graph.resolve_connected("Chat"), Some("chat"));
        assert_eq!(graph.resolve_connected("claude"), Some("claude-chat"));
        assert_eq!(graph.resolve_connected("lonely"), None);
        assert_eq!(graph.resolve_node("lonely"), Some("lonely"));
        assert_eq!(graph.resolve_node("   "), None);
    }
}
