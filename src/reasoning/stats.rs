use crate::memory::KnowledgeGraph;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

const HUB_COUNT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hub {
    pub entity: String,
    pub degree: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub total_weight: f64,
    pub nodes_by_type: BTreeMap<String, usize>,
    pub hubs: Vec<Hub>,
    pub updated: Option<DateTime<Utc>>,
}

impl GraphStats {
    pub fn collect(graph: &KnowledgeGraph) -> Self {
        let mut nodes_by_type = BTreeMap::new();
        for (_, node) in graph.nodes() {
            *nodes_by_type.entry(node.kind.to_string()).or_insert(0) += 1;
        }

        let mut hubs: Vec<Hub> = graph
            .nodes()
            .map(|(id, _)| Hub {
                entity: id.clone(),
                degree: graph.degree(id),
            })
            .filter(|hub| hub.degree > 0)
            .collect();
        hubs.sort_by(|a, b| b.degree.cmp(&a.degree).then_with(|| a.entity.cmp(&b.entity)));
        hubs.truncate(HUB_COUNT);

        Self {
            total_nodes: graph.node_count(),
            total_edges: graph.edge_count(),
            total_weight: graph.total_weight(),
            nodes_by_type,
            hubs,
            updated: graph.updated(),
        }
    }
}

/// Every entity, grouped by type, each group sorted.
pub fn entities_by_type(graph: &KnowledgeGraph) -> BTreeMap<String, Vec<String>> {
    let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (id, node) in graph.nodes() {
        groups.entry(node.kind.to_string()).or_default().push(id.clone());
    }
    for entities in groups.values_mut() {
        entities.sort();
    }
    groups
}
