use crate::domain::NodeKind;
use crate::memory::KnowledgeGraph;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectionSuggestion {
    pub entity1: String,
    pub entity2: String,
    pub type1: NodeKind,
    pub type2: NodeKind,
    pub common_connections: Vec<String>,
    pub strength: usize,
}

/// Proposes links between nodes that share neighbours but are not yet
/// connected themselves.
pub struct ConnectionSuggester<'a> {
    graph: &'a KnowledgeGraph,
}

impl<'a> ConnectionSuggester<'a> {
    pub fn new(graph: &'a KnowledgeGraph) -> Self {
        Self { graph }
    }

    /// Pairs with at least `min_common` shared neighbours, strongest first,
    /// ties by the pair's names.
    pub fn suggest(&self, min_common: usize, limit: usize) -> Vec<ConnectionSuggestion> {
        let min_common = min_common.max(1);
        let ids: Vec<&str> = self.graph.nodes().map(|(id, _)| id.as_str()).collect();
        let neighbour_sets: Vec<BTreeSet<&str>> = ids
            .iter()
            .map(|id| {
                self.graph
                    .neighbors(id)
                    .map(|links| links.keys().map(String::as_str).collect())
                    .unwrap_or_default()
            })
            .collect();

        let mut suggestions = Vec::new();
        for (i, first) in ids.iter().enumerate() {
            let first_neighbours = &neighbour_sets[i];
            if first_neighbours.len() < min_common {
                continue;
            }
            for (j, second) in ids.iter().enumerate().skip(i + 1) {
                if first_neighbours.contains(second) {
                    continue;
                }
                let second_neighbours = &neighbour_sets[j];
                if second_neighbours.len() < min_common {
                    continue;
                }
                let common: Vec<String> = first_neighbours
                    .intersection(second_neighbours)
                    .map(|id| id.to_string())
                    .collect();
                if common.len() >= min_common {
                    suggestions.push(ConnectionSuggestion {
                        entity1: first.to_string(),
                        entity2: second.to_string(),
                        type1: self.graph.kind_of(first),
                        type2: self.graph.kind_of(second),
                        strength: common.len(),
                        common_connections: common,
                    });
                }
            }
        }

        suggestions.sort_by(|a, b| {
            b.strength
                .cmp(&a.strength)
                .then_with(|| a.entity1.cmp(&b.entity1))
                .then_with(|| a.entity2.cmp(&b.entity2))
        });
        suggestions.truncate(limit);
        suggestions
    }
}
