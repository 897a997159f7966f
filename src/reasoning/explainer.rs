use crate::domain::RelationKind;
use crate::memory::KnowledgeGraph;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplanationStep {
    pub from: String,
    pub to: String,
    pub relation: RelationKind,
    pub weight: f64,
}

/// Finds the shortest chain of edges linking two topics.
pub struct PathExplainer<'a> {
    graph: &'a KnowledgeGraph,
}

impl<'a> PathExplainer<'a> {
    pub fn new(graph: &'a KnowledgeGraph) -> Self {
        Self { graph }
    }

    /// Breadth-first search from `from` to `to`, at most `max_depth` hops.
    /// Neighbours are visited in name order, so equally short paths resolve
    /// the same way every time. A topic explains itself with an empty path.
    pub fn explain(&self, from: &str, to: &str, max_depth: usize) -> Option<Vec<ExplanationStep>> {
        if max_depth == 0 {
            return None;
        }
        let start = self.graph.resolve_node(from)?;
        let target = self.graph.resolve_node(to)?;
        if start == target {
            return Some(Vec::new());
        }

        let mut parents: HashMap<&str, &str> = HashMap::new();
        let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
        parents.insert(start, start);
        queue.push_back((start, 0));

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            let Some(links) = self.graph.neighbors(current) else {
                continue;
            };
            for next in links.keys() {
                let next = next.as_str();
                if parents.contains_key(next) {
                    continue;
                }
                parents.insert(next, current);
                if next == target {
                    return Some(self.materialize(&parents, start, target));
                }
                queue.push_back((next, depth + 1));
            }
        }
        None
    }

    fn materialize(&self, parents: &HashMap<&str, &str>, start: &str, target: &str) -> Vec<ExplanationStep> {
        let mut steps = Vec::new();
        let mut current = target;
        while current != start {
            let previous = parents[current];
            if let Some(link) = self.graph.link(previous, current) {
                steps.push(ExplanationStep {
                    from: previous.to_string(),
                    to: current.to_string(),
                    relation: link.relation,
                    weight: link.weight,
                });
            }
            current = previous;
        }
        steps.reverse();
        steps
    }
}
