use super::query::{by_weight_then_name, RelatedEntity, RelationQueryService};
use crate::config::QueryLimits;
use crate::domain::{GraphNode, MemoryDocument};
use crate::memory::KnowledgeGraph;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectedTopic {
    pub entity: String,
    pub weight: f64,
}

/// A string from a memory document that mentions the topic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Excerpt {
    pub document: String,
    pub path: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopicContext {
    pub topic: String,
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node: Option<GraphNode>,
    pub sources: Vec<String>,
    pub related: Vec<RelatedEntity>,
    pub connected_topics: Vec<ConnectedTopic>,
    pub excerpts: Vec<Excerpt>,
    /// Filled only when nothing matched, as a hint.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub available_topics: Vec<String>,
}

const AVAILABLE_TOPICS_HINT: usize = 15;

/// Everything known about one topic: the node, its neighbours, the
/// neighbours of its strongest neighbours, and raw document mentions.
pub struct ContextAssembler<'a> {
    graph: &'a KnowledgeGraph,
    limits: &'a QueryLimits,
    documents: &'a [MemoryDocument],
}

impl<'a> ContextAssembler<'a> {
    pub fn new(graph: &'a KnowledgeGraph, limits: &'a QueryLimits) -> Self {
        Self {
            graph,
            limits,
            documents: &[],
        }
    }

    pub fn with_documents(mut self, documents: &'a [MemoryDocument]) -> Self {
        self.documents = documents;
        self
    }

    pub fn assemble(&self, topic: &str) -> TopicContext {
        let Some(resolved) = self.graph.resolve_node(topic) else {
            return TopicContext {
                topic: topic.trim().to_lowercase(),
                found: false,
                node: None,
                sources: Vec::new(),
                related: Vec::new(),
                connected_topics: Vec::new(),
                excerpts: Vec::new(),
                available_topics: self
                    .graph
                    .nodes()
                    .take(AVAILABLE_TOPICS_HINT)
                    .map(|(id, _)| id.clone())
                    .collect(),
            };
        };

        let node = self.graph.node(resolved).cloned();
        let sources = node.as_ref().map(|n| n.sources.clone()).unwrap_or_default();
        let related = RelationQueryService::new(self.graph).neighbours_of(
            resolved,
            self.limits.context_related,
            None,
        );
        let connected_topics = self.second_degree(resolved, &related);
        let excerpts = self.excerpts(resolved);

        TopicContext {
            topic: resolved.to_string(),
            found: true,
            node,
            sources,
            related,
            connected_topics,
            excerpts,
            available_topics: Vec::new(),
        }
    }

    fn second_degree(&self, topic: &str, related: &[RelatedEntity]) -> Vec<ConnectedTopic> {
        let direct: HashSet<&str> = related.iter().map(|r| r.entity.as_str()).collect();
        let mut best: BTreeMap<&str, f64> = BTreeMap::new();

        for hop in related.iter().take(self.limits.context_expand) {
            let Some(links) = self.graph.neighbors(&hop.entity) else {
                continue;
            };
            for (entity, link) in links {
                if entity == topic || direct.contains(entity.as_str()) {
                    continue;
                }
                let inferred = link.weight * self.limits.second_degree_decay;
                best.entry(entity.as_str())
                    .and_modify(|weight| *weight = weight.max(inferred))
                    .or_insert(inferred);
            }
        }

        let mut connected: Vec<ConnectedTopic> = best
            .into_iter()
            .map(|(entity, weight)| ConnectedTopic {
                entity: entity.to_string(),
                weight,
            })
            .collect();
        connected.sort_by(|a, b| by_weight_then_name(a.weight, &a.entity, b.weight, &b.entity));
        connected.truncate(self.limits.context_connected);
        connected
    }

    fn excerpts(&self, topic: &str) -> Vec<Excerpt> {
        let mut found = Vec::new();
        for document in self.documents {
            if found.len() >= self.limits.excerpts {
                break;
            }
            collect_mentions(
                &document.body,
                "$",
                topic,
                document.file_name(),
                self.limits,
                &mut found,
            );
        }
        found
    }
}

fn collect_mentions(
    value: &Value,
    path: &str,
    topic: &str,
    document: &str,
    limits: &QueryLimits,
    found: &mut Vec<Excerpt>,
) {
    if found.len() >= limits.excerpts {
        return;
    }
    match value {
        Value::String(text) if text.to_lowercase().contains(topic) => {
            found.push(Excerpt {
                document: document.to_string(),
                path: path.to_string(),
                text: truncate_chars(text, limits.excerpt_chars),
            });
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                collect_mentions(item, &format!("{}[{}]", path, index), topic, document, limits, found);
            }
        }
        Value::Object(fields) => {
            for (key, item) in fields {
                collect_mentions(item, &format!("{}.{}", path, key), topic, document, limits, found);
            }
        }
        _ => {}
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DocumentKind, NodeKind, RelationKind};
    use serde_json::json;

    fn sample() -> KnowledgeGraph {
        let mut graph = KnowledgeGraph::new();
        for id in ["voice", "speech", "whisper", "latency", "gpu", "cuda"] {
            graph.add_node(id, NodeKind::Keyword, Some("history.json"), None);
        }
        graph.add_edge("voice", "speech", 4.0, RelationKind::CoOccurrence).unwrap();
        graph.add_edge("voice", "whisper", 2.0, RelationKind::CoOccurrence).unwrap();
        graph.add_edge("speech", "latency", 3.0, RelationKind::CoOccurrence).unwrap();
        graph.add_edge("whisper", "latency", 5.0, RelationKind::CoOccurrence).unwrap();
        graph.add_edge("whisper", "gpu", 1.0, RelationKind::CoOccurrence).unwrap();
        graph.add_edge("speech", "whisper", 1.0, RelationKind::CoOccurrence).unwrap();
        graph.add_edge("gpu", "cuda", 9.0, RelationKind::CoOccurrence).unwrap();
        graph
    }

    #[test]
    fn second_degree_topics_are_decayed_and_deduplicated() {
        let graph = sample();
        let limits = QueryLimits::default();
        let context = ContextAssembler::new(&graph, &limits).assemble("voice");

        assert!(context.found);
        assert_eq!(context.sources, vec!["history.json"]);
        let related: Vec<_> = context.related.iter().map(|r| r.entity.as_str()).collect();
        assert_eq!(related, vec!["speech", "whisper"]);

        // latency is reached through both neighbours; the stronger path wins.
        // cuda is three hops away and never appears.
        assert_eq!(
            context.connected_topics,
            vec![
                ConnectedTopic { entity: "latency".into(), weight: 2.5 },
                ConnectedTopic { entity: "gpu".into(), weight: 0.5 },
            ]
        );
    }

    #[test]
    fn unmatched_topic_lists_available_topics() {
        let graph = sample();
        let limits = QueryLimits::default();
        let context = ContextAssembler::new(&graph, &limits).assemble("kubernetes");
        assert!(!context.found);
        assert!(context.node.is_none());
        assert_eq!(context.available_topics.len(), 6);
    }

    #[test]
    fn excerpts_come_from_documents_mentioning_the_topic() {
        let graph = sample();
        let limits = QueryLimits {
            excerpt_chars: 12,
            ..QueryLimits::default()
        };
        let documents = vec![MemoryDocument::new(
            DocumentKind::History,
            json!({
                "conversations": [
                    { "summary": "Tuned Whisper for lower latency on the laptop", "tags": ["voice"] },
                    { "summary": "nothing relevant" }
                ]
            }),
        )];
        let context = ContextAssembler::new(&graph, &limits)
            .with_documents(&documents)
            .assemble("whisper");

        assert_eq!(
            context.excerpts,
            vec![Excerpt {
                document: "history.json".into(),
                path: "$.conversations[0].summary".into(),
                text: "Tuned Whispe...".into(),
            }]
        );
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll...");
        assert_eq!(truncate_chars("short", 10), "short");
    }
}
