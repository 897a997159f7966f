use crate::domain::{NodeKind, RelationKind};
use crate::memory::KnowledgeGraph;
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedEntity {
    pub entity: String,
    pub weight: f64,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub relation: RelationKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct RelatedEntities {
    pub query: String,
    pub resolved: String,
    pub related: Vec<RelatedEntity>,
}

pub struct RelationQueryService<'a> {
    graph: &'a KnowledgeGraph,
}

impl<'a> RelationQueryService<'a> {
    pub fn new(graph: &'a KnowledgeGraph) -> Self {
        Self { graph }
    }

    /// Neighbours of `topic`, strongest first, ties by name.
    ///
    /// Returns `None` when no connected node matches the topic exactly or
    /// partially.
    pub fn related(&self, topic: &str, limit: usize) -> Option<RelatedEntities> {
        self.related_filtered(topic, limit, None)
    }

    pub fn filter_by_kind(
        &self,
        topic: &str,
        kind: RelationKind,
        limit: usize,
    ) -> Option<RelatedEntities> {
        self.related_filtered(topic, limit, Some(kind))
    }

    fn related_filtered(
        &self,
        topic: &str,
        limit: usize,
        relation: Option<RelationKind>,
    ) -> Option<RelatedEntities> {
        let resolved = self.graph.resolve_connected(topic)?;
        let related = self.neighbours_of(resolved, limit, relation);
        Some(RelatedEntities {
            query: topic.to_string(),
            resolved: resolved.to_string(),
            related,
        })
    }

    pub(crate) fn neighbours_of(
        &self,
        id: &str,
        limit: usize,
        relation: Option<RelationKind>,
    ) -> Vec<RelatedEntity> {
        let Some(links) = self.graph.neighbors(id) else {
            return Vec::new();
        };
        let mut related: Vec<RelatedEntity> = links
            .iter()
            .filter(|(_, link)| relation.map_or(true, |kind| link.relation == kind))
            .map(|(entity, link)| RelatedEntity {
                entity: entity.clone(),
                weight: link.weight,
                kind: self.graph.kind_of(entity),
                relation: link.relation,
            })
            .collect();
        related.sort_by(|a, b| by_weight_then_name(a.weight, &a.entity, b.weight, &b.entity));
        related.truncate(limit);
        related
    }
}

/// Descending weight, then ascending name.
pub(crate) fn by_weight_then_name(wa: f64, na: &str, wb: f64, nb: &str) -> Ordering {
    wb.partial_cmp(&wa)
        .unwrap_or(Ordering::Equal)
        .then_with(|| na.cmp(nb))
}
