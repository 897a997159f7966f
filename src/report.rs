//! Plain-text renderings of command results for terminal use.

use crate::ingestion::{BuildOutcome, RefreshOutcome};
use crate::reasoning::{
    ConnectionSuggestion, ExplanationStep, GraphStats, RelatedEntities, TopicContext,
};
use crate::store::{Freshness, InitReport};
use std::collections::BTreeMap;
use std::fmt::Write as _;

const RULE_WIDTH: usize = 50;
const COMMON_SHOWN: usize = 5;

pub fn init_report(report: &InitReport) -> String {
    let mut out = format!("Memory store: {}\n", report.root.display());
    for kind in &report.created {
        let _ = writeln!(out, "  created {}", kind.file_name());
    }
    for kind in &report.kept {
        let _ = writeln!(out, "  kept    {}", kind.file_name());
    }
    out
}

pub fn build_outcome(outcome: &BuildOutcome) -> String {
    let mut out = String::from("Graph built successfully!\n");
    let _ = writeln!(out, "  Nodes: {}", outcome.summary.nodes);
    let _ = writeln!(out, "  Edges: {}", outcome.summary.edges);
    for (document, records) in &outcome.summary.records {
        let _ = writeln!(out, "  {}: {} records", document, records);
    }
    let _ = writeln!(out, "  Saved to: {}", outcome.graph_path.display());
    out
}

pub fn refresh_outcome(outcome: &RefreshOutcome) -> String {
    let reason = match outcome.freshness {
        Freshness::Missing => "graph missing".to_string(),
        Freshness::Stale { behind_secs } => {
            format!("history is {}s newer than the graph", behind_secs)
        }
        Freshness::Fresh => return "Graph is up to date.\n".to_string(),
    };
    let mut out = format!("Rebuilding: {}\n", reason);
    if let Some(rebuilt) = &outcome.rebuilt {
        out.push_str(&build_outcome(rebuilt));
    }
    out
}

pub fn related(query: &str, result: Option<&RelatedEntities>, hint: &[String]) -> String {
    let Some(result) = result.filter(|result| !result.related.is_empty()) else {
        let mut out = format!("No entities found related to '{}'\n", query);
        if !hint.is_empty() {
            let _ = writeln!(out, "Try one of these entities: {}", hint.join(", "));
        }
        return out;
    };

    let mut out = format!("Entities related to '{}':\n", result.resolved);
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');
    for item in &result.related {
        let _ = writeln!(
            out,
            "  {:<25} (weight: {:.1}, type: {})",
            item.entity, item.weight, item.kind
        );
    }
    out
}

pub fn context(context: &TopicContext) -> String {
    if !context.found {
        let mut out = format!("No information found about '{}'\n", context.topic);
        if !context.available_topics.is_empty() {
            let _ = writeln!(out, "Available topics: {}", context.available_topics.join(", "));
        }
        return out;
    }

    let mut out = format!("=== Context for '{}' ===\n", context.topic);
    if let Some(node) = &context.node {
        let _ = writeln!(out, "\nType: {}", node.kind);
        if !node.metadata.is_empty() {
            let metadata = serde_json::to_string_pretty(&node.metadata).unwrap_or_default();
            let _ = writeln!(out, "Metadata: {}", metadata);
        }
    }
    if !context.sources.is_empty() {
        let _ = writeln!(out, "\nFound in: {}", context.sources.join(", "));
    }
    if !context.related.is_empty() {
        let _ = writeln!(out, "\nDirectly related ({} items):", context.related.len());
        for item in &context.related {
            let _ = writeln!(out, "  - {} ({}, weight: {:.1})", item.entity, item.kind, item.weight);
        }
    }
    if !context.connected_topics.is_empty() {
        let _ = writeln!(
            out,
            "\nSecond-degree connections ({} items):",
            context.connected_topics.len()
        );
        for item in &context.connected_topics {
            let _ = writeln!(out, "  - {} (inferred weight: {:.1})", item.entity, item.weight);
        }
    }
    if !context.excerpts.is_empty() {
        out.push_str("\nMentions:\n");
        for excerpt in &context.excerpts {
            let _ = writeln!(out, "  [{} {}] {}", excerpt.document, excerpt.path, excerpt.text);
        }
    }
    out
}

pub fn suggestions(suggestions: &[ConnectionSuggestion]) -> String {
    if suggestions.is_empty() {
        return "No connection suggestions found.\n".to_string();
    }
    let mut out = String::from("=== Suggested Connections ===\n");
    out.push_str("These items share common connections but aren't directly linked:\n\n");
    for (index, suggestion) in suggestions.iter().enumerate() {
        let shown: Vec<&str> = suggestion
            .common_connections
            .iter()
            .take(COMMON_SHOWN)
            .map(String::as_str)
            .collect();
        let _ = writeln!(
            out,
            "{}. {} <-> {}\n   Types: {} / {}\n   Common connections: {}\n",
            index + 1,
            suggestion.entity1,
            suggestion.entity2,
            suggestion.type1,
            suggestion.type2,
            shown.join(", ")
        );
    }
    out
}

pub fn stats(stats: &GraphStats) -> String {
    let mut out = String::from("=== Knowledge Graph Statistics ===\n\n");
    let _ = writeln!(out, "Total nodes: {}", stats.total_nodes);
    let _ = writeln!(out, "Total edges: {}", stats.total_edges);
    let _ = writeln!(out, "Total weight: {:.1}", stats.total_weight);
    match stats.updated {
        Some(updated) => {
            let _ = writeln!(out, "Last updated: {}", updated.to_rfc3339());
        }
        None => out.push_str("Last updated: never\n"),
    }
    out.push_str("\nNodes by type:\n");
    for (kind, count) in &stats.nodes_by_type {
        let _ = writeln!(out, "  {}: {}", kind, count);
    }
    if !stats.hubs.is_empty() {
        out.push_str("\nMost connected:\n");
        for hub in &stats.hubs {
            let _ = writeln!(out, "  {} ({} links)", hub.entity, hub.degree);
        }
    }
    out
}

pub fn entity_list(groups: &BTreeMap<String, Vec<String>>) -> String {
    let mut out = String::from("=== All Entities ===\n");
    for (kind, entities) in groups {
        let _ = writeln!(out, "\n{}:", kind.to_uppercase());
        for entity in entities {
            let _ = writeln!(out, "  - {}", entity);
        }
    }
    out
}

pub fn explanation(from: &str, to: &str, path: Option<&[ExplanationStep]>) -> String {
    match path {
        None => format!("No path found between '{}' and '{}'\n", from, to),
        Some([]) => format!("'{}' and '{}' are the same topic\n", from, to),
        Some(steps) => {
            let mut out = format!("Path from '{}' to '{}' ({} hops):\n", from, to, steps.len());
            for step in steps {
                let _ = writeln!(
                    out,
                    "  {} -[{}, {:.1}]-> {}",
                    step.from, step.relation, step.weight, step.to
                );
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NodeKind, RelationKind};
    use crate::reasoning::RelatedEntity;

    #[test]
    fn related_lists_entities_with_weights() {
        let result = RelatedEntities {
            query: "pyth".to_string(),
            resolved: "python".to_string(),
            related: vec![RelatedEntity {
                entity: "sqlite".to_string(),
                weight: 2.0,
                kind: NodeKind::Tool,
                relation: RelationKind::CoOccurrence,
            }],
        };
        let text = related("pyth", Some(&result), &[]);
        assert!(text.starts_with("Entities related to 'python':"));
        assert!(text.contains("sqlite"));
        assert!(text.contains("(weight: 2.0, type: tool)"));
    }

    #[test]
    fn related_miss_offers_a_hint() {
        let hint = vec!["docker".to_string(), "python".to_string()];
        let text = related("rust", None, &hint);
        assert!(text.contains("No entities found related to 'rust'"));
        assert!(text.contains("docker, python"));
    }

    #[test]
    fn explanation_variants() {
        assert!(explanation("a", "b", None).starts_with("No path found"));
        assert!(explanation("a", "a", Some(&[])).contains("same topic"));
        let steps = vec![ExplanationStep {
            from: "bot".to_string(),
            to: "telegram".to_string(),
            relation: RelationKind::Tagged,
            weight: 2.0,
        }];
        let text = explanation("bot", "telegram", Some(&steps));
        assert!(text.contains("bot -[tagged, 2.0]-> telegram"));
    }

    #[test]
    fn empty_suggestions_say_so() {
        assert_eq!(suggestions(&[]), "No connection suggestions found.\n");
    }
}
