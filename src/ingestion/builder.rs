use super::extractor::{EntityExtractor, Extracted};
use crate::config::{BuildWeights, GraphConfig};
use crate::domain::{DocumentKind, MemoryDocument, NodeKind, RelationKind};
use crate::memory::KnowledgeGraph;
use anyhow::Result;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// What a build saw, per document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildSummary {
    pub nodes: usize,
    pub edges: usize,
    pub records: BTreeMap<String, usize>,
}

/// Turns memory documents into a fresh graph.
pub struct GraphBuilder<'a> {
    config: &'a GraphConfig,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(config: &'a GraphConfig) -> Self {
        Self { config }
    }

    /// Build from scratch. Documents may arrive in any order; they are
    /// always applied as context, history, projects, reminders.
    pub fn build(&self, documents: &[MemoryDocument]) -> Result<(KnowledgeGraph, BuildSummary)> {
        let find = |kind: DocumentKind| documents.iter().find(|doc| doc.kind == kind);

        let project_names: Vec<String> = find(DocumentKind::Projects)
            .and_then(|doc| doc.body.get("projects"))
            .and_then(Value::as_object)
            .map(|projects| projects.keys().cloned().collect())
            .unwrap_or_default();
        let extractor = EntityExtractor::new(&self.config.extraction)?
            .with_known_projects(project_names.iter().map(String::as_str))?;

        let mut pass = BuildPass {
            graph: KnowledgeGraph::new(),
            extractor,
            weights: &self.config.weights,
            summary: BuildSummary::default(),
        };

        for kind in DocumentKind::graph_sources() {
            let Some(document) = find(*kind) else {
                continue;
            };
            let records = match kind {
                DocumentKind::Context => pass.context(document)?,
                DocumentKind::History => pass.history(document)?,
                DocumentKind::Projects => pass.projects(document)?,
                DocumentKind::Reminders => pass.reminders(document)?,
                DocumentKind::Goals => 0,
            };
            debug!(document = %kind, records, "applied document");
            pass.summary.records.insert(kind.file_name().to_string(), records);
        }

        pass.summary.nodes = pass.graph.node_count();
        pass.summary.edges = pass.graph.edge_count();
        Ok((pass.graph, pass.summary))
    }
}

struct BuildPass<'a> {
    graph: KnowledgeGraph,
    extractor: EntityExtractor,
    weights: &'a BuildWeights,
    summary: BuildSummary,
}

impl BuildPass<'_> {
    fn context(&mut self, document: &MemoryDocument) -> Result<usize> {
        let source = document.file_name();
        let mut records = 0;
        let preferences = document
            .body
            .get("user")
            .and_then(|user| user.get("preferences"));
        for text in string_items(preferences) {
            let items = self.extractor.extract(text);
            self.add_nodes(&items, source, None);
            self.connect_pairwise(&items, self.weights.preference)?;
            records += 1;
        }
        for text in string_items(document.body.get("facts")) {
            let items = self.extractor.extract(text);
            self.add_nodes(&items, source, None);
            self.connect_pairwise(&items, self.weights.fact)?;
            records += 1;
        }
        Ok(records)
    }

    fn history(&mut self, document: &MemoryDocument) -> Result<usize> {
        let source = document.file_name();
        let mut records = 0;
        let conversations = document
            .body
            .get("conversations")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for conversation in conversations {
            let summary = conversation.get("summary").and_then(Value::as_str).unwrap_or("");
            let date = conversation.get("date").and_then(Value::as_str).unwrap_or("");
            let tags: Vec<String> = string_items(conversation.get("tags"))
                .map(|tag| tag.trim().to_lowercase())
                .filter(|tag| !tag.is_empty())
                .collect();

            let mut items = self.extractor.extract_entities(summary);
            items.extend(tags.iter().map(|tag| Extracted::new(tag.clone(), NodeKind::Tag)));
            items.extend(self.extractor.extract_keywords(summary));

            let metadata = (!date.is_empty()).then(|| metadata_of([("date", date)]));
            self.add_nodes(&items, source, metadata);
            self.connect_pairwise(&items, self.weights.conversation)?;

            // Tags are items too, so tags of one conversation link to each other.
            for tag in &tags {
                for item in &items {
                    self.graph
                        .add_edge(tag, &item.id, self.weights.tag, RelationKind::Tagged)?;
                }
            }
            records += 1;
        }
        Ok(records)
    }

    fn projects(&mut self, document: &MemoryDocument) -> Result<usize> {
        let source = document.file_name();
        let Some(projects) = document.body.get("projects").and_then(Value::as_object) else {
            return Ok(0);
        };

        for (name, info) in projects {
            let project = name.trim().to_lowercase();
            if project.is_empty() {
                continue;
            }
            let mut metadata = BTreeMap::new();
            for key in ["path", "status"] {
                if let Some(value) = info.get(key).filter(|value| !value.is_null()) {
                    metadata.insert(key.to_string(), value.clone());
                }
            }
            self.graph
                .add_node(&project, NodeKind::Project, Some(source), Some(metadata));

            let description = info.get("description").and_then(Value::as_str).unwrap_or("");
            let items = self.extractor.extract(description);
            self.add_nodes(&items, source, None);
            self.link_to(&project, &items, self.weights.project_description, RelationKind::ProjectDescription)?;

            for note in string_items(info.get("notes")) {
                let items = self.extractor.extract(note);
                self.add_nodes(&items, source, None);
                self.link_to(&project, &items, self.weights.project_note, RelationKind::ProjectNote)?;
            }
        }
        Ok(projects.len())
    }

    fn reminders(&mut self, document: &MemoryDocument) -> Result<usize> {
        let source = document.file_name();
        let mut records = 0;
        let reminders = document
            .body
            .get("reminders")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for reminder in reminders {
            let text = reminder.get("text").and_then(Value::as_str).unwrap_or("");
            let date = reminder.get("date").and_then(Value::as_str).unwrap_or("");
            let items = self.extractor.extract(text);
            let metadata = (!date.is_empty()).then(|| metadata_of([("reminder_date", date)]));
            self.add_nodes(&items, source, metadata);
            self.connect_pairwise(&items, self.weights.reminder)?;
            records += 1;
        }
        Ok(records)
    }

    fn add_nodes(
        &mut self,
        items: &[Extracted],
        source: &str,
        metadata: Option<BTreeMap<String, Value>>,
    ) {
        for item in items {
            self.graph
                .add_node(&item.id, item.kind, Some(source), metadata.clone());
        }
    }

    /// Every pair `(i, j)` with `i < j`, duplicates included.
    fn connect_pairwise(&mut self, items: &[Extracted], weight: f64) -> Result<()> {
        for (i, first) in items.iter().enumerate() {
            for second in &items[i + 1..] {
                self.graph
                    .add_edge(&first.id, &second.id, weight, RelationKind::CoOccurrence)?;
            }
        }
        Ok(())
    }

    fn link_to(
        &mut self,
        hub: &str,
        items: &[Extracted],
        weight: f64,
        relation: RelationKind,
    ) -> Result<()> {
        for item in items {
            self.graph.add_edge(hub, &item.id, weight, relation)?;
        }
        Ok(())
    }
}

fn string_items(value: Option<&Value>) -> impl Iterator<Item = &str> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
}

fn metadata_of<const N: usize>(pairs: [(&str, &str); N]) -> BTreeMap<String, Value> {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), Value::from(value)))
        .collect()
}
