use anyhow::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Project,
    Tool,
    Concept,
    Date,
    Person,
    Feature,
    Service,
    Tag,
    Keyword,
    #[serde(other)]
    #[default]
    Unknown,
}

impl NodeKind {
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Project => "project",
            NodeKind::Tool => "tool",
            NodeKind::Concept => "concept",
            NodeKind::Date => "date",
            NodeKind::Person => "person",
            NodeKind::Feature => "feature",
            NodeKind::Service => "service",
            NodeKind::Tag => "tag",
            NodeKind::Keyword => "keyword",
            NodeKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for NodeKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_lowercase().as_str() {
            "project" => NodeKind::Project,
            "tool" => NodeKind::Tool,
            "concept" => NodeKind::Concept,
            "date" => NodeKind::Date,
            "person" => NodeKind::Person,
            "feature" => NodeKind::Feature,
            "service" => NodeKind::Service,
            "tag" => NodeKind::Tag,
            "keyword" => NodeKind::Keyword,
            "unknown" => NodeKind::Unknown,
            _ => anyhow::bail!("unknown node type: {}", s),
        };
        Ok(kind)
    }
}

/// A concept or entity seen in one or more memory documents.
///
/// The identifier is not stored here: it is the key the node is filed under
/// in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, Value>,
    pub first_seen: DateTime<Utc>,
    #[serde(default)]
    pub frequency: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
}

impl GraphNode {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            metadata: BTreeMap::new(),
            first_seen: Utc::now(),
            frequency: 0,
            sources: Vec::new(),
        }
    }

    pub fn merge_metadata(&mut self, metadata: BTreeMap<String, Value>) {
        self.metadata.extend(metadata);
    }

    pub fn record_source(&mut self, source: &str) {
        if !self.sources.iter().any(|s| s == source) {
            self.sources.push(source.to_string());
        }
    }
}
