use anyhow::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize)]
pub struct RelationMetadata {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    #[default]
    CoOccurrence,
    Tagged,
    ProjectDescription,
    ProjectNote,
}

impl RelationKind {
    pub fn metadata(self) -> RelationMetadata {
        match self {
            RelationKind::CoOccurrence => RelationMetadata {
                name: "co_occurrence",
                description: "both entities appear in the same text",
            },
            RelationKind::Tagged => RelationMetadata {
                name: "tagged",
                description: "a conversation tag and an entity from its summary",
            },
            RelationKind::ProjectDescription => RelationMetadata {
                name: "project_description",
                description: "an entity from a project's description",
            },
            RelationKind::ProjectNote => RelationMetadata {
                name: "project_note",
                description: "an entity from one of a project's notes",
            },
        }
    }

    pub fn all() -> &'static [RelationKind] {
        const ALL: &[RelationKind] = &[
            RelationKind::CoOccurrence,
            RelationKind::Tagged,
            RelationKind::ProjectDescription,
            RelationKind::ProjectNote,
        ];
        ALL
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.metadata().name)
    }
}

impl FromStr for RelationKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        let candidate = match normalized.as_str() {
            "co_occurrence" | "cooccurrence" => RelationKind::CoOccurrence,
            "tagged" | "tag" => RelationKind::Tagged,
            "project_description" | "description" => RelationKind::ProjectDescription,
            "project_note" | "note" => RelationKind::ProjectNote,
            _ => anyhow::bail!("unknown relation: {}", s),
        };
        Ok(candidate)
    }
}

/// One undirected edge as it appears in a persisted snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub relation: RelationKind,
    pub weight: f64,
    #[serde(default)]
    pub co_occurrences: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases_and_separators() {
        assert_eq!(
            RelationKind::from_str("Co-Occurrence").unwrap(),
            RelationKind::CoOccurrence
        );
        assert_eq!(
            RelationKind::from_str("project note").unwrap(),
            RelationKind::ProjectNote
        );
        assert_eq!(RelationKind::from_str("tag").unwrap(), RelationKind::Tagged);
        assert!(RelationKind::from_str("causes").is_err());
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for kind in RelationKind::all() {
            assert_eq!(RelationKind::from_str(&kind.to_string()).unwrap(), *kind);
        }
    }

    #[test]
    fn edges_without_relation_default_to_co_occurrence() {
        let edge: GraphEdge =
            serde_json::from_str(r#"{"source": "bot", "target": "voice", "weight": 1.5}"#).unwrap();
        assert_eq!(edge.relation, RelationKind::CoOccurrence);
        assert_eq!(edge.co_occurrences, 0);
    }
}
