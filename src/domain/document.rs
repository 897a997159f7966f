use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// The memory documents this crate knows by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Context,
    History,
    Projects,
    Reminders,
    Goals,
}

impl DocumentKind {
    pub fn all() -> &'static [DocumentKind] {
        const ALL: &[DocumentKind] = &[
            DocumentKind::Context,
            DocumentKind::History,
            DocumentKind::Projects,
            DocumentKind::Reminders,
            DocumentKind::Goals,
        ];
        ALL
    }

    /// Documents the graph is built from, in build order.
    pub fn graph_sources() -> &'static [DocumentKind] {
        const SOURCES: &[DocumentKind] = &[
            DocumentKind::Context,
            DocumentKind::History,
            DocumentKind::Projects,
            DocumentKind::Reminders,
        ];
        SOURCES
    }

    pub fn file_name(self) -> &'static str {
        match self {
            DocumentKind::Context => "context.json",
            DocumentKind::History => "history.json",
            DocumentKind::Projects => "projects.json",
            DocumentKind::Reminders => "reminders.json",
            DocumentKind::Goals => "goals.json",
        }
    }

    /// Empty body written when the store is initialised.
    pub fn seed(self, now: DateTime<Utc>) -> Value {
        let updated = now.to_rfc3339();
        match self {
            DocumentKind::Context => json!({
                "user": { "preferences": [] },
                "facts": [],
                "updated": updated,
            }),
            DocumentKind::History => json!({ "conversations": [], "updated": updated }),
            DocumentKind::Projects => json!({ "projects": {}, "updated": updated }),
            DocumentKind::Reminders => json!({ "reminders": [], "updated": updated }),
            DocumentKind::Goals => json!({ "goals": [], "updated": updated }),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryDocument {
    pub kind: DocumentKind,
    pub body: Value,
}

impl MemoryDocument {
    pub fn new(kind: DocumentKind, body: Value) -> Self {
        Self { kind, body }
    }

    pub fn empty(kind: DocumentKind) -> Self {
        Self::new(kind, Value::Object(Default::default()))
    }

    pub fn file_name(&self) -> &'static str {
        self.kind.file_name()
    }

    /// The document's own `updated` field. Naive timestamps are read as UTC.
    pub fn updated(&self) -> Option<DateTime<Utc>> {
        let raw = self.body.get("updated")?.as_str()?;
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_naive_and_offset_timestamps() {
        let naive = MemoryDocument::new(
            DocumentKind::History,
            json!({ "updated": "2024-03-09T08:15:30.123456" }),
        );
        assert_eq!(
            naive.updated().unwrap().to_rfc3339(),
            "2024-03-09T08:15:30.123456+00:00"
        );

        let offset = MemoryDocument::new(
            DocumentKind::History,
            json!({ "updated": "2024-03-09T10:15:30+02:00" }),
        );
        assert_eq!(
            offset.updated().unwrap().to_rfc3339(),
            "2024-03-09T08:15:30+00:00"
        );
    }

    #[test]
    fn missing_or_garbled_timestamp_is_none() {
        assert!(MemoryDocument::empty(DocumentKind::Goals).updated().is_none());
        let garbled = MemoryDocument::new(DocumentKind::Goals, json!({ "updated": "yesterday" }));
        assert!(garbled.updated().is_none());
    }

    #[test]
    fn seeds_carry_an_updated_field() {
        let now = Utc::now();
        for kind in DocumentKind::all() {
            let doc = MemoryDocument::new(*kind, kind.seed(now));
            assert!(doc.updated().is_some(), "{} seed lacks updated", kind);
        }
    }
}
