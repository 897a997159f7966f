use crate::config::ExtractionConfig;
use crate::domain::NodeKind;
use crate::error::GraphError;
use anyhow::Result;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

/// Built-in entity vocabularies, scanned in this order.
const DEFAULT_PATTERNS: &[(NodeKind, &str)] = &[
    (
        NodeKind::Tool,
        "python|electron|typescript|sqlite|launchd|npm|git|docker|api",
    ),
    (
        NodeKind::Concept,
        "memory|security|automation|voice|streaming|encryption|bot|chat|ai|claude|agent|monitor|orchestrator",
    ),
    (NodeKind::Date, r"\d{4}-\d{2}-\d{2}"),
    (NodeKind::Person, "user"),
    (
        NodeKind::Feature,
        "reminder|surprise|speech|text-to-speech|voice-input|voice-output",
    ),
    (NodeKind::Service, "telegram|anthropic"),
];

pub const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had",
    "do", "does", "did", "will", "would", "could", "should", "may", "might", "must", "shall",
    "can", "need", "dare", "to", "of", "in", "for", "on", "with", "at", "by", "from", "as",
    "into", "through", "during", "before", "after", "above", "below", "between", "under",
    "again", "further", "then", "once", "here", "there", "when", "where", "why", "how", "all",
    "each", "few", "more", "most", "other", "some", "such", "no", "nor", "not", "only", "own",
    "same", "so", "than", "too", "very", "just", "and", "but", "if", "or", "because", "until",
    "while", "this", "that", "these", "those", "it", "its", "i", "my", "me", "we", "our", "you",
    "your", "he", "him", "his", "she", "her", "they", "them", "their", "what", "which", "who",
    "whom", "using", "uses", "used", "via", "enabled", "set", "up", "now", "also", "both",
    "about", "across", "new", "added", "built", "fixed", "created", "updated", "working", "runs",
    "active",
];

static KEYWORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-zA-Z][a-zA-Z0-9_-]{2,}\b").expect("keyword regex is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub id: String,
    pub kind: NodeKind,
}

impl Extracted {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone)]
struct EntityPattern {
    kind: NodeKind,
    regex: Regex,
}

impl EntityPattern {
    fn compile(kind: NodeKind, pattern: &str) -> Result<Self, GraphError> {
        let regex = RegexBuilder::new(&format!(r"\b(?:{})\b", pattern))
            .case_insensitive(true)
            .build()
            .map_err(|err| GraphError::InvalidPattern {
                kind: kind.to_string(),
                pattern: pattern.to_string(),
                reason: err.to_string(),
            })?;
        Ok(Self { kind, regex })
    }
}

/// Pulls entity and keyword mentions out of free text.
#[derive(Debug, Clone)]
pub struct EntityExtractor {
    patterns: Vec<EntityPattern>,
    stop_words: HashSet<String>,
    min_keyword_len: usize,
}

impl EntityExtractor {
    pub fn new(config: &ExtractionConfig) -> Result<Self> {
        let mut patterns = Vec::with_capacity(DEFAULT_PATTERNS.len() + config.patterns.len());
        for (kind, pattern) in DEFAULT_PATTERNS {
            patterns.push(EntityPattern::compile(*kind, pattern)?);
        }
        for extra in &config.patterns {
            patterns.push(EntityPattern::compile(extra.kind, &extra.pattern)?);
        }

        let stop_words = STOP_WORDS
            .iter()
            .map(|word| word.to_string())
            .chain(config.extra_stop_words.iter().map(|word| word.trim().to_lowercase()))
            .collect();

        Ok(Self {
            patterns,
            stop_words,
            min_keyword_len: config.min_keyword_len,
        })
    }

    /// Treat the given project names as `project` entities, ahead of every
    /// other vocabulary.
    pub fn with_known_projects<'a>(
        mut self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self> {
        let mut names: Vec<String> = names
            .into_iter()
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();
        if names.is_empty() {
            return Ok(self);
        }
        // Longest first so `claude-chat` wins over a shorter `chat` project.
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        names.dedup();
        let alternation = names
            .iter()
            .map(|name| regex::escape(name))
            .collect::<Vec<_>>()
            .join("|");
        self.patterns
            .insert(0, EntityPattern::compile(NodeKind::Project, &alternation)?);
        Ok(self)
    }

    /// Vocabulary matches, pattern by pattern, in match order.
    pub fn extract_entities(&self, text: &str) -> Vec<Extracted> {
        let lowered = text.to_lowercase();
        let mut found = Vec::new();
        for pattern in &self.patterns {
            for hit in pattern.regex.find_iter(&lowered) {
                let id = hit.as_str().trim();
                if !id.is_empty() {
                    found.push(Extracted::new(id, pattern.kind));
                }
            }
        }
        found
    }

    /// Every word that is not a stop word, in text order. Words already
    /// matched as entities are returned again here.
    pub fn extract_keywords(&self, text: &str) -> Vec<Extracted> {
        let lowered = text.to_lowercase();
        KEYWORD_RE
            .find_iter(&lowered)
            .map(|hit| hit.as_str())
            .filter(|word| word.chars().count() >= self.min_keyword_len)
            .filter(|word| !self.stop_words.contains(*word))
            .map(|word| Extracted::new(word, NodeKind::Keyword))
            .collect()
    }

    /// Entities followed by keywords.
    pub fn extract(&self, text: &str) -> Vec<Extracted> {
        let mut items = self.extract_entities(text);
        items.extend(self.extract_keywords(text));
        items
    }
}
