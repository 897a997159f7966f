//! Configuration for building and querying the graph.
//!
//! Every field has a default, so an empty or partial TOML file is a valid
//! configuration. Values not present fall back to the weights and limits the
//! memory tools have always used.

use crate::domain::NodeKind;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DIR_NAME: &str = ".claude-shared-memory";
pub const GRAPH_FILE_NAME: &str = "graph.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub weights: BuildWeights,
    #[serde(default)]
    pub limits: QueryLimits,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    /// Graph location. Relative paths are resolved against the memory directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph_file: Option<PathBuf>,
}

/// Edge weight added per contribution, by where the pair was found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildWeights {
    #[serde(default = "default_preference_weight")]
    pub preference: f64,
    #[serde(default = "default_fact_weight")]
    pub fact: f64,
    #[serde(default = "default_conversation_weight")]
    pub conversation: f64,
    #[serde(default = "default_tag_weight")]
    pub tag: f64,
    #[serde(default = "default_project_description_weight")]
    pub project_description: f64,
    #[serde(default = "default_project_note_weight")]
    pub project_note: f64,
    #[serde(default = "default_reminder_weight")]
    pub reminder: f64,
}

fn default_preference_weight() -> f64 {
    0.5
}

fn default_fact_weight() -> f64 {
    1.0
}

fn default_conversation_weight() -> f64 {
    1.5
}

fn default_tag_weight() -> f64 {
    2.0
}

fn default_project_description_weight() -> f64 {
    2.0
}

fn default_project_note_weight() -> f64 {
    1.5
}

fn default_reminder_weight() -> f64 {
    1.0
}

impl Default for BuildWeights {
    fn default() -> Self {
        Self {
            preference: default_preference_weight(),
            fact: default_fact_weight(),
            conversation: default_conversation_weight(),
            tag: default_tag_weight(),
            project_description: default_project_description_weight(),
            project_note: default_project_note_weight(),
            reminder: default_reminder_weight(),
        }
    }
}

impl BuildWeights {
    pub fn validate(&self) -> Result<()> {
        let named = [
            ("preference", self.preference),
            ("fact", self.fact),
            ("conversation", self.conversation),
            ("tag", self.tag),
            ("project_description", self.project_description),
            ("project_note", self.project_note),
            ("reminder", self.reminder),
        ];
        for (name, weight) in named {
            if !weight.is_finite() || weight < 0.0 {
                return Err(anyhow!("weights.{} must be a non-negative number, got {}", name, weight));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryLimits {
    #[serde(default = "default_related_limit")]
    pub related: usize,
    #[serde(default = "default_context_related_limit")]
    pub context_related: usize,
    /// How many of the strongest neighbours are expanded for second-degree topics.
    #[serde(default = "default_context_expand")]
    pub context_expand: usize,
    #[serde(default = "default_context_connected_limit")]
    pub context_connected: usize,
    #[serde(default = "default_second_degree_decay")]
    pub second_degree_decay: f64,
    #[serde(default = "default_excerpt_limit")]
    pub excerpts: usize,
    #[serde(default = "default_excerpt_chars")]
    pub excerpt_chars: usize,
    #[serde(default = "default_suggest_min_common")]
    pub suggest_min_common: usize,
    #[serde(default = "default_suggest_limit")]
    pub suggestions: usize,
}

fn default_related_limit() -> usize {
    10
}

fn default_context_related_limit() -> usize {
    15
}

fn default_context_expand() -> usize {
    5
}

fn default_context_connected_limit() -> usize {
    10
}

fn default_second_degree_decay() -> f64 {
    0.5
}

fn default_excerpt_limit() -> usize {
    5
}

fn default_excerpt_chars() -> usize {
    200
}

fn default_suggest_min_common() -> usize {
    2
}

fn default_suggest_limit() -> usize {
    20
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            related: default_related_limit(),
            context_related: default_context_related_limit(),
            context_expand: default_context_expand(),
            context_connected: default_context_connected_limit(),
            second_degree_decay: default_second_degree_decay(),
            excerpts: default_excerpt_limit(),
            excerpt_chars: default_excerpt_chars(),
            suggest_min_common: default_suggest_min_common(),
            suggestions: default_suggest_limit(),
        }
    }
}

/// An additional entity pattern; the regex is wrapped in word boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternConfig {
    pub kind: NodeKind,
    pub pattern: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default)]
    pub patterns: Vec<PatternConfig>,
    #[serde(default)]
    pub extra_stop_words: Vec<String>,
    #[serde(default = "default_min_keyword_len")]
    pub min_keyword_len: usize,
}

fn default_min_keyword_len() -> usize {
    3
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            patterns: Vec::new(),
            extra_stop_words: Vec::new(),
            min_keyword_len: default_min_keyword_len(),
        }
    }
}

impl GraphConfig {
    /// Load from an optional TOML file; `None` yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {:?}", path))?;
        Self::from_toml_str(&contents).with_context(|| format!("invalid config {:?}", path))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: GraphConfig = toml::from_str(contents).context("failed to parse TOML")?;
        config.weights.validate()?;
        Ok(config)
    }

    pub fn with_weights(mut self, weights: BuildWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_limits(mut self, limits: QueryLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_graph_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.graph_file = Some(path.into());
        self
    }

    pub fn with_pattern(mut self, kind: NodeKind, pattern: impl Into<String>) -> Self {
        self.extraction.patterns.push(PatternConfig {
            kind,
            pattern: pattern.into(),
        });
        self
    }

    pub fn graph_path(&self, memory_dir: &Path) -> PathBuf {
        match &self.graph_file {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => memory_dir.join(path),
            None => memory_dir.join(GRAPH_FILE_NAME),
        }
    }
}

/// The memory directory: an explicit path if given, otherwise under `$HOME`.
pub fn resolve_memory_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return Ok(dir);
    }
    let home = dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(home.join(DEFAULT_DIR_NAME))
}
