mod context;
mod explainer;
mod query;
mod stats;
mod suggest;

pub use context::{ConnectedTopic, ContextAssembler, Excerpt, TopicContext};
pub use explainer::{ExplanationStep, PathExplainer};
pub use query::{RelatedEntities, RelatedEntity, RelationQueryService};
pub use stats::{entities_by_type, GraphStats, Hub};
pub use suggest::{ConnectionSuggester, ConnectionSuggestion};
