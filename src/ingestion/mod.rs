mod builder;
mod extractor;
mod pipeline;

pub use builder::{BuildSummary, GraphBuilder};
pub use extractor::{EntityExtractor, Extracted, STOP_WORDS};
pub use pipeline::{BuildOutcome, IngestionPipeline, RefreshOutcome};
