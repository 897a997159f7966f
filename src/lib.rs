pub mod config;
pub mod domain;
pub mod error;
pub mod ingestion;
pub mod memory;
pub mod reasoning;
pub mod report;
pub mod schedule;
pub mod store;
pub mod utils;

pub use config::GraphConfig;
pub use domain::{DocumentKind, GraphEdge, GraphNode, MemoryDocument, NodeKind, RelationKind};
pub use error::GraphError;
pub use ingestion::{GraphBuilder, IngestionPipeline};
pub use memory::{KnowledgeGraph, KnowledgeGraphLoader, KnowledgeGraphWriter};
pub use store::MemoryStore;
