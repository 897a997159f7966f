mod graph;
mod persistence;

pub use graph::{GraphSnapshot, KnowledgeGraph, Link};
pub use persistence::{KnowledgeGraphLoader, KnowledgeGraphWriter};
