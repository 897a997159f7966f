mod document;
mod edge;
mod node;

pub use document::{DocumentKind, MemoryDocument};
pub use edge::{GraphEdge, RelationKind, RelationMetadata};
pub use node::{GraphNode, NodeKind};
