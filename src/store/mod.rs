mod freshness;
mod fs;
mod memory_store;

pub use freshness::{graph_freshness, Freshness, DEFAULT_STALE_TOLERANCE};
pub use fs::{ensure_private_dir, write_private_atomic};
pub use memory_store::{InitReport, MemoryStore};
