use std::path::PathBuf;
use thiserror::Error;

/// Failures callers are expected to tell apart from plain I/O errors.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("graph not found at {}; run `brain-graph build` first", .0.display())]
    NotBuilt(PathBuf),

    #[error("edge {left} <-> {right} has invalid weight {weight}")]
    InvalidWeight {
        left: String,
        right: String,
        weight: f64,
    },

    #[error("edge endpoint `{0}` is not a node")]
    UnknownEndpoint(String),

    #[error("invalid {kind} pattern `{pattern}`: {reason}")]
    InvalidPattern {
        kind: String,
        pattern: String,
        reason: String,
    },
}
