//! Graph-subsystem error type.
//!
//! Every variant is fatal to level load: a malformed navigation file is
//! surfaced to the caller and never retried.  Spatial queries against a
//! loaded graph never error — out-of-range ids answer `None`/empty.

use thiserror::Error;

/// Errors produced by `nav-graph`.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("not a navigation graph file (bad magic)")]
    Magic,

    #[error("unsupported format version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },

    #[error("file truncated at byte {0}")]
    Truncated(usize),

    #[error("checksum mismatch: file {file:#010x}, geometry {geometry:#010x}")]
    Checksum { file: u32, geometry: u32 },

    #[error("malformed graph: {0}")]
    Format(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type GraphResult<T> = Result<T, GraphError>;
