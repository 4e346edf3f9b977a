//! JSONL snapshots of the diplomacy registry: one file per record kind plus a
//! small `meta.json`.

mod jsonl;

use std::io;

use thiserror::Error;

pub use jsonl::{SnapshotMeta, flush_to_jsonl, restore_from_jsonl};

/// Why a snapshot directory could not be turned back into a registry.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot i/o: {0}")]
    Io(#[from] io::Error),

    #[error("{file}:{line}: {source}")]
    Parse {
        file: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("snapshot violates registry invariants: {0}")]
    Invariant(String),
}
