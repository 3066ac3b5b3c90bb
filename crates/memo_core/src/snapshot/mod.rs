//! Client-local snapshot persistence.
//!
//! # Responsibility
//! - Persist memo and todo collections as single JSON blobs per key.
//! - Reconcile memo batches with the stored snapshot by identity.
//!
//! # Invariants
//! - A missing snapshot is an empty collection, never an error.
//! - Saving memos never drops a memo absent from the incoming batch.
//! - Single-writer access is assumed; there is no locking.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod memo_snapshot;
mod store;

pub use memo_snapshot::{
    decode_memos, encode_memos, merge_by_id, MemoSnapshot, SaveOutcome, TodoSnapshot,
};
pub use store::{FileSnapshotStore, MemorySnapshotStore};

/// Storage key of the memo snapshot blob.
pub const MEMOS_SNAPSHOT_KEY: &str = "memos";
/// Storage key of the todo snapshot blob.
pub const TODOS_SNAPSHOT_KEY: &str = "todos";

pub type SnapshotResult<T> = Result<T, SnapshotError>;

#[derive(Debug)]
pub enum SnapshotError {
    /// Key contains characters outside `[A-Za-z0-9_-]` or is empty.
    InvalidKey(String),
    Io(std::io::Error),
    Encode(serde_json::Error),
    /// Stored blob exists but is not a valid snapshot.
    Decode {
        key: String,
        source: serde_json::Error,
    },
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidKey(key) => write!(f, "invalid snapshot key `{key}`"),
            Self::Io(err) => write!(f, "snapshot io error: {err}"),
            Self::Encode(err) => write!(f, "failed to encode snapshot: {err}"),
            Self::Decode { key, source } => {
                write!(f, "failed to decode snapshot `{key}`: {source}")
            }
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidKey(_) => None,
            Self::Io(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::Decode { source, .. } => Some(source),
        }
    }
}

impl From<std::io::Error> for SnapshotError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Key/blob storage used by the snapshot layer.
pub trait SnapshotStore {
    /// Returns the blob stored under `key`, or `None` when absent.
    fn read(&self, key: &str) -> SnapshotResult<Option<String>>;
    /// Replaces the blob stored under `key`.
    fn write(&self, key: &str, blob: &str) -> SnapshotResult<()>;
}

impl<S: SnapshotStore + ?Sized> SnapshotStore for &S {
    fn read(&self, key: &str) -> SnapshotResult<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, blob: &str) -> SnapshotResult<()> {
        (**self).write(key, blob)
    }
}

pub(crate) fn validate_key(key: &str) -> SnapshotResult<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-');
    if valid {
        Ok(())
    } else {
        Err(SnapshotError::InvalidKey(key.to_string()))
    }
}
