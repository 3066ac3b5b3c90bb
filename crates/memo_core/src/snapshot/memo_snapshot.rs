//! Memo/todo snapshot codecs and the merge-on-save policy.

use super::{SnapshotError, SnapshotResult, SnapshotStore, MEMOS_SNAPSHOT_KEY, TODOS_SNAPSHOT_KEY};
use crate::model::memo::{Memo, MemoId};
use crate::model::todo::Todo;
use log::{debug, info};
use std::collections::HashMap;

/// Result of [`MemoSnapshot::merge_and_save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Incoming batch was empty; stored snapshot left untouched.
    Skipped,
    Saved {
        replaced: usize,
        appended: usize,
        total: usize,
    },
}

/// Memo snapshot persisted under [`MEMOS_SNAPSHOT_KEY`].
pub struct MemoSnapshot<S: SnapshotStore> {
    store: S,
}

impl<S: SnapshotStore> MemoSnapshot<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Loads the stored memos, or an empty list when nothing was saved yet.
    pub fn load(&self) -> SnapshotResult<Vec<Memo>> {
        match self.store.read(MEMOS_SNAPSHOT_KEY)? {
            Some(blob) => decode_memos(&blob),
            None => Ok(Vec::new()),
        }
    }

    /// Merges `incoming` into the stored snapshot by id and writes it back.
    ///
    /// Matching ids are replaced in place, unknown ids are appended. An empty
    /// batch is a no-op so an initial render before data arrives cannot
    /// clobber the stored snapshot.
    pub fn merge_and_save(&self, incoming: &[Memo]) -> SnapshotResult<SaveOutcome> {
        if incoming.is_empty() {
            debug!("event=snapshot_save module=snapshot status=skipped reason=empty_batch");
            return Ok(SaveOutcome::Skipped);
        }

        let existing = self.load()?;
        let existing_len = existing.len();
        let merged = merge_by_id(existing, incoming);
        let appended = merged.len() - existing_len;
        let replaced = incoming.len() - appended;
        self.store.write(MEMOS_SNAPSHOT_KEY, &encode_memos(&merged)?)?;

        info!(
            "event=snapshot_save module=snapshot status=ok replaced={} appended={} total={}",
            replaced,
            appended,
            merged.len()
        );
        Ok(SaveOutcome::Saved {
            replaced,
            appended,
            total: merged.len(),
        })
    }
}

/// Todo snapshot persisted under [`TODOS_SNAPSHOT_KEY`].
///
/// Todos have no server of record, so saving overwrites the whole list.
pub struct TodoSnapshot<S: SnapshotStore> {
    store: S,
}

impl<S: SnapshotStore> TodoSnapshot<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn load(&self) -> SnapshotResult<Vec<Todo>> {
        match self.store.read(TODOS_SNAPSHOT_KEY)? {
            Some(blob) => serde_json::from_str(&blob).map_err(|source| SnapshotError::Decode {
                key: TODOS_SNAPSHOT_KEY.to_string(),
                source,
            }),
            None => Ok(Vec::new()),
        }
    }

    pub fn save(&self, todos: &[Todo]) -> SnapshotResult<()> {
        let blob = serde_json::to_string(todos).map_err(SnapshotError::Encode)?;
        self.store.write(TODOS_SNAPSHOT_KEY, &blob)
    }
}

/// Replaces memos of `existing` that share an id with `incoming`, keeping
/// their position, and appends the rest in incoming order.
///
/// When `incoming` repeats an id, the last occurrence wins.
pub fn merge_by_id(mut existing: Vec<Memo>, incoming: &[Memo]) -> Vec<Memo> {
    let mut positions: HashMap<MemoId, usize> = existing
        .iter()
        .enumerate()
        .map(|(index, memo)| (memo.id, index))
        .collect();

    for memo in incoming {
        match positions.get(&memo.id) {
            Some(&index) => existing[index] = memo.clone(),
            None => {
                positions.insert(memo.id, existing.len());
                existing.push(memo.clone());
            }
        }
    }

    existing
}

/// Encodes memos with ISO-8601 millisecond timestamps.
pub fn encode_memos(memos: &[Memo]) -> SnapshotResult<String> {
    serde_json::to_string(memos).map_err(SnapshotError::Encode)
}

pub fn decode_memos(blob: &str) -> SnapshotResult<Vec<Memo>> {
    serde_json::from_str(blob).map_err(|source| SnapshotError::Decode {
        key: MEMOS_SNAPSHOT_KEY.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::merge_by_id;
    use crate::model::memo::{now_millis, Memo, Priority};

    fn memo(id: i64, title: &str) -> Memo {
        let now = now_millis();
        Memo {
            id,
            title: title.to_string(),
            content: "body".to_string(),
            priority: Priority::Medium,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn duplicate_incoming_ids_keep_last_occurrence() {
        let merged = merge_by_id(vec![memo(1, "a")], &[memo(2, "b"), memo(2, "b2")]);
        let titles: Vec<&str> = merged.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b2"]);
    }
}
