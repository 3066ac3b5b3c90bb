//! Core domain logic for the memo manager.
//! This crate is the single source of truth for memo invariants: filtering,
//! snapshot reconciliation and the relational store contract.

pub mod db;
pub mod filter;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod snapshot;

pub use db::{open_pool, open_pool_in_memory, DbError, DbPool};
pub use filter::memo_filter::{
    collect_tags, filter_by_priority, filter_by_search, filter_by_tag, sort_by_recent, MemoFilter,
    PriorityFilter,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::memo::{Memo, MemoId, MemoPatch, MemoValidationError, NewMemo, Patch, Priority};
pub use model::todo::{Todo, TodoFilter, TodoId, TodoList};
pub use repo::memo_repo::{MemoQuery, MemoRepository, RepoError, RepoResult, SqliteMemoRepository};
pub use service::memo_service::{MemoService, MemoServiceError, MemoServiceResult};
pub use snapshot::{
    FileSnapshotStore, MemoSnapshot, MemorySnapshotStore, SaveOutcome, SnapshotError,
    SnapshotResult, SnapshotStore, TodoSnapshot,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
