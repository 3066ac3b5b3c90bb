//! Domain model for memos and client-local todos.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep create/patch input validation next to the records they produce.
//!
//! # Invariants
//! - Every memo is identified by a stable `MemoId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod memo;
pub mod todo;
