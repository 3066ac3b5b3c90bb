//! In-memory memo filtering and ordering.
//!
//! # Responsibility
//! - Derive filtered/sorted views from a memo collection without side effects.
//! - Keep client-side view semantics identical across callers.
//!
//! # Invariants
//! - Blank criteria pass input through unchanged, order included.
//! - Filters apply in the order search -> priority -> tag.
//! - Final order is `updated_at DESC`, stable for ties.

use crate::model::memo::{Memo, Priority};
use std::collections::BTreeSet;

/// Priority criterion, where `All` disables the filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PriorityFilter {
    #[default]
    All,
    Only(Priority),
}

impl PriorityFilter {
    /// Parses `all` or an exact priority name.
    pub fn parse(value: &str) -> Option<Self> {
        if value == "all" {
            return Some(Self::All);
        }
        Priority::parse(value).map(Self::Only)
    }

    /// Returns the concrete priority, or `None` for `All`.
    pub fn priority(self) -> Option<Priority> {
        match self {
            Self::All => None,
            Self::Only(priority) => Some(priority),
        }
    }
}

impl From<Priority> for PriorityFilter {
    fn from(value: Priority) -> Self {
        Self::Only(value)
    }
}

/// Current memo view criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoFilter {
    /// Case-insensitive substring over title, content and tags.
    pub search: String,
    pub priority: PriorityFilter,
    /// Exact, case-sensitive tag. Empty disables the filter.
    pub tag: String,
}

impl MemoFilter {
    /// Filters and sorts memos for presentation.
    pub fn apply(&self, memos: Vec<Memo>) -> Vec<Memo> {
        let filtered = filter_by_search(memos, &self.search);
        let filtered = filter_by_priority(filtered, self.priority);
        let mut filtered = filter_by_tag(filtered, &self.tag);
        sort_by_recent(&mut filtered);
        filtered
    }
}

/// Keeps memos whose title, content or any tag contains `term`, ignoring case.
pub fn filter_by_search(memos: Vec<Memo>, term: &str) -> Vec<Memo> {
    if term.trim().is_empty() {
        return memos;
    }

    let needle = term.to_lowercase();
    memos
        .into_iter()
        .filter(|memo| {
            memo.title.to_lowercase().contains(&needle)
                || memo.content.to_lowercase().contains(&needle)
                || memo
                    .tags
                    .iter()
                    .any(|tag| tag.to_lowercase().contains(&needle))
        })
        .collect()
}

pub fn filter_by_priority(memos: Vec<Memo>, priority: PriorityFilter) -> Vec<Memo> {
    match priority {
        PriorityFilter::All => memos,
        PriorityFilter::Only(wanted) => memos
            .into_iter()
            .filter(|memo| memo.priority == wanted)
            .collect(),
    }
}

pub fn filter_by_tag(memos: Vec<Memo>, tag: &str) -> Vec<Memo> {
    if tag.is_empty() {
        return memos;
    }

    memos
        .into_iter()
        .filter(|memo| memo.tags.iter().any(|candidate| candidate == tag))
        .collect()
}

/// Sorts most recently updated first. Ties keep their relative order.
pub fn sort_by_recent(memos: &mut [Memo]) {
    memos.sort_by(|left, right| right.updated_at.cmp(&left.updated_at));
}

/// Returns every distinct tag, sorted.
pub fn collect_tags(memos: &[Memo]) -> Vec<String> {
    let unique: BTreeSet<&str> = memos
        .iter()
        .flat_map(|memo| memo.tags.iter().map(String::as_str))
        .collect();
    unique.into_iter().map(str::to_string).collect()
}
