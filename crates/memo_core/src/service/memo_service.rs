//! Memo use-case service.
//!
//! # Responsibility
//! - Provide create/get/update/delete/search/tag APIs for callers.
//! - Translate repository errors into the client-facing taxonomy.
//!
//! # Invariants
//! - `InvalidInput` and `NotFound` are never reported as storage faults.
//! - Update requests must provide at least one field.
//! - Service layer remains storage-agnostic.

use crate::model::memo::{Memo, MemoId, MemoPatch, NewMemo};
use crate::repo::memo_repo::{MemoQuery, MemoRepository, RepoError};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for memo use-cases.
#[derive(Debug)]
pub enum MemoServiceError {
    /// Missing or malformed request fields.
    InvalidInput(String),
    /// Target memo does not exist.
    NotFound(MemoId),
    /// Persistence-layer failure.
    Storage(RepoError),
}

impl Display for MemoServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "invalid input: {message}"),
            Self::NotFound(id) => write!(f, "memo not found: {id}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MemoServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for MemoServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::Validation(err) => Self::InvalidInput(err.to_string()),
            other => Self::Storage(other),
        }
    }
}

pub type MemoServiceResult<T> = Result<T, MemoServiceError>;

/// Memo service facade over repository implementations.
pub struct MemoService<R: MemoRepository> {
    repo: R,
}

impl<R: MemoRepository> MemoService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    /// Creates one memo, defaulting priority to medium and tags to empty.
    pub fn create_memo(&self, input: &NewMemo) -> MemoServiceResult<Memo> {
        let memo = self.repo.create_memo(input)?;
        info!(
            "event=memo_create module=service status=ok id={} tags={}",
            memo.id,
            memo.tags.len()
        );
        Ok(memo)
    }

    pub fn get_memo(&self, id: MemoId) -> MemoServiceResult<Memo> {
        self.repo
            .get_memo(id)?
            .ok_or(MemoServiceError::NotFound(id))
    }

    /// Replaces only the provided fields and refreshes `updated_at`.
    pub fn update_memo(&self, id: MemoId, patch: &MemoPatch) -> MemoServiceResult<Memo> {
        if patch.is_empty() {
            return Err(MemoServiceError::InvalidInput(
                "at least one of title, content, priority, tags must be provided".to_string(),
            ));
        }

        let memo = self.repo.update_memo(id, patch)?;
        info!("event=memo_update module=service status=ok id={id}");
        Ok(memo)
    }

    /// Hard-deletes one memo. Unknown ids report `NotFound`.
    pub fn delete_memo(&self, id: MemoId) -> MemoServiceResult<()> {
        if !self.repo.delete_memo(id)? {
            return Err(MemoServiceError::NotFound(id));
        }
        info!("event=memo_delete module=service status=ok id={id}");
        Ok(())
    }

    /// Lists every memo, most recently updated first.
    pub fn list_memos(&self) -> MemoServiceResult<Vec<Memo>> {
        self.search_memos(&MemoQuery::default())
    }

    pub fn search_memos(&self, query: &MemoQuery) -> MemoServiceResult<Vec<Memo>> {
        Ok(self.repo.search_memos(query)?)
    }

    /// Lists the distinct tags of all stored memos, sorted.
    pub fn list_tags(&self) -> MemoServiceResult<Vec<String>> {
        Ok(self.repo.list_tags()?)
    }
}
