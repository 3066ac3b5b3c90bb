//! Memo domain model.
//!
//! # Responsibility
//! - Define the canonical memo record shared by the store, the snapshot layer
//!   and the filter engine.
//! - Define create/patch inputs and their validation rules.
//!
//! # Invariants
//! - `id` is stable and never reassigned by merge or update paths.
//! - `updated_at >= created_at` for every value produced by this module.
//! - Missing or `null` tags decode as an empty list.
//! - Timestamps carry millisecond precision and encode as ISO-8601 strings.

use chrono::{DateTime, SubsecRound, Utc};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Stable identifier of a memo.
pub type MemoId = i64;

const LOCAL_ID_MAX: MemoId = 1_000_000_000;

/// Memo importance level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Returns the stable lowercase name used in storage and JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Parses a stored/query priority name. Matching is exact.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical memo record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memo {
    pub id: MemoId,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub priority: Priority,
    /// Ordered, may contain duplicates. Never absent.
    #[serde(default, deserialize_with = "tags_or_empty")]
    pub tags: Vec<String>,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub updated_at: DateTime<Utc>,
}

fn pick_local_id<R: Rng>(rng: &mut R, existing: &[Memo]) -> MemoId {
    loop {
        let candidate = rng.gen_range(1..=LOCAL_ID_MAX);
        if !existing.iter().any(|memo| memo.id == candidate) {
            return candidate;
        }
    }
}

impl Memo {
    /// Builds a memo for client-only flows that never reach the store.
    ///
    /// The id is random and distinct from every id in `existing`, so a later
    /// merge by id cannot overwrite an unrelated memo. Both timestamps are
    /// the current time.
    pub fn new_local(input: &NewMemo, existing: &[Memo]) -> Result<Self, MemoValidationError> {
        input.validate()?;
        let now = now_millis();
        Ok(Self {
            id: pick_local_id(&mut rand::thread_rng(), existing),
            title: input.title.clone(),
            content: input.content.clone(),
            priority: input.priority.unwrap_or_default(),
            tags: input.tags.clone().unwrap_or_default(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies a partial update in place and refreshes `updated_at`.
    ///
    /// `id` and `created_at` are never touched. The memo is left unchanged
    /// when the patch fails validation.
    pub fn apply_patch(&mut self, patch: MemoPatch) -> Result<(), MemoValidationError> {
        patch.validate()?;
        if let Patch::Set(title) = patch.title {
            self.title = title;
        }
        if let Patch::Set(content) = patch.content {
            self.content = content;
        }
        if let Patch::Set(priority) = patch.priority {
            self.priority = priority;
        }
        if let Patch::Set(tags) = patch.tags {
            self.tags = tags;
        }
        self.updated_at = now_millis().max(self.created_at);
        Ok(())
    }

    /// Checks record-level invariants.
    pub fn validate(&self) -> Result<(), MemoValidationError> {
        validate_title(&self.title)?;
        validate_content(&self.content)?;
        validate_tags(&self.tags)?;
        if self.updated_at < self.created_at {
            return Err(MemoValidationError::UpdatedBeforeCreated);
        }
        Ok(())
    }
}

/// Create input. Omitted priority/tags take their defaults at creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NewMemo {
    pub title: String,
    pub content: String,
    pub priority: Option<Priority>,
    pub tags: Option<Vec<String>>,
}

impl NewMemo {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            priority: None,
            tags: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn validate(&self) -> Result<(), MemoValidationError> {
        validate_title(&self.title)?;
        validate_content(&self.content)?;
        if let Some(tags) = self.tags.as_ref() {
            validate_tags(tags)?;
        }
        Ok(())
    }
}

/// Presence marker for one updatable field.
///
/// A field missing from a JSON patch body decodes as `Unset`; a present field
/// decodes as `Set`. There is no "clear" state: emptying tags is expressed
/// as `Set(vec![])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Unset,
    Set(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Self::Unset
    }
}

impl<T> Patch<T> {
    pub fn is_set(&self) -> bool {
        matches!(self, Self::Set(_))
    }

    pub fn as_set(&self) -> Option<&T> {
        match self {
            Self::Set(value) => Some(value),
            Self::Unset => None,
        }
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unset, Self::Set)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Self::Set)
    }
}

/// Partial update request. Only `Set` fields are replaced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MemoPatch {
    pub title: Patch<String>,
    pub content: Patch<String>,
    pub priority: Patch<Priority>,
    pub tags: Patch<Vec<String>>,
}

impl MemoPatch {
    /// Returns true when no field is provided.
    pub fn is_empty(&self) -> bool {
        !(self.title.is_set()
            || self.content.is_set()
            || self.priority.is_set()
            || self.tags.is_set())
    }

    pub fn validate(&self) -> Result<(), MemoValidationError> {
        if let Some(title) = self.title.as_set() {
            validate_title(title)?;
        }
        if let Some(content) = self.content.as_set() {
            validate_content(content)?;
        }
        if let Some(tags) = self.tags.as_set() {
            validate_tags(tags)?;
        }
        Ok(())
    }
}

/// Validation failures for memo inputs and records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoValidationError {
    EmptyTitle,
    EmptyContent,
    /// Tag at `index` is empty or whitespace-only.
    EmptyTag { index: usize },
    UpdatedBeforeCreated,
}

impl Display for MemoValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "title must not be empty"),
            Self::EmptyContent => write!(f, "content must not be empty"),
            Self::EmptyTag { index } => write!(f, "tag at position {index} must not be empty"),
            Self::UpdatedBeforeCreated => write!(f, "updated_at is earlier than created_at"),
        }
    }
}

impl Error for MemoValidationError {}

/// Current UTC time truncated to millisecond precision.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

fn validate_title(title: &str) -> Result<(), MemoValidationError> {
    if title.trim().is_empty() {
        return Err(MemoValidationError::EmptyTitle);
    }
    Ok(())
}

fn validate_content(content: &str) -> Result<(), MemoValidationError> {
    if content.trim().is_empty() {
        return Err(MemoValidationError::EmptyContent);
    }
    Ok(())
}

fn validate_tags(tags: &[String]) -> Result<(), MemoValidationError> {
    match tags.iter().position(|tag| tag.trim().is_empty()) {
        Some(index) => Err(MemoValidationError::EmptyTag { index }),
        None => Ok(()),
    }
}

fn tags_or_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// ISO-8601 encoding with millisecond precision and `Z` suffix.
pub mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|value| value.with_timezone(&Utc))
            .map_err(|err| serde::de::Error::custom(format!("invalid timestamp `{text}`: {err}")))
    }
}
