//! Client-local todo list model.
//!
//! Todos never reach the server store; they live only in the local snapshot
//! (see `snapshot::TodoSnapshot`).

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub type TodoId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

/// View filter for todo lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TodoFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TodoFilter {
    fn accepts(self, todo: &Todo) -> bool {
        match self {
            Self::All => true,
            Self::Active => !todo.completed,
            Self::Completed => todo.completed,
        }
    }
}

impl FromStr for TodoFilter {
    type Err = std::convert::Infallible;

    /// Unknown values fall back to `All`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value {
            "active" => Self::Active,
            "completed" => Self::Completed,
            _ => Self::All,
        })
    }
}

/// Ordered todo collection with the list operations the UI drives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoList {
    items: Vec<Todo>,
}

impl TodoList {
    pub fn new(items: Vec<Todo>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[Todo] {
        &self.items
    }

    pub fn into_items(self) -> Vec<Todo> {
        self.items
    }

    /// Appends a new open todo and returns its id.
    ///
    /// Returns `None` for blank titles.
    pub fn add(&mut self, title: impl Into<String>) -> Option<TodoId> {
        let title = title.into();
        if title.trim().is_empty() {
            return None;
        }
        let mut rng = rand::thread_rng();
        let id = loop {
            let candidate: TodoId = rng.gen();
            if !self.items.iter().any(|todo| todo.id == candidate) {
                break candidate;
            }
        };
        self.items.push(Todo {
            id,
            title,
            completed: false,
        });
        Some(id)
    }

    /// Flips the completion flag. Returns false when the id is unknown.
    pub fn toggle(&mut self, id: TodoId) -> bool {
        match self.items.iter_mut().find(|todo| todo.id == id) {
            Some(todo) => {
                todo.completed = !todo.completed;
                true
            }
            None => false,
        }
    }

    /// Removes a todo. Returns false when the id is unknown.
    pub fn remove(&mut self, id: TodoId) -> bool {
        let before = self.items.len();
        self.items.retain(|todo| todo.id != id);
        self.items.len() != before
    }

    pub fn filtered(&self, filter: TodoFilter) -> Vec<&Todo> {
        self.items.iter().filter(|todo| filter.accepts(todo)).collect()
    }
}
