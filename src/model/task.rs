//! Task model.
//!
//! A task is a single row of the `todos` table. Ids are assigned by the
//! store's id generator, never by the engine.

use serde::{Deserialize, Serialize};

/// A persisted to-do item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Primary key (milliseconds-derived by default).
    pub id: i64,

    /// Task text. Non-empty by caller contract, not enforced by storage.
    pub title: String,
}

impl Task {
    /// Create a task value from its parts.
    #[must_use]
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}

/// A to-do item as returned by the remote list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTodo {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}
