use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single to-do item.
///
/// `id` and `created_at` are assigned by storage on insert and never change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Short label used in log lines.
    #[must_use]
    pub fn label(&self) -> String {
        format!("task #{} ({:?})", self.id, self.title)
    }
}
