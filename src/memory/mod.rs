//! Persistent memory: the single aggregate the agent carries between turns.
//!
//! [`MemoryState`] is everything the agent remembers (profile, notes, tasks,
//! reminders). [`MemoryStore`] loads it at startup and writes it back after
//! every turn that mutates it.

mod store;

pub use store::MemoryStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Facts about the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Name set with `/whoami <name>`.
    #[serde(default)]
    pub name: Option<String>,
}

/// A to-do entry. Addressed by its 1-based position in [`MemoryState::tasks`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub description: String,
    #[serde(default)]
    pub done: bool,
}

impl Task {
    /// A new pending task.
    pub fn pending(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            done: false,
        }
    }
}

/// A scheduled reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reminder {
    pub text: String,
    /// When the reminder falls due (UTC).
    pub due: DateTime<Utc>,
}

/// Everything the agent persists.
///
/// All four fields are always present; a missing field in the backing file
/// defaults to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryState {
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
}

impl MemoryState {
    /// Whether nothing has been remembered yet.
    pub fn is_empty(&self) -> bool {
        self.profile.name.is_none()
            && self.notes.is_empty()
            && self.tasks.is_empty()
            && self.reminders.is_empty()
    }

    /// Look up a task by its 1-based display index.
    pub fn task_mut(&mut self, index: usize) -> Option<&mut Task> {
        index.checked_sub(1).and_then(|i| self.tasks.get_mut(i))
    }
}
