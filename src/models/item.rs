use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::task::{Priority, TaskStatus};

/// A loosely-typed action item as produced by an LLM, a legacy task file, or
/// manual entry. Every field is optional and kept as text; the normalizer
/// turns it into a [`NewTask`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawItem {
    #[serde(default, alias = "task", alias = "name")]
    pub title: Option<String>,
    #[serde(default, alias = "task_description", alias = "details")]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default, alias = "project")]
    pub category: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(
        default,
        alias = "suggested_delegate",
        alias = "delegate",
        alias = "owner"
    )]
    pub assignee: Option<String>,
}

impl RawItem {
    /// Item whose only content is a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }
}

/// A fully-defaulted task ready to be stored.
///
/// This is the normalizer's output and the input to
/// [`Database::create_task`](crate::db::Database::create_task). It carries no
/// identity or timestamps; those are assigned on creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: String,
    pub due_date: Option<NaiveDate>,
    pub assignee: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
}

/// A normalized task plus the flags carried over from a task file.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedTask {
    pub task: NewTask,
    pub created_by_ai: bool,
    pub archived: bool,
}

impl From<&NewTask> for RawItem {
    fn from(task: &NewTask) -> Self {
        Self {
            title: Some(task.title.clone()),
            description: Some(task.description.clone()),
            priority: Some(task.priority.as_str().to_string()),
            category: Some(task.category.clone()),
            due_date: task.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
            status: Some(task.status.as_str().to_string()),
            assignee: task.assignee.clone(),
        }
    }
}
