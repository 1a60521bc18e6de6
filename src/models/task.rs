use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// An action item tracked by taskmaster.
///
/// Tasks are created either by the extraction stage or by manual entry, and
/// are mutated by status, priority, and delegation edits. They are never
/// deleted; [`archived`](Task::archived) hides them from default listings.
///
/// The `id` is assigned by the database on creation and never changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: String,
    pub due_date: Option<NaiveDate>,
    pub status: TaskStatus,
    /// Person the task is delegated to, if any. Free text, not a reference.
    pub assignee: Option<String>,
    /// True when the task came out of the extraction stage.
    pub created_by_ai: bool,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// A task is overdue when its due date has passed and it is not done.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != TaskStatus::Done && self.due_date.is_some_and(|due| due < today)
    }
}

/// Declared importance of a task, ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Lenient parse for extracted text: case-insensitive, with a few synonyms
    /// that LLMs and hand-written notes commonly use.
    pub fn parse_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "minor" => Some(Self::Low),
            "medium" | "normal" | "moderate" => Some(Self::Medium),
            "high" | "important" => Some(Self::High),
            "critical" | "urgent" | "blocker" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// Workflow state of a task.
///
/// - `Open`: Not started yet
/// - `InProgress`: Being worked on
/// - `Done`: Finished
/// - `Delegated`: Handed to the person named in `assignee`
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Open,
    InProgress,
    Done,
    Delegated,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 4] = [Self::Open, Self::InProgress, Self::Done, Self::Delegated];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Delegated => "delegated",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "in_progress" => Some(Self::InProgress),
            "done" => Some(Self::Done),
            "delegated" => Some(Self::Delegated),
            _ => None,
        }
    }

    /// Lenient parse accepting the labels used by older task files
    /// ("Not Started", "Completed", "Assigned", ...).
    pub fn parse_loose(s: &str) -> Option<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "open" | "to do" | "todo" | "not started" | "pending" => Some(Self::Open),
            "in progress" | "started" | "on hold" => Some(Self::InProgress),
            "done" | "completed" | "complete" | "closed" => Some(Self::Done),
            "delegated" | "assigned" => Some(Self::Delegated),
            _ => None,
        }
    }
}

/// Input for partially updating a task. All fields are optional.
///
/// No `id` field: identifiers are immutable once assigned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaskInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    /// `None` leaves the due date alone; `Some(None)` (JSON `null`) clears it.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<NaiveDate>>,
    pub status: Option<TaskStatus>,
    pub assignee: Option<String>,
}

/// Marks a field that was present in the input, even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Input for delegating a task to someone else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegateTaskInput {
    pub assignee: String,
}

/// Filter for listing tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    #[serde(default)]
    pub include_archived: bool,
}

/// Aggregate counts over stored tasks.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TaskStats {
    pub total_tasks: usize,
    pub archived_tasks: usize,
    pub ai_generated_tasks: usize,
    pub by_status: std::collections::BTreeMap<String, usize>,
    pub by_priority: std::collections::BTreeMap<String, usize>,
    pub by_category: std::collections::BTreeMap<String, usize>,
}
