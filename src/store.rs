//! JSON document storage for task lists.
//!
//! Older deployments kept tasks in a single JSON file. [`JsonStore`] reads
//! that format (a `{"tasks": [...]}` document or a bare array) and writes the
//! same document shape; [`import_json`] and [`export_json`] move tasks
//! between it and the database.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::db::Database;
use crate::extract::normalize::{is_item_object, Normalizer};
use crate::models::{ImportedTask, Task, TaskFilter};

const DOCUMENT_VERSION: &str = "1.0";

#[derive(Debug, Serialize, Deserialize)]
struct TaskDocument<T> {
    tasks: Vec<T>,
    last_updated: String,
    version: String,
}

#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw task entries from the file. A missing file holds no tasks.
    pub fn load_tasks(&self) -> Result<Vec<Value>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        let value: Value = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse {}", self.path.display()))?;

        Ok(match value {
            Value::Array(tasks) => tasks,
            Value::Object(mut map) => match map.remove("tasks") {
                Some(Value::Array(tasks)) => tasks,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        })
    }

    /// Replace the whole file with `tasks`.
    pub fn save_tasks(&self, tasks: &[Task]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let document = TaskDocument {
            tasks: tasks.to_vec(),
            last_updated: Utc::now().to_rfc3339(),
            version: DOCUMENT_VERSION.to_string(),
        };
        let json = serde_json::to_string_pretty(&document)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

/// Summary of an import run.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

/// Copy tasks from a JSON file into the database.
///
/// Each entry goes through the normalizer, so legacy labels ("High",
/// "Completed", ...) map onto the current enums. The `created_by_ai` and
/// `archived` flags are carried over. Entries with no usable title or
/// description are skipped. All imported tasks are written in one
/// transaction.
pub fn import_json(store: &JsonStore, db: &Database, normalizer: &Normalizer) -> Result<ImportReport> {
    let entries = store.load_tasks()?;

    let mut tasks = Vec::new();
    let mut skipped = 0;

    for entry in &entries {
        let normalized = if is_item_object(entry) {
            normalizer.normalize_value(entry).into_iter().next()
        } else {
            None
        };
        match normalized {
            Some(task) => tasks.push(ImportedTask {
                task,
                created_by_ai: flag(entry, "created_by_ai"),
                archived: flag(entry, "archived"),
            }),
            None => skipped += 1,
        }
    }

    let imported = db.import_tasks(&tasks)?.len();

    tracing::info!(
        "Imported {} tasks from {} ({} skipped)",
        imported,
        store.path().display(),
        skipped
    );
    Ok(ImportReport { imported, skipped })
}

fn flag(entry: &Value, key: &str) -> bool {
    entry.get(key).and_then(Value::as_bool).unwrap_or(false)
}

/// Write every task, archived ones included, to a JSON file.
pub fn export_json(db: &Database, store: &JsonStore) -> Result<usize> {
    let tasks = db.list_tasks(&TaskFilter {
        status: None,
        include_archived: true,
    })?;
    store.save_tasks(&tasks)?;
    tracing::info!("Exported {} tasks to {}", tasks.len(), store.path().display());
    Ok(tasks.len())
}
