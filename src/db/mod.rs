mod schema;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::extract::normalize::DEFAULT_CATEGORY;
use crate::models::*;

const TASK_COLUMNS: &str = "id, title, description, priority, category, due_date, status, assignee,
     created_by_ai, archived, created_at, updated_at";

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        tracing::debug!("Opened database at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open `tasks.db` in the platform data directory.
    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "taskmaster")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        Self::open(dirs.data_dir().join("tasks.db"))
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        schema::run_migrations(&conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database lock poisoned"))
    }

    // ============================================================
    // Task operations
    // ============================================================

    pub fn create_task(&self, input: &NewTask, created_by_ai: bool) -> Result<Task> {
        let conn = self.lock()?;
        insert_task(&conn, input, created_by_ai, false, Utc::now())
    }

    /// Create several tasks in one transaction; either all are stored or none.
    pub fn create_tasks(&self, inputs: &[NewTask], created_by_ai: bool) -> Result<Vec<Task>> {
        self.insert_many(inputs.iter().map(|input| (input, created_by_ai, false)))
    }

    /// Like [`create_tasks`](Self::create_tasks), keeping each task's AI and
    /// archive flags.
    pub fn import_tasks(&self, inputs: &[ImportedTask]) -> Result<Vec<Task>> {
        self.insert_many(
            inputs
                .iter()
                .map(|input| (&input.task, input.created_by_ai, input.archived)),
        )
    }

    fn insert_many<'a>(
        &self,
        inputs: impl Iterator<Item = (&'a NewTask, bool, bool)>,
    ) -> Result<Vec<Task>> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let now = Utc::now();

        let tasks = inputs
            .map(|(input, by_ai, archived)| insert_task(&tx, input, by_ai, archived, now))
            .collect::<Result<Vec<_>>>()?;

        tx.commit()?;
        Ok(tasks)
    }

    pub fn get_task(&self, id: i64) -> Result<Option<Task>> {
        let conn = self.lock()?;
        fetch_task(&conn, id)
    }

    /// Tasks ordered by id. Archived tasks are skipped unless asked for.
    pub fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let conn = self.lock()?;

        let mut sql = format!("SELECT {} FROM tasks WHERE 1 = 1", TASK_COLUMNS);
        if !filter.include_archived {
            sql.push_str(" AND archived = 0");
        }
        if filter.status.is_some() {
            sql.push_str(" AND status = ?1");
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = conn.prepare(&sql)?;
        let tasks = match filter.status {
            Some(status) => stmt.query_map([status.as_str()], row_to_task)?,
            None => stmt.query_map([], row_to_task)?,
        }
        .collect::<Result<Vec<_>, _>>()?;

        Ok(tasks)
    }

    /// Apply a partial update. Blank titles are ignored, a blank category
    /// resets to the default, a blank assignee clears it, and an explicit
    /// `null` due date clears it.
    pub fn update_task(&self, id: i64, input: UpdateTaskInput) -> Result<Option<Task>> {
        let conn = self.lock()?;
        let Some(existing) = fetch_task(&conn, id)? else {
            return Ok(None);
        };

        let title = input
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or(existing.title);
        let description = input
            .description
            .map(|d| d.trim().to_string())
            .unwrap_or(existing.description);
        let category = match input.category {
            Some(c) if c.trim().is_empty() => DEFAULT_CATEGORY.to_string(),
            Some(c) => c.trim().to_string(),
            None => existing.category,
        };
        let assignee = match input.assignee {
            Some(a) if a.trim().is_empty() => None,
            Some(a) => Some(a.trim().to_string()),
            None => existing.assignee,
        };

        let task = Task {
            id,
            title,
            description,
            priority: input.priority.unwrap_or(existing.priority),
            category,
            due_date: input.due_date.unwrap_or(existing.due_date),
            status: input.status.unwrap_or(existing.status),
            assignee,
            created_by_ai: existing.created_by_ai,
            archived: existing.archived,
            created_at: existing.created_at,
            updated_at: Utc::now(),
        };

        write_task(&conn, &task)?;
        Ok(Some(task))
    }

    /// Hand a task to someone else: sets the assignee and marks it delegated.
    pub fn delegate_task(&self, id: i64, assignee: &str) -> Result<Option<Task>> {
        let assignee = assignee.trim();
        if assignee.is_empty() {
            anyhow::bail!("Assignee is required");
        }

        self.update_task(
            id,
            UpdateTaskInput {
                status: Some(TaskStatus::Delegated),
                assignee: Some(assignee.to_string()),
                ..UpdateTaskInput::default()
            },
        )
    }

    /// Hide a task from default listings. Tasks are never deleted.
    pub fn archive_task(&self, id: i64) -> Result<bool> {
        let conn = self.lock()?;
        let rows = conn.execute(
            "UPDATE tasks SET archived = 1, updated_at = ? WHERE id = ?",
            params![Utc::now().to_rfc3339(), id],
        )?;
        Ok(rows > 0)
    }

    /// Counts over non-archived tasks, plus the number archived.
    pub fn get_stats(&self) -> Result<TaskStats> {
        let conn = self.lock()?;

        let count = |sql: &str| -> Result<usize> {
            let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };
        let group = |column: &str| -> Result<BTreeMap<String, usize>> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {0}, COUNT(*) FROM tasks WHERE archived = 0 GROUP BY {0}",
                column
            ))?;
            let pairs = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize))
                })?
                .collect::<Result<BTreeMap<_, _>, _>>()?;
            Ok(pairs)
        };

        Ok(TaskStats {
            total_tasks: count("SELECT COUNT(*) FROM tasks WHERE archived = 0")?,
            archived_tasks: count("SELECT COUNT(*) FROM tasks WHERE archived = 1")?,
            ai_generated_tasks: count(
                "SELECT COUNT(*) FROM tasks WHERE archived = 0 AND created_by_ai = 1",
            )?,
            by_status: group("status")?,
            by_priority: group("priority")?,
            by_category: group("category")?,
        })
    }
}

fn fetch_task(conn: &Connection, id: i64) -> Result<Option<Task>> {
    let task = conn
        .query_row(
            &format!("SELECT {} FROM tasks WHERE id = ?", TASK_COLUMNS),
            [id],
            row_to_task,
        )
        .optional()?;
    Ok(task)
}

fn write_task(conn: &Connection, task: &Task) -> Result<()> {
    conn.execute(
        "UPDATE tasks SET title = ?, description = ?, priority = ?, category = ?, due_date = ?,
         status = ?, assignee = ?, updated_at = ? WHERE id = ?",
        params![
            task.title,
            task.description,
            task.priority.as_str(),
            task.category,
            task.due_date.map(format_date),
            task.status.as_str(),
            task.assignee,
            task.updated_at.to_rfc3339(),
            task.id,
        ],
    )?;
    Ok(())
}

fn insert_task(
    conn: &Connection,
    input: &NewTask,
    created_by_ai: bool,
    archived: bool,
    now: DateTime<Utc>,
) -> Result<Task> {
    conn.execute(
        "INSERT INTO tasks (title, description, priority, category, due_date, status, assignee,
         created_by_ai, archived, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            input.title,
            input.description,
            input.priority.as_str(),
            input.category,
            input.due_date.map(format_date),
            input.status.as_str(),
            input.assignee,
            created_by_ai,
            archived,
            now.to_rfc3339(),
            now.to_rfc3339(),
        ],
    )?;

    Ok(Task {
        id: conn.last_insert_rowid(),
        title: input.title.clone(),
        description: input.description.clone(),
        priority: input.priority,
        category: input.category.clone(),
        due_date: input.due_date,
        status: input.status,
        assignee: input.assignee.clone(),
        created_by_ai,
        archived,
        created_at: now,
        updated_at: now,
    })
}

fn row_to_task(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        priority: Priority::from_str(&row.get::<_, String>(3)?).unwrap_or_default(),
        category: row.get(4)?,
        due_date: row.get::<_, Option<String>>(5)?.and_then(parse_date),
        status: TaskStatus::from_str(&row.get::<_, String>(6)?).unwrap_or_default(),
        assignee: row.get(7)?,
        created_by_ai: row.get(8)?,
        archived: row.get(9)?,
        created_at: parse_datetime(row.get::<_, String>(10)?),
        updated_at: parse_datetime(row.get::<_, String>(11)?),
    })
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(s: String) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
