//! Maps loosely-shaped extraction output onto the fixed task schema.
//!
//! Normalization never fails. Missing or malformed fields get defaults
//! (priority `medium`, category `general`, no due date), and output that is
//! not a recognizable list or object becomes a single task titled with the
//! raw text. Running the normalizer over its own output is a no-op.

use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};

use crate::config::Rules;
use crate::models::{NewTask, Priority, RawItem, TaskStatus};

pub const DEFAULT_CATEGORY: &str = "general";

/// Longest title derived from a description.
pub const MAX_DERIVED_TITLE_CHARS: usize = 80;

const LIST_KEYS: &[&str] = &["action_items", "tasks", "items"];
const TITLE_KEYS: &[&str] = &["title", "task", "name"];
const DESCRIPTION_KEYS: &[&str] = &["description", "task_description", "details"];
const CATEGORY_KEYS: &[&str] = &["category", "project"];
const ASSIGNEE_KEYS: &[&str] = &["assignee", "suggested_delegate", "delegate", "owner"];

/// Normalizes extracted items, applying keyword priority rules to items that
/// arrive without a usable priority.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    rules: Rules,
}

impl Normalizer {
    pub fn new(rules: Rules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Normalize raw model output.
    ///
    /// Text that is not JSON is treated as one task whose title is the
    /// trimmed text.
    pub fn normalize_output(&self, raw: &str) -> Vec<NewTask> {
        match serde_json::from_str::<Value>(strip_code_fence(raw)) {
            Ok(value) => self.normalize_value(&value),
            Err(_) => self.single_task(raw),
        }
    }

    /// Normalize an already-parsed JSON value.
    ///
    /// A value of no recognizable shape becomes one unprioritized task titled
    /// with its text.
    pub fn normalize_value(&self, value: &Value) -> Vec<NewTask> {
        match items_from_value(value) {
            Some(items) => self.normalize_items(&items),
            None => self.single_task(&value_text(value)),
        }
    }

    pub fn normalize_items(&self, items: &[RawItem]) -> Vec<NewTask> {
        items
            .iter()
            .filter_map(|item| self.normalize_item(item))
            .collect()
    }

    /// Fill in defaults for one item. Items with neither a title nor a
    /// description carry nothing actionable and are dropped.
    pub fn normalize_item(&self, item: &RawItem) -> Option<NewTask> {
        let description = clean(item.description.as_deref()).unwrap_or_default();
        let title = match clean(item.title.as_deref()) {
            Some(title) => title,
            None if !description.is_empty() => truncate_chars(&description, MAX_DERIVED_TITLE_CHARS),
            None => return None,
        };

        let priority = item
            .priority
            .as_deref()
            .and_then(Priority::parse_loose)
            .or_else(|| self.rules.priority_for(&format!("{} {}", title, description)))
            .unwrap_or_default();

        Some(NewTask {
            priority,
            category: clean(item.category.as_deref())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            due_date: item.due_date.as_deref().and_then(parse_due_date),
            assignee: clean(item.assignee.as_deref()),
            status: item
                .status
                .as_deref()
                .and_then(TaskStatus::parse_loose)
                .unwrap_or_default(),
            title,
            description,
        })
    }

    /// Re-normalize tasks that have already been through the normalizer.
    pub fn normalize_tasks(&self, tasks: &[NewTask]) -> Vec<NewTask> {
        let items: Vec<RawItem> = tasks.iter().map(RawItem::from).collect();
        self.normalize_items(&items)
    }

    /// Whole text as one task at the default priority. Keyword rules are not
    /// applied.
    fn single_task(&self, raw: &str) -> Vec<NewTask> {
        let title = raw.trim();
        if title.is_empty() {
            return Vec::new();
        }
        vec![NewTask {
            title: title.to_string(),
            description: String::new(),
            priority: Priority::default(),
            category: DEFAULT_CATEGORY.to_string(),
            due_date: None,
            assignee: None,
            status: TaskStatus::default(),
        }]
    }
}

/// Parse model output into raw items, unwrapping Markdown code fences.
/// Returns `None` when the output is not JSON of a recognizable shape.
pub fn parse_items(raw: &str) -> Option<Vec<RawItem>> {
    let body = strip_code_fence(raw);
    let value: Value = serde_json::from_str(body).ok()?;
    items_from_value(&value)
}

/// Recognized shapes: an array of item objects or strings, an object wrapping
/// such an array under `action_items`, `tasks` or `items`, or a single item
/// object.
pub fn items_from_value(value: &Value) -> Option<Vec<RawItem>> {
    match value {
        Value::Array(elements) => items_from_array(elements),
        Value::Object(map) => {
            if let Some(list) = LIST_KEYS.iter().find_map(|key| map.get(*key)) {
                return match list {
                    Value::Array(elements) => items_from_array(elements),
                    _ => None,
                };
            }
            if looks_like_item(map) {
                Some(vec![raw_item_from_object(map)])
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Elements that are neither objects nor strings are skipped. An array made
/// up only of such elements is not recognized.
fn items_from_array(elements: &[Value]) -> Option<Vec<RawItem>> {
    let items: Vec<RawItem> = elements
        .iter()
        .filter_map(|element| match element {
            Value::Object(map) => Some(raw_item_from_object(map)),
            Value::String(text) => Some(RawItem::titled(text.clone())),
            _ => None,
        })
        .collect();

    if items.is_empty() && !elements.is_empty() {
        return None;
    }
    Some(items)
}

/// True when `value` is a single item object (has a title or description
/// field under any alias).
pub fn is_item_object(value: &Value) -> bool {
    matches!(value, Value::Object(map) if looks_like_item(map))
}

fn looks_like_item(map: &Map<String, Value>) -> bool {
    TITLE_KEYS
        .iter()
        .chain(DESCRIPTION_KEYS)
        .any(|key| map.contains_key(*key))
}

fn raw_item_from_object(map: &Map<String, Value>) -> RawItem {
    RawItem {
        title: lookup(map, TITLE_KEYS),
        description: lookup(map, DESCRIPTION_KEYS),
        priority: lookup(map, &["priority"]),
        category: lookup(map, CATEGORY_KEYS),
        due_date: lookup(map, &["due_date", "due", "deadline"]),
        status: lookup(map, &["status"]),
        assignee: lookup(map, ASSIGNEE_KEYS),
    }
}

/// First alias holding a scalar value, rendered as text.
fn lookup(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Accepts `YYYY-MM-DD` and RFC 3339 timestamps.
pub fn parse_due_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}
