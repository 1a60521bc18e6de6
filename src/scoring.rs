//! Urgency scoring and ranking.
//!
//! A task's urgency is a weighted sum of three components, each in `[0, 1]`:
//!
//! | Component | Weight | Source |
//! |-----------|--------|--------|
//! | Due date  | 0.4    | Days until due; overdue saturates at 1.0 |
//! | Priority  | 0.4    | critical 1.0, high 0.75, medium 0.5, low 0.25 |
//! | Category  | 0.1    | Configured weight, 0.5 when unknown |
//!
//! The remaining 0.1 is reserved, so scores never exceed 0.9. Scoring is a
//! pure function of the task fields and the date passed in as "today".

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::Rules;
use crate::models::{Priority, Task, TaskStatus};

pub const DUE_WEIGHT: f64 = 0.4;
pub const PRIORITY_WEIGHT: f64 = 0.4;
pub const CATEGORY_WEIGHT: f64 = 0.1;

/// Due-date component for tasks without a due date. Equal to a task due in
/// three weeks.
pub const NEUTRAL_DUE: f64 = 0.25;

/// Category component for categories missing from the weight table.
pub const DEFAULT_CATEGORY_WEIGHT: f64 = 0.5;

/// Days over which the due-date component halves.
const DUE_HALF_LIFE_DAYS: f64 = 7.0;

/// Due-date component: 1.0 when due today or overdue, decaying towards 0 as
/// the due date moves out.
pub fn due_component(due_date: Option<NaiveDate>, today: NaiveDate) -> f64 {
    match due_date {
        None => NEUTRAL_DUE,
        Some(due) => {
            let days = (due - today).num_days();
            if days <= 0 {
                1.0
            } else {
                1.0 / (1.0 + days as f64 / DUE_HALF_LIFE_DAYS)
            }
        }
    }
}

/// Priority component.
pub fn priority_component(priority: Priority) -> f64 {
    match priority {
        Priority::Critical => 1.0,
        Priority::High => 0.75,
        Priority::Medium => 0.5,
        Priority::Low => 0.25,
    }
}

/// Per-component contributions to a task's score, already weighted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreBreakdown {
    pub due: f64,
    pub priority: f64,
    pub category: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.due + self.priority + self.category
    }
}

/// A task paired with its urgency score, as handed to the dashboard layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedTask {
    #[serde(flatten)]
    pub task: Task,
    pub urgency_score: f64,
    pub breakdown: ScoreBreakdown,
}

/// Scores tasks against a category weight table.
#[derive(Debug, Clone)]
pub struct UrgencyScorer {
    /// Lower-cased category name to weight in `[0, 1]`.
    category_weights: HashMap<String, f64>,
}

impl Default for UrgencyScorer {
    fn default() -> Self {
        Self::from_rules(&Rules::default())
    }
}

impl UrgencyScorer {
    /// Build a scorer from arbitrary weights. Names are matched
    /// case-insensitively and weights are clamped to `[0, 1]`; non-finite
    /// weights fall back to the default.
    pub fn new(weights: impl IntoIterator<Item = (String, f64)>) -> Self {
        let category_weights = weights
            .into_iter()
            .map(|(name, weight)| {
                let weight = if weight.is_finite() {
                    weight.clamp(0.0, 1.0)
                } else {
                    DEFAULT_CATEGORY_WEIGHT
                };
                (name.trim().to_lowercase(), weight)
            })
            .collect();
        Self { category_weights }
    }

    pub fn from_rules(rules: &Rules) -> Self {
        Self::new(rules.category_weights.clone())
    }

    /// Category component; unknown categories get [`DEFAULT_CATEGORY_WEIGHT`].
    pub fn category_component(&self, category: &str) -> f64 {
        self.category_weights
            .get(&category.trim().to_lowercase())
            .copied()
            .unwrap_or(DEFAULT_CATEGORY_WEIGHT)
    }

    pub fn breakdown(&self, task: &Task, today: NaiveDate) -> ScoreBreakdown {
        ScoreBreakdown {
            due: DUE_WEIGHT * due_component(task.due_date, today),
            priority: PRIORITY_WEIGHT * priority_component(task.priority),
            category: CATEGORY_WEIGHT * self.category_component(&task.category),
        }
    }

    /// Composite urgency score in `[0, 1]`.
    pub fn score(&self, task: &Task, today: NaiveDate) -> f64 {
        self.breakdown(task, today).total()
    }

    /// Score and sort tasks, most urgent first.
    ///
    /// Ties are broken by earliest due date (undated tasks last), then by id.
    pub fn rank(&self, tasks: impl IntoIterator<Item = Task>, today: NaiveDate) -> Vec<RankedTask> {
        let mut ranked: Vec<RankedTask> = tasks
            .into_iter()
            .map(|task| {
                let breakdown = self.breakdown(&task, today);
                RankedTask {
                    urgency_score: breakdown.total(),
                    breakdown,
                    task,
                }
            })
            .collect();

        ranked.sort_by(compare_ranked);
        ranked
    }

    /// [`rank`](Self::rank) restricted to tasks that are not done.
    pub fn rank_open(&self, tasks: impl IntoIterator<Item = Task>, today: NaiveDate) -> Vec<RankedTask> {
        self.rank(
            tasks.into_iter().filter(|t| t.status != TaskStatus::Done),
            today,
        )
    }
}

fn compare_ranked(a: &RankedTask, b: &RankedTask) -> Ordering {
    b.urgency_score
        .total_cmp(&a.urgency_score)
        .then_with(|| match (a.task.due_date, b.task.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.task.id.cmp(&b.task.id))
}
