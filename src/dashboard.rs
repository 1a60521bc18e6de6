//! Workload dashboard: rankings, distributions, and rule-based insights.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Priority, Task, TaskStatus};
use crate::scoring::{RankedTask, UrgencyScorer};

pub const MAX_INSIGHTS: usize = 5;
const CRITICAL_ALERT_THRESHOLD: usize = 3;
const DELEGATION_ALERT_THRESHOLD: usize = 5;
const LOW_COMPLETION_PERCENT: f64 = 50.0;

/// One row of the timeline: a dated task spanning creation to due date.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineEntry {
    pub task_id: i64,
    pub title: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub priority: Priority,
    pub status: TaskStatus,
    pub overdue: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub today: NaiveDate,
    /// Open work, most urgent first. Done tasks are left out.
    pub ranked: Vec<RankedTask>,
    pub total_tasks: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_priority: BTreeMap<String, usize>,
    pub by_category: BTreeMap<String, usize>,
    pub overdue_tasks: usize,
    /// Percentage of tasks done, rounded to one decimal.
    pub completion_rate: f64,
    pub timeline: Vec<TimelineEntry>,
    pub insights: Vec<String>,
}

impl Dashboard {
    /// Summarize `tasks`. Archived tasks are ignored.
    pub fn build(tasks: Vec<Task>, scorer: &UrgencyScorer, today: NaiveDate) -> Self {
        let tasks: Vec<Task> = tasks.into_iter().filter(|t| !t.archived).collect();

        let mut by_status = BTreeMap::new();
        let mut by_priority = BTreeMap::new();
        let mut by_category = BTreeMap::new();
        for task in &tasks {
            *by_status.entry(task.status.as_str().to_string()).or_insert(0) += 1;
            *by_priority.entry(task.priority.as_str().to_string()).or_insert(0) += 1;
            *by_category.entry(task.category.clone()).or_insert(0) += 1;
        }

        let overdue_tasks = tasks.iter().filter(|t| t.is_overdue(today)).count();
        let completion_rate = completion_rate(&tasks);

        let mut timeline: Vec<TimelineEntry> = tasks
            .iter()
            .filter_map(|task| {
                let due = task.due_date?;
                let created = task.created_at.date_naive();
                Some(TimelineEntry {
                    task_id: task.id,
                    title: task.title.clone(),
                    start: created.min(due),
                    end: due,
                    priority: task.priority,
                    status: task.status,
                    overdue: task.is_overdue(today),
                })
            })
            .collect();
        timeline.sort_by(|a, b| a.end.cmp(&b.end).then(a.task_id.cmp(&b.task_id)));

        let insights = insights(&tasks, overdue_tasks, completion_rate);

        let total_tasks: usize = by_status.values().sum();

        Self {
            today,
            ranked: scorer.rank_open(tasks, today),
            total_tasks,
            by_status,
            by_priority,
            by_category,
            overdue_tasks,
            completion_rate,
            timeline,
            insights,
        }
    }
}

fn completion_rate(tasks: &[Task]) -> f64 {
    if tasks.is_empty() {
        return 0.0;
    }
    let done = tasks.iter().filter(|t| t.status == TaskStatus::Done).count();
    let percent = done as f64 / tasks.len() as f64 * 100.0;
    (percent * 10.0).round() / 10.0
}

fn insights(tasks: &[Task], overdue: usize, completion_rate: f64) -> Vec<String> {
    let mut insights = Vec::new();

    if !tasks.is_empty() {
        if overdue > 0 {
            insights.push(format!(
                "You have {} overdue tasks that need immediate attention.",
                overdue
            ));
        }

        let critical = tasks
            .iter()
            .filter(|t| t.priority == Priority::Critical && t.status != TaskStatus::Done)
            .count();
        if critical > CRITICAL_ALERT_THRESHOLD {
            insights.push(format!(
                "High workload alert: {} critical tasks open. Consider delegating.",
                critical
            ));
        }

        if completion_rate < LOW_COMPLETION_PERCENT {
            insights.push(format!(
                "Current completion rate is {:.1}%. Focus on finishing existing tasks.",
                completion_rate
            ));
        }

        if let Some((category, count)) = top_category(tasks) {
            insights.push(format!(
                "Most tasks are in the {} category ({} tasks).",
                category, count
            ));
        }

        let delegated = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Delegated)
            .count();
        if delegated > DELEGATION_ALERT_THRESHOLD {
            insights.push(format!(
                "You have {} active delegations. Follow up for status updates.",
                delegated
            ));
        }
    }

    if insights.is_empty() {
        insights.push("Your workload looks manageable.".to_string());
    }
    insights.truncate(MAX_INSIGHTS);
    insights
}

/// Largest category; ties go to the alphabetically first name.
fn top_category(tasks: &[Task]) -> Option<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for task in tasks {
        *counts.entry(task.category.as_str()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .fold(None, |best: Option<(&str, usize)>, (name, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((name, count)),
        })
        .map(|(name, count)| (name.to_string(), count))
}
