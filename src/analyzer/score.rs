//! Priority scoring and effort estimation.
//!
//! Scores are additive: base priority weight, status urgency, due-date
//! proximity, and event proximity scaled by category importance. The same
//! score drives both the prioritization insight and the priority
//! recommendations, so thresholds here and in `mod.rs` must agree.

use chrono::{DateTime, Utc};

use crate::analyzer::types::AnalyzerTask;
use crate::model::{Priority, TaskStatus};

/// Score at or above which a non-high task should be raised.
pub const RAISE_THRESHOLD: f64 = 3.5;
/// Score at or below which a high/critical task can be lowered.
pub const LOWER_THRESHOLD: f64 = 1.5;

fn priority_weight(priority: Priority) -> f64 {
    match priority {
        Priority::Critical => 4.0,
        Priority::High => 3.0,
        Priority::Medium => 2.0,
        Priority::Low => 1.0,
    }
}

fn status_urgency(status: TaskStatus) -> f64 {
    match status {
        TaskStatus::Blocked => 4.0,
        TaskStatus::InProgress => 3.0,
        TaskStatus::Todo => 2.0,
        TaskStatus::Review => 1.5,
        TaskStatus::Done => 0.0,
    }
}

/// Weight of a task's category when the event date approaches. Venue and
/// speaker work dominates, logistics and registration follow, everything
/// else is standard.
fn event_importance(task: &AnalyzerTask) -> f64 {
    match task.category.as_str() {
        "venue" | "speakers" => 1.0,
        "logistics" | "registration" => 0.8,
        _ => 0.5,
    }
}

/// Dynamic priority score for a task at a point in time.
pub fn priority_score(
    task: &AnalyzerTask,
    event_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> f64 {
    let mut score = priority_weight(task.priority);
    score += status_urgency(task.status) * 0.3;

    if let Some(due) = task.due_date {
        // num_days() truncates toward zero, so a sub-day-overdue task would
        // read as 0 days; compare instants for the overdue case.
        if due < now {
            score += 2.0;
        } else {
            let days_until_due = (due - now).num_days();
            if days_until_due <= 3 {
                score += 1.5;
            } else if days_until_due <= 7 {
                score += 1.0;
            } else if days_until_due <= 14 {
                score += 0.5;
            }
        }
    }

    if let Some(event_date) = event_date {
        let days_until_event = (event_date - now).num_days();
        score += (30 - days_until_event) as f64 * event_importance(task) * 0.02;
    }

    score
}

/// Human-readable factors behind a task's score, for recommendation output.
pub fn priority_factors(task: &AnalyzerTask, now: DateTime<Utc>) -> Vec<String> {
    let mut factors = Vec::new();

    match task.priority {
        Priority::Critical => factors.push("Marked as critical priority".to_string()),
        Priority::High => factors.push("Marked as high priority".to_string()),
        _ => {}
    }

    if let Some(due) = task.due_date {
        if due < now {
            factors.push("Task is overdue".to_string());
        } else {
            let days_until_due = (due - now).num_days();
            if days_until_due <= 7 {
                factors.push(format!("Due in {} days", days_until_due));
            }
        }
    }

    match task.status {
        TaskStatus::InProgress => factors.push("Already in progress".to_string()),
        TaskStatus::Todo => factors.push("Not yet started".to_string()),
        _ => {}
    }

    if task.is_blocked {
        factors.push("Task is blocked".to_string());
    }

    match task.assignee_id {
        Some(id) => factors.push(format!("Assigned to member {}", id)),
        None => factors.push("Unassigned".to_string()),
    }

    factors
}

/// Rough effort estimate in days, from priority and description length.
pub fn estimate_effort(task: &AnalyzerTask) -> f64 {
    let base = match task.priority {
        Priority::Critical => 2.0,
        Priority::High => 1.5,
        Priority::Medium => 1.0,
        Priority::Low => 0.5,
    };

    let desc_len = task.description.as_deref().map_or(0, str::len);
    if desc_len > 200 {
        base * 1.5
    } else if desc_len > 100 {
        base * 1.25
    } else {
        base
    }
}
