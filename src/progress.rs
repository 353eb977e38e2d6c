//! Progress aggregation: per-stage percentages, weighted overall progress,
//! current-phase selection, the on-track heuristic, and the rule-based
//! suggestion/warning battery.
//!
//! Everything here is pure: callers pass the rows and the clock, and get a
//! report back. Persistence of the resulting snapshot is the service's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{EventRecord, Milestone, Phase, Stage, StageStatus, Subtask, TaskStatus};
use crate::templates::phase_config;

/// Suggestions and warnings are each capped at this many entries.
const MAX_INSIGHTS: usize = 5;
/// More than this many overdue tasks flips the on-track flag.
const ON_TRACK_OVERDUE_LIMIT: usize = 3;
/// Marketing below 50% this close to the event draws a warning.
const MARKETING_WINDOW_DAYS: i64 = 30;
const SPEAKER_WINDOW_DAYS: i64 = 21;
const VENUE_WINDOW_DAYS: i64 = 45;
const MILESTONE_WINDOW_DAYS: i64 = 7;

/// Recomputed state for one stage, including its phase's catalog fields.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseSnapshot {
    pub stage_id: i64,
    pub phase: Phase,
    pub status: StageStatus,
    pub progress: f64,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub color: &'static str,
    pub icon: &'static str,
    pub name: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCounts {
    pub total: i64,
    pub todo: i64,
    pub in_progress: i64,
    pub review: i64,
    pub done: i64,
    pub blocked: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneCounts {
    pub total: i64,
    pub completed: i64,
    pub upcoming: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineInfo {
    pub days_until_event: i64,
    pub days_into_planning: i64,
    pub is_on_track: bool,
}

/// Full aggregation output for one event.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    pub overall_progress: f64,
    pub current_phase: Phase,
    pub phases: Vec<PhaseSnapshot>,
    pub tasks: TaskCounts,
    pub milestones: MilestoneCounts,
    pub timeline: TimelineInfo,
    /// Overdue per the persisted-row definition: past due, not done, not blocked.
    pub overdue_tasks: i64,
    pub suggestions: Vec<String>,
    pub warnings: Vec<String>,
}

/// A subtask counts toward stage completion once it reaches review.
fn counts_as_completed(status: TaskStatus) -> bool {
    matches!(status, TaskStatus::Done | TaskStatus::Review)
}

/// Stage percentage from subtask counts. An explicitly completed stage is
/// always 100 regardless of its counts.
pub fn stage_progress(status: StageStatus, completed: i64, total: i64) -> f64 {
    if status == StageStatus::Completed {
        return 100.0;
    }
    if total > 0 {
        completed as f64 / total as f64 * 100.0
    } else {
        0.0
    }
}

/// Aggregate an event's stages, subtasks, and milestones into a report.
pub fn aggregate(
    event: &EventRecord,
    stages: &[Stage],
    subtasks: &[Subtask],
    milestones: &[Milestone],
    now: DateTime<Utc>,
) -> ProgressReport {
    let mut phases = Vec::with_capacity(stages.len());
    let mut total_weighted_progress = 0.0;
    let mut total_weight = 0u32;

    for stage in stages {
        let stage_subtasks: Vec<&Subtask> = subtasks
            .iter()
            .filter(|s| s.stage_id == stage.id)
            .collect();
        let completed = stage_subtasks
            .iter()
            .filter(|s| counts_as_completed(s.status))
            .count() as i64;
        let total = stage_subtasks.len() as i64;
        let progress = stage_progress(stage.status, completed, total);

        let config = phase_config(stage.phase);
        total_weighted_progress += progress * config.weight as f64;
        total_weight += config.weight;

        phases.push(PhaseSnapshot {
            stage_id: stage.id,
            phase: stage.phase,
            status: stage.status,
            progress,
            total_tasks: total,
            completed_tasks: completed,
            color: config.color,
            icon: config.icon,
            name: config.name,
        });
    }

    let overall_progress = if total_weight > 0 {
        total_weighted_progress / total_weight as f64
    } else {
        0.0
    };

    let count_status = |status: TaskStatus| -> i64 {
        subtasks.iter().filter(|s| s.status == status).count() as i64
    };
    let tasks = TaskCounts {
        total: subtasks.len() as i64,
        todo: count_status(TaskStatus::Todo),
        in_progress: count_status(TaskStatus::InProgress),
        review: count_status(TaskStatus::Review),
        done: count_status(TaskStatus::Done),
        blocked: count_status(TaskStatus::Blocked),
    };

    let days_until_event = (event.scheduled_date - now).num_days();
    let days_into_planning = (now - event.created_at).num_days();

    let upcoming = milestones
        .iter()
        .filter(|m| !m.is_completed && m.due_date > now)
        .min_by_key(|m| m.due_date)
        .map(|m| m.due_date);

    let milestone_counts = MilestoneCounts {
        total: milestones.len() as i64,
        completed: milestones.iter().filter(|m| m.is_completed).count() as i64,
        upcoming,
    };

    let is_on_track = check_on_track(subtasks, days_until_event, now);
    let (suggestions, warnings) =
        generate_insights(subtasks, milestones, days_until_event, &phases, now);

    let overdue_tasks = subtasks
        .iter()
        .filter(|s| {
            s.due_date.is_some_and(|due| due < now)
                && !matches!(s.status, TaskStatus::Done | TaskStatus::Blocked)
        })
        .count() as i64;

    ProgressReport {
        overall_progress,
        current_phase: current_phase(&phases),
        phases,
        tasks,
        milestones: milestone_counts,
        timeline: TimelineInfo {
            days_until_event,
            days_into_planning,
            is_on_track,
        },
        overdue_tasks,
        suggestions,
        warnings,
    }
}

/// First phase in canonical order that is in progress, or pending with
/// nonzero progress. Falls back to ideation.
pub fn current_phase(phases: &[PhaseSnapshot]) -> Phase {
    for phase in Phase::ALL {
        let Some(snapshot) = phases.iter().find(|p| p.phase == phase) else {
            continue;
        };
        if snapshot.status == StageStatus::InProgress {
            return phase;
        }
        if snapshot.status == StageStatus::Pending && snapshot.progress > 0.0 {
            return phase;
        }
    }
    Phase::Ideation
}

fn check_on_track(subtasks: &[Subtask], days_until: i64, now: DateTime<Utc>) -> bool {
    if subtasks.iter().any(|s| s.status == TaskStatus::Blocked) {
        return false;
    }

    let overdue = subtasks
        .iter()
        .filter(|s| s.due_date.is_some_and(|due| due < now) && s.status != TaskStatus::Done)
        .count();
    if overdue > ON_TRACK_OVERDUE_LIMIT {
        return false;
    }

    let remaining = subtasks.iter().filter(|s| s.status != TaskStatus::Done).count();
    if days_until > 0 && remaining as i64 > days_until * 2 {
        return false;
    }

    true
}

fn phase_percent(phases: &[PhaseSnapshot], phase: Phase) -> f64 {
    phases
        .iter()
        .find(|p| p.phase == phase)
        .map_or(0.0, |p| p.progress)
}

fn generate_insights(
    subtasks: &[Subtask],
    milestones: &[Milestone],
    days_until: i64,
    phases: &[PhaseSnapshot],
    now: DateTime<Utc>,
) -> (Vec<String>, Vec<String>) {
    let mut suggestions = Vec::new();
    let mut warnings = Vec::new();

    let blocked = subtasks
        .iter()
        .filter(|s| s.status == TaskStatus::Blocked)
        .count();
    if blocked > 0 {
        warnings.push(format!(
            "{} task(s) are blocked. Resolve dependencies to continue.",
            blocked
        ));
        suggestions.push("Review blocked tasks and remove obstacles or reassign.".to_string());
    }

    let overdue = subtasks
        .iter()
        .filter(|s| s.due_date.is_some_and(|due| due < now) && s.status != TaskStatus::Done)
        .count();
    if overdue > 0 {
        warnings.push(format!("{} task(s) are overdue.", overdue));
        suggestions.push("Prioritize completing overdue tasks to stay on track.".to_string());
    }

    if phase_percent(phases, Phase::Marketing) < 50.0 && days_until < MARKETING_WINDOW_DAYS {
        warnings.push("Marketing is behind schedule with less than 30 days to go.".to_string());
        suggestions.push("Increase marketing efforts and launch campaigns soon.".to_string());
    }

    let pending_speaker_confirms = subtasks
        .iter()
        .filter(|s| {
            let title = s.title.to_lowercase();
            title.contains("speaker") && title.contains("confirm") && s.status != TaskStatus::Done
        })
        .count();
    if pending_speaker_confirms > 0 && days_until < SPEAKER_WINDOW_DAYS {
        warnings.push(format!(
            "{} speaker confirmation(s) pending.",
            pending_speaker_confirms
        ));
        suggestions.push("Send follow-up emails to unconfirmed speakers.".to_string());
    }

    let venue_booking = subtasks.iter().find(|s| {
        let title = s.title.to_lowercase();
        title.contains("venue") && title.contains("book")
    });
    if venue_booking.is_some_and(|s| s.status != TaskStatus::Done) && days_until < VENUE_WINDOW_DAYS
    {
        warnings.push("Venue not yet booked with less than 45 days remaining.".to_string());
        suggestions.push("Book a venue immediately to secure your date.".to_string());
    }

    if let Some(next) = milestones
        .iter()
        .filter(|m| !m.is_completed && m.due_date > now)
        .min_by_key(|m| m.due_date)
    {
        let days_to_milestone = (next.due_date - now).num_days();
        if days_to_milestone < MILESTONE_WINDOW_DAYS {
            warnings.push(format!(
                "Next milestone '{}' is in {} days!",
                next.title, days_to_milestone
            ));
            suggestions.push(format!("Focus on completing tasks related to: {}", next.title));
        }
    }

    if phase_percent(phases, Phase::Execution) == 100.0 {
        suggestions
            .push("\u{1F389} All preparation complete! You're ready for event day!".to_string());
    }

    if phase_percent(phases, Phase::Ideation) > 50.0 && phase_percent(phases, Phase::Logistics) > 50.0
    {
        suggestions
            .push("Great progress on planning and logistics! Keep the momentum going.".to_string());
    }

    suggestions.truncate(MAX_INSIGHTS);
    warnings.truncate(MAX_INSIGHTS);
    (suggestions, warnings)
}
