//! Workflow orchestration: initialization, state transitions, progress
//! recalculation, and analysis.
//!
//! Every mutation runs its follow-up recalculation inside the same database
//! lock acquisition, so two concurrent mutations cannot interleave their
//! progress snapshots.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::analyzer::{analyze_workflow, AnalyzerTask, WorkflowAnalysis};
use crate::errors::WorkflowError;
use crate::model::{
    EventRecord, Milestone, Phase, Stage, StageStatus, Subtask, TaskStatus, WorkflowProgress,
};
use crate::progress::{aggregate, ProgressReport};
use crate::store::{DbHandle, SubtaskSeed, WorkflowDb};
use crate::templates::{
    generate_milestones, phase_config, phase_configs, subtask_templates, STAGE_DUE_BUFFER_DAYS,
};

type ServiceResult<T> = Result<T, WorkflowError>;

/// One stage with its subtasks grouped by category, for the summary view.
#[derive(Debug, Clone, Serialize)]
pub struct StageDetail {
    pub id: i64,
    pub phase: Phase,
    pub name: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub status: StageStatus,
    pub progress: f64,
    pub categories: Vec<CategoryGroup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryGroup {
    pub category: String,
    pub tasks: Vec<SubtaskBrief>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubtaskBrief {
    pub id: i64,
    pub title: String,
    pub status: TaskStatus,
    pub priority: crate::model::Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub assignee_id: Option<i64>,
}

/// Progress report plus the per-stage breakdown and milestone list.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSummary {
    pub progress: ProgressReport,
    pub stages: Vec<StageDetail>,
    pub milestones: Vec<Milestone>,
}

/// Async facade over the store. Cheap to clone.
#[derive(Clone)]
pub struct WorkflowService {
    db: DbHandle,
    clock: fn() -> DateTime<Utc>,
}

impl WorkflowService {
    pub fn new(db: WorkflowDb) -> Self {
        Self {
            db: DbHandle::new(db),
            clock: Utc::now,
        }
    }

    /// Construct with a fixed clock. Tests use this to pin day arithmetic.
    pub fn with_clock(db: WorkflowDb, clock: fn() -> DateTime<Utc>) -> Self {
        Self {
            db: DbHandle::new(db),
            clock,
        }
    }

    // ── Events ────────────────────────────────────────────────────────

    pub async fn create_event(
        &self,
        title: String,
        topic: String,
        description: String,
        scheduled_date: DateTime<Utc>,
    ) -> ServiceResult<EventRecord> {
        let now = (self.clock)();
        let event = self
            .db
            .call(move |db| db.create_event(&title, &topic, &description, scheduled_date, now))
            .await?;
        info!(event_id = event.id, title = %event.title, "event created");
        Ok(event)
    }

    pub async fn get_event(&self, event_id: i64) -> ServiceResult<EventRecord> {
        self.db
            .call(move |db| Ok(db.get_event(event_id)?))
            .await?
            .ok_or(WorkflowError::EventNotFound { id: event_id })
    }

    // ── Initialization ────────────────────────────────────────────────

    /// Create the per-event workflow scaffolding: a progress row, one stage
    /// per phase, and the milestone schedule for the event type. Unknown
    /// event types fall back to the meetup schedule. Fails if the event
    /// already has a workflow.
    pub async fn initialize_workflow(
        &self,
        event_id: i64,
        event_type: &str,
    ) -> ServiceResult<WorkflowProgress> {
        let now = (self.clock)();
        let event_type = event_type.to_string();

        let progress = self
            .db
            .call(move |db| {
                let Some(event) = db.get_event(event_id)? else {
                    return Ok(Err(WorkflowError::EventNotFound { id: event_id }));
                };
                if db.get_progress(event_id)?.is_some() {
                    return Ok(Err(WorkflowError::AlreadyInitialized { event_id }));
                }

                let progress = db.insert_progress(event_id, now)?;

                let stage_due = event.scheduled_date - Duration::days(STAGE_DUE_BUFFER_DAYS);
                for config in phase_configs() {
                    db.insert_stage(event_id, config.phase, Some(stage_due), config.order)?;
                }

                for seed in generate_milestones(&event_type, event.scheduled_date) {
                    db.insert_milestone(event_id, &seed)?;
                }

                Ok(Ok(progress))
            })
            .await??;

        info!(event_id, "workflow initialized");
        Ok(progress)
    }

    /// Populate a stage with its phase's default checklist. Skips nothing:
    /// callers seeding twice get duplicates, so seed once per stage.
    pub async fn seed_stage_subtasks(&self, stage_id: i64) -> ServiceResult<Vec<Subtask>> {
        let now = (self.clock)();
        let created = self
            .db
            .call(move |db| {
                let Some(stage) = db.get_stage(stage_id)? else {
                    return Ok(Err(WorkflowError::StageNotFound { id: stage_id }));
                };

                let mut created = Vec::new();
                for template in subtask_templates(stage.phase) {
                    created.push(db.insert_subtask(&SubtaskSeed {
                        stage_id,
                        title: template.title.to_string(),
                        description: Some(template.description.to_string()),
                        category: template.category.to_string(),
                        status: TaskStatus::Todo,
                        priority: template.priority,
                        depends_on: None,
                        assignee_id: None,
                        due_date: None,
                        estimated_hours: Some(template.estimated_hours),
                        order: template.order,
                        notes: None,
                    })?);
                }
                recalculate(db, stage.event_id, now)?;
                Ok(Ok(created))
            })
            .await??;

        info!(stage_id, count = created.len(), "stage subtasks seeded");
        Ok(created)
    }

    /// Create a single ad-hoc subtask.
    pub async fn create_subtask(
        &self,
        seed: SubtaskSeed,
    ) -> ServiceResult<Subtask> {
        let now = (self.clock)();
        let subtask = self
            .db
            .call(move |db| {
                let Some(stage) = db.get_stage(seed.stage_id)? else {
                    return Ok(Err(WorkflowError::StageNotFound { id: seed.stage_id }));
                };
                let subtask = db.insert_subtask(&seed)?;
                recalculate(db, stage.event_id, now)?;
                Ok(Ok(subtask))
            })
            .await??;
        debug!(subtask_id = subtask.id, "subtask created");
        Ok(subtask)
    }

    // ── Progress ──────────────────────────────────────────────────────

    /// Recompute and persist the event's progress snapshot, returning the
    /// full report.
    pub async fn calculate_progress(&self, event_id: i64) -> ServiceResult<ProgressReport> {
        let now = (self.clock)();
        let report = self
            .db
            .call(move |db| {
                match recalculate(db, event_id, now)? {
                    Some(report) => Ok(Ok(report)),
                    None => Ok(Err(WorkflowError::EventNotFound { id: event_id })),
                }
            })
            .await??;
        Ok(report)
    }

    /// Stored progress row, without recomputation.
    pub async fn get_progress(&self, event_id: i64) -> ServiceResult<WorkflowProgress> {
        self.db
            .call(move |db| Ok(db.get_progress(event_id)?))
            .await?
            .ok_or(WorkflowError::EventNotFound { id: event_id })
    }

    // ── Subtask transitions ───────────────────────────────────────────

    /// Set a subtask's status from its string form. Completion stamps the
    /// task; the blocked flag always tracks the status.
    pub async fn update_subtask_status(
        &self,
        subtask_id: i64,
        status: &str,
        user_id: Option<i64>,
    ) -> ServiceResult<Subtask> {
        let status: TaskStatus = status.parse().map_err(|_| WorkflowError::InvalidValue {
            field: "status",
            value: status.to_string(),
        })?;
        let now = (self.clock)();

        let subtask = self
            .db
            .call(move |db| {
                let Some(subtask) = db.get_subtask(subtask_id)? else {
                    return Ok(Err(WorkflowError::SubtaskNotFound { id: subtask_id }));
                };

                let (completed_at, completed_by) = if status == TaskStatus::Done {
                    (Some(now), user_id)
                } else {
                    (subtask.completed_at, subtask.completed_by)
                };
                let is_blocked = status == TaskStatus::Blocked;
                db.update_subtask_status(subtask_id, status, is_blocked, completed_at, completed_by)?;

                let Some(stage) = db.get_stage(subtask.stage_id)? else {
                    return Ok(Err(WorkflowError::StageNotFound { id: subtask.stage_id }));
                };
                recalculate(db, stage.event_id, now)?;

                let updated = db
                    .get_subtask(subtask_id)?
                    .ok_or_else(|| anyhow::anyhow!("Subtask missing after update"))?;
                Ok(Ok(updated))
            })
            .await??;

        info!(subtask_id, status = %subtask.status, "subtask status updated");
        Ok(subtask)
    }

    /// Block a subtask, recording the reason in its notes.
    pub async fn block_subtask(&self, subtask_id: i64, reason: &str) -> ServiceResult<Subtask> {
        let now = (self.clock)();
        let notes = format!("BLOCKED: {}", reason);

        let subtask = self
            .db
            .call(move |db| {
                let Some(subtask) = db.get_subtask(subtask_id)? else {
                    return Ok(Err(WorkflowError::SubtaskNotFound { id: subtask_id }));
                };
                db.set_subtask_block(subtask_id, TaskStatus::Blocked, true, Some(&notes))?;

                let Some(stage) = db.get_stage(subtask.stage_id)? else {
                    return Ok(Err(WorkflowError::StageNotFound { id: subtask.stage_id }));
                };
                recalculate(db, stage.event_id, now)?;

                let updated = db
                    .get_subtask(subtask_id)?
                    .ok_or_else(|| anyhow::anyhow!("Subtask missing after update"))?;
                Ok(Ok(updated))
            })
            .await??;

        info!(subtask_id, "subtask blocked");
        Ok(subtask)
    }

    /// Unblock a subtask, returning it to todo and clearing its notes.
    pub async fn unblock_subtask(&self, subtask_id: i64) -> ServiceResult<Subtask> {
        let now = (self.clock)();

        let subtask = self
            .db
            .call(move |db| {
                let Some(subtask) = db.get_subtask(subtask_id)? else {
                    return Ok(Err(WorkflowError::SubtaskNotFound { id: subtask_id }));
                };
                db.set_subtask_block(subtask_id, TaskStatus::Todo, false, None)?;

                let Some(stage) = db.get_stage(subtask.stage_id)? else {
                    return Ok(Err(WorkflowError::StageNotFound { id: subtask.stage_id }));
                };
                recalculate(db, stage.event_id, now)?;

                let updated = db
                    .get_subtask(subtask_id)?
                    .ok_or_else(|| anyhow::anyhow!("Subtask missing after update"))?;
                Ok(Ok(updated))
            })
            .await??;

        info!(subtask_id, "subtask unblocked");
        Ok(subtask)
    }

    // ── Stage transitions ─────────────────────────────────────────────

    /// Mark a stage as in progress.
    pub async fn start_stage(&self, event_id: i64, stage_id: i64) -> ServiceResult<Stage> {
        let now = (self.clock)();

        let stage = self
            .db
            .call(move |db| {
                let Some(stage) = db.get_stage(stage_id)? else {
                    return Ok(Err(WorkflowError::StageNotFound { id: stage_id }));
                };
                if stage.event_id != event_id {
                    return Ok(Err(WorkflowError::StageNotFound { id: stage_id }));
                }

                db.update_stage_state(stage_id, StageStatus::InProgress, Some(now), None)?;
                recalculate(db, event_id, now)?;

                let updated = db
                    .get_stage(stage_id)?
                    .ok_or_else(|| anyhow::anyhow!("Stage missing after update"))?;
                Ok(Ok(updated))
            })
            .await??;

        info!(event_id, stage_id, phase = %stage.phase, "stage started");
        Ok(stage)
    }

    /// Mark a stage as completed. Fails while any subtask is neither done
    /// nor blocked.
    pub async fn complete_stage(&self, event_id: i64, stage_id: i64) -> ServiceResult<Stage> {
        let now = (self.clock)();

        let stage = self
            .db
            .call(move |db| {
                let Some(stage) = db.get_stage(stage_id)? else {
                    return Ok(Err(WorkflowError::StageNotFound { id: stage_id }));
                };
                if stage.event_id != event_id {
                    return Ok(Err(WorkflowError::StageNotFound { id: stage_id }));
                }

                let subtasks = db.list_subtasks_for_stage(stage_id)?;
                let remaining = subtasks
                    .iter()
                    .filter(|s| !matches!(s.status, TaskStatus::Done | TaskStatus::Blocked))
                    .count();
                if remaining > 0 {
                    return Ok(Err(WorkflowError::IncompleteSubtasks {
                        stage_id,
                        remaining,
                    }));
                }

                db.update_stage_state(stage_id, StageStatus::Completed, None, Some(now))?;
                recalculate(db, event_id, now)?;

                let updated = db
                    .get_stage(stage_id)?
                    .ok_or_else(|| anyhow::anyhow!("Stage missing after update"))?;
                Ok(Ok(updated))
            })
            .await??;

        info!(event_id, stage_id, phase = %stage.phase, "stage completed");
        Ok(stage)
    }

    // ── Milestones ────────────────────────────────────────────────────

    pub async fn complete_milestone(
        &self,
        event_id: i64,
        milestone_id: i64,
    ) -> ServiceResult<Milestone> {
        let now = (self.clock)();

        let milestone = self
            .db
            .call(move |db| {
                let Some(milestone) = db.get_milestone(milestone_id)? else {
                    return Ok(Err(WorkflowError::MilestoneNotFound { id: milestone_id }));
                };
                if milestone.event_id != event_id {
                    return Ok(Err(WorkflowError::MilestoneNotFound { id: milestone_id }));
                }

                db.complete_milestone(milestone_id, now)?;
                recalculate(db, event_id, now)?;

                let updated = db
                    .get_milestone(milestone_id)?
                    .ok_or_else(|| anyhow::anyhow!("Milestone missing after update"))?;
                Ok(Ok(updated))
            })
            .await??;

        info!(event_id, milestone_id, title = %milestone.title, "milestone completed");
        Ok(milestone)
    }

    pub async fn list_milestones(&self, event_id: i64) -> ServiceResult<Vec<Milestone>> {
        Ok(self
            .db
            .call(move |db| db.list_milestones(event_id))
            .await?)
    }

    pub async fn list_stages(&self, event_id: i64) -> ServiceResult<Vec<Stage>> {
        Ok(self.db.call(move |db| db.list_stages(event_id)).await?)
    }

    pub async fn list_subtasks(&self, stage_id: i64) -> ServiceResult<Vec<Subtask>> {
        Ok(self
            .db
            .call(move |db| db.list_subtasks_for_stage(stage_id))
            .await?)
    }

    // ── Summary and analysis ──────────────────────────────────────────

    /// Full summary: the recomputed progress report plus each stage's
    /// subtasks grouped by category and the milestone list.
    pub async fn get_workflow_summary(&self, event_id: i64) -> ServiceResult<WorkflowSummary> {
        let now = (self.clock)();

        let summary = self
            .db
            .call(move |db| {
                let Some(report) = recalculate(db, event_id, now)? else {
                    return Ok(Err(WorkflowError::EventNotFound { id: event_id }));
                };

                let stages = db.list_stages(event_id)?;
                let milestones = db.list_milestones(event_id)?;

                let mut details = Vec::with_capacity(stages.len());
                for stage in &stages {
                    let subtasks = db.list_subtasks_for_stage(stage.id)?;

                    // Group by category, preserving first-seen order
                    let mut categories: Vec<CategoryGroup> = Vec::new();
                    for subtask in &subtasks {
                        let brief = SubtaskBrief {
                            id: subtask.id,
                            title: subtask.title.clone(),
                            status: subtask.status,
                            priority: subtask.priority,
                            due_date: subtask.due_date,
                            assignee_id: subtask.assignee_id,
                        };
                        match categories
                            .iter_mut()
                            .find(|g| g.category == subtask.category)
                        {
                            Some(group) => group.tasks.push(brief),
                            None => categories.push(CategoryGroup {
                                category: subtask.category.clone(),
                                tasks: vec![brief],
                            }),
                        }
                    }

                    let config = phase_config(stage.phase);
                    details.push(StageDetail {
                        id: stage.id,
                        phase: stage.phase,
                        name: config.name,
                        icon: config.icon,
                        color: config.color,
                        status: stage.status,
                        progress: report
                            .phases
                            .iter()
                            .find(|p| p.stage_id == stage.id)
                            .map_or(stage.progress, |p| p.progress),
                        categories,
                    });
                }

                Ok(Ok(WorkflowSummary {
                    progress: report,
                    stages: details,
                    milestones,
                }))
            })
            .await??;

        Ok(summary)
    }

    /// Run the insight analyzer over the event's current tasks.
    pub async fn analyze(&self, event_id: i64) -> ServiceResult<WorkflowAnalysis> {
        let now = (self.clock)();

        let (tasks, event_date, current_phase) = self
            .db
            .call(move |db| {
                let Some(event) = db.get_event(event_id)? else {
                    return Ok(Err(WorkflowError::EventNotFound { id: event_id }));
                };
                let stages = db.list_stages(event_id)?;
                let subtasks = db.list_subtasks_for_event(event_id)?;

                let tasks: Vec<AnalyzerTask> = subtasks
                    .iter()
                    .filter_map(|s| {
                        stages
                            .iter()
                            .find(|st| st.id == s.stage_id)
                            .map(|st| AnalyzerTask::from_subtask(s, st.phase))
                    })
                    .collect();

                let current_phase = db
                    .get_progress(event_id)?
                    .map_or(Phase::Ideation, |p| p.current_phase);

                Ok(Ok((tasks, event.scheduled_date, current_phase)))
            })
            .await??;

        Ok(analyze_workflow(
            &tasks,
            Some(event_date),
            current_phase,
            now,
        ))
    }
}

/// Recompute the event's aggregation and persist the stage counts and the
/// progress row. Returns `None` when the event does not exist. Must be
/// called with the store lock held (i.e. from inside a `DbHandle::call`
/// closure).
fn recalculate(
    db: &WorkflowDb,
    event_id: i64,
    now: DateTime<Utc>,
) -> anyhow::Result<Option<ProgressReport>> {
    let Some(event) = db.get_event(event_id)? else {
        return Ok(None);
    };
    let stages = db.list_stages(event_id)?;
    let subtasks = db.list_subtasks_for_event(event_id)?;
    let milestones = db.list_milestones(event_id)?;

    let report = aggregate(&event, &stages, &subtasks, &milestones, now);

    for snapshot in &report.phases {
        db.update_stage_counts(
            snapshot.stage_id,
            snapshot.total_tasks,
            snapshot.completed_tasks,
            snapshot.progress,
        )?;
    }

    let row = db.get_progress(event_id)?;
    if row.is_none() && !stages.is_empty() {
        warn!(event_id, "stages exist but no progress row; skipping snapshot write");
    }
    if let Some(mut row) = row {
        row.current_phase = report.current_phase;
        row.completion_percentage = report.overall_progress;
        row.is_on_track = report.timeline.is_on_track;
        row.total_tasks = report.tasks.total;
        row.completed_tasks = report.tasks.done;
        row.overdue_tasks = report.overdue_tasks;
        row.blocked_tasks = report.tasks.blocked;
        row.days_until_event = report.timeline.days_until_event;
        row.days_into_planning = report.timeline.days_into_planning;
        row.total_milestones = report.milestones.total;
        row.completed_milestones = report.milestones.completed;
        row.upcoming_milestone = report.milestones.upcoming;
        row.suggestions = report.suggestions.clone();
        row.warnings = report.warnings.clone();
        row.last_updated = now;
        db.update_progress(&row)?;
    }

    debug!(
        event_id,
        overall = report.overall_progress,
        phase = %report.current_phase,
        "progress recalculated"
    );
    Ok(Some(report))
}
