//! SQLite persistence for events, stages, subtasks, milestones, and the
//! denormalized progress row.
//!
//! All access goes through `DbHandle`, which wraps `WorkflowDb` behind
//! `Arc<Mutex>` and runs closures on tokio's blocking thread pool. A
//! mutation and its follow-up recalculation share one lock acquisition, so
//! progress snapshots cannot interleave.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::model::{
    EventRecord, Milestone, MilestoneType, Phase, Priority, Stage, StageStatus, Subtask,
    TaskStatus, WorkflowProgress,
};
use crate::templates::MilestoneSeed;

/// Fields for a subtask insert; ids and completion fields are assigned by
/// the store.
#[derive(Debug, Clone)]
pub struct SubtaskSeed {
    pub stage_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub status: TaskStatus,
    pub priority: Priority,
    pub depends_on: Option<i64>,
    pub assignee_id: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    pub order: i64,
    pub notes: Option<String>,
}

/// Async-safe handle to the workflow database.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<WorkflowDb>>,
}

impl DbHandle {
    pub fn new(db: WorkflowDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&WorkflowDb) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db
                .lock()
                .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
            f(&guard)
        })
        .await
        .context("DB task panicked")?
    }
}

pub struct WorkflowDb {
    conn: Connection,
}

impl WorkflowDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        self.run_migrations().context("Failed to run migrations")?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS events (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    title TEXT NOT NULL,
                    topic TEXT NOT NULL DEFAULT '',
                    description TEXT NOT NULL DEFAULT '',
                    scheduled_date TEXT NOT NULL,
                    created_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS stages (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    event_id INTEGER NOT NULL REFERENCES events(id) ON DELETE CASCADE,
                    phase TEXT NOT NULL,
                    status TEXT NOT NULL DEFAULT 'pending',
                    progress REAL NOT NULL DEFAULT 0,
                    total_tasks INTEGER NOT NULL DEFAULT 0,
                    completed_tasks INTEGER NOT NULL DEFAULT 0,
                    started_at TEXT,
                    completed_at TEXT,
                    due_date TEXT,
                    position INTEGER NOT NULL DEFAULT 0,
                    UNIQUE(event_id, phase)
                );

                CREATE TABLE IF NOT EXISTS subtasks (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    stage_id INTEGER NOT NULL REFERENCES stages(id) ON DELETE CASCADE,
                    title TEXT NOT NULL,
                    description TEXT,
                    category TEXT NOT NULL DEFAULT 'general',
                    status TEXT NOT NULL DEFAULT 'todo',
                    priority TEXT NOT NULL DEFAULT 'medium',
                    depends_on INTEGER,
                    is_blocked INTEGER NOT NULL DEFAULT 0,
                    assignee_id INTEGER,
                    due_date TEXT,
                    estimated_hours REAL,
                    actual_hours REAL,
                    completed_at TEXT,
                    completed_by INTEGER,
                    position INTEGER NOT NULL DEFAULT 0,
                    notes TEXT
                );

                CREATE TABLE IF NOT EXISTS milestones (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    event_id INTEGER NOT NULL REFERENCES events(id) ON DELETE CASCADE,
                    title TEXT NOT NULL,
                    description TEXT,
                    milestone_type TEXT NOT NULL DEFAULT 'deadline',
                    due_date TEXT NOT NULL,
                    completed_at TEXT,
                    is_completed INTEGER NOT NULL DEFAULT 0,
                    is_critical INTEGER NOT NULL DEFAULT 0,
                    impact_description TEXT,
                    position INTEGER NOT NULL DEFAULT 0
                );

                CREATE TABLE IF NOT EXISTS workflow_progress (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    event_id INTEGER NOT NULL UNIQUE REFERENCES events(id) ON DELETE CASCADE,
                    current_phase TEXT NOT NULL DEFAULT 'ideation',
                    completion_percentage REAL NOT NULL DEFAULT 0,
                    is_on_track INTEGER NOT NULL DEFAULT 1,
                    total_tasks INTEGER NOT NULL DEFAULT 0,
                    completed_tasks INTEGER NOT NULL DEFAULT 0,
                    overdue_tasks INTEGER NOT NULL DEFAULT 0,
                    blocked_tasks INTEGER NOT NULL DEFAULT 0,
                    days_until_event INTEGER NOT NULL DEFAULT 0,
                    days_into_planning INTEGER NOT NULL DEFAULT 0,
                    total_milestones INTEGER NOT NULL DEFAULT 0,
                    completed_milestones INTEGER NOT NULL DEFAULT 0,
                    upcoming_milestone TEXT,
                    suggestions TEXT NOT NULL DEFAULT '[]',
                    warnings TEXT NOT NULL DEFAULT '[]',
                    last_updated TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_stages_event ON stages(event_id);
                CREATE INDEX IF NOT EXISTS idx_subtasks_stage ON subtasks(stage_id);
                CREATE INDEX IF NOT EXISTS idx_milestones_event ON milestones(event_id);
                ",
            )
            .context("Failed to create tables")?;
        Ok(())
    }

    // ── Events ────────────────────────────────────────────────────────

    pub fn create_event(
        &self,
        title: &str,
        topic: &str,
        description: &str,
        scheduled_date: DateTime<Utc>,
        created_at: DateTime<Utc>,
    ) -> Result<EventRecord> {
        self.conn
            .execute(
                "INSERT INTO events (title, topic, description, scheduled_date, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![title, topic, description, scheduled_date, created_at],
            )
            .context("Failed to insert event")?;
        let id = self.conn.last_insert_rowid();
        self.get_event(id)?.context("Event not found after insert")
    }

    pub fn get_event(&self, id: i64) -> Result<Option<EventRecord>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, title, topic, description, scheduled_date, created_at
                 FROM events WHERE id = ?1",
            )
            .context("Failed to prepare get_event")?;
        let mut rows = stmt
            .query_map(params![id], |row| {
                Ok(EventRecord {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    topic: row.get(2)?,
                    description: row.get(3)?,
                    scheduled_date: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })
            .context("Failed to query event")?;
        rows.next().transpose().context("Failed to read event row")
    }

    // ── Stages ────────────────────────────────────────────────────────

    pub fn insert_stage(
        &self,
        event_id: i64,
        phase: Phase,
        due_date: Option<DateTime<Utc>>,
        order: i64,
    ) -> Result<Stage> {
        self.conn
            .execute(
                "INSERT INTO stages (event_id, phase, status, due_date, position)
                 VALUES (?1, ?2, 'pending', ?3, ?4)",
                params![event_id, phase.as_str(), due_date, order],
            )
            .context("Failed to insert stage")?;
        let id = self.conn.last_insert_rowid();
        self.get_stage(id)?.context("Stage not found after insert")
    }

    pub fn get_stage(&self, id: i64) -> Result<Option<Stage>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM stages WHERE id = ?1",
                STAGE_COLUMNS
            ))
            .context("Failed to prepare get_stage")?;
        let mut rows = stmt
            .query_map(params![id], row_to_stage)
            .context("Failed to query stage")?;
        rows.next().transpose().context("Failed to read stage row")
    }

    pub fn list_stages(&self, event_id: i64) -> Result<Vec<Stage>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM stages WHERE event_id = ?1 ORDER BY position",
                STAGE_COLUMNS
            ))
            .context("Failed to prepare list_stages")?;
        let rows = stmt
            .query_map(params![event_id], row_to_stage)
            .context("Failed to query stages")?;
        collect_rows(rows, "stage")
    }

    pub fn update_stage_state(
        &self,
        id: i64,
        status: StageStatus,
        started_at: Option<DateTime<Utc>>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        self.conn
            .execute(
                "UPDATE stages SET status = ?2,
                    started_at = COALESCE(?3, started_at),
                    completed_at = ?4
                 WHERE id = ?1",
                params![id, status.as_str(), started_at, completed_at],
            )
            .context("Failed to update stage state")?;
        Ok(())
    }

    /// Persist the aggregator's recomputed counts for a stage.
    pub fn update_stage_counts(
        &self,
        id: i64,
        total_tasks: i64,
        completed_tasks: i64,
        progress: f64,
    ) -> Result<()> {
        self.conn
            .execute(
                "UPDATE stages SET total_tasks = ?2, completed_tasks = ?3, progress = ?4
                 WHERE id = ?1",
                params![id, total_tasks, completed_tasks, progress],
            )
            .context("Failed to update stage counts")?;
        Ok(())
    }

    // ── Subtasks ──────────────────────────────────────────────────────

    pub fn insert_subtask(&self, seed: &SubtaskSeed) -> Result<Subtask> {
        self.conn
            .execute(
                "INSERT INTO subtasks (stage_id, title, description, category, status,
                    priority, depends_on, is_blocked, assignee_id, due_date,
                    estimated_hours, position, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?9, ?10, ?11, ?12)",
                params![
                    seed.stage_id,
                    seed.title,
                    seed.description,
                    seed.category,
                    seed.status.as_str(),
                    seed.priority.as_str(),
                    seed.depends_on,
                    seed.assignee_id,
                    seed.due_date,
                    seed.estimated_hours,
                    seed.order,
                    seed.notes,
                ],
            )
            .context("Failed to insert subtask")?;
        let id = self.conn.last_insert_rowid();
        self.get_subtask(id)?
            .context("Subtask not found after insert")
    }

    pub fn get_subtask(&self, id: i64) -> Result<Option<Subtask>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM subtasks WHERE id = ?1",
                SUBTASK_COLUMNS
            ))
            .context("Failed to prepare get_subtask")?;
        let mut rows = stmt
            .query_map(params![id], row_to_subtask)
            .context("Failed to query subtask")?;
        rows.next()
            .transpose()
            .context("Failed to read subtask row")
    }

    pub fn list_subtasks_for_stage(&self, stage_id: i64) -> Result<Vec<Subtask>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM subtasks WHERE stage_id = ?1 ORDER BY position",
                SUBTASK_COLUMNS
            ))
            .context("Failed to prepare list_subtasks_for_stage")?;
        let rows = stmt
            .query_map(params![stage_id], row_to_subtask)
            .context("Failed to query subtasks")?;
        collect_rows(rows, "subtask")
    }

    /// All subtasks for an event, ordered by stage position then task
    /// position.
    pub fn list_subtasks_for_event(&self, event_id: i64) -> Result<Vec<Subtask>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM subtasks s
                 JOIN stages st ON st.id = s.stage_id
                 WHERE st.event_id = ?1
                 ORDER BY st.position, s.position",
                SUBTASK_COLUMNS_QUALIFIED
            ))
            .context("Failed to prepare list_subtasks_for_event")?;
        let rows = stmt
            .query_map(params![event_id], row_to_subtask)
            .context("Failed to query event subtasks")?;
        collect_rows(rows, "subtask")
    }

    pub fn update_subtask_status(
        &self,
        id: i64,
        status: TaskStatus,
        is_blocked: bool,
        completed_at: Option<DateTime<Utc>>,
        completed_by: Option<i64>,
    ) -> Result<()> {
        self.conn
            .execute(
                "UPDATE subtasks SET status = ?2, is_blocked = ?3,
                    completed_at = ?4, completed_by = ?5
                 WHERE id = ?1",
                params![id, status.as_str(), is_blocked, completed_at, completed_by],
            )
            .context("Failed to update subtask status")?;
        Ok(())
    }

    /// Block or unblock a subtask. The reason lives in the notes column
    /// while the task is blocked.
    pub fn set_subtask_block(
        &self,
        id: i64,
        status: TaskStatus,
        is_blocked: bool,
        notes: Option<&str>,
    ) -> Result<()> {
        self.conn
            .execute(
                "UPDATE subtasks SET status = ?2, is_blocked = ?3, notes = ?4 WHERE id = ?1",
                params![id, status.as_str(), is_blocked, notes],
            )
            .context("Failed to update subtask block state")?;
        Ok(())
    }

    // ── Milestones ────────────────────────────────────────────────────

    pub fn insert_milestone(&self, event_id: i64, seed: &MilestoneSeed) -> Result<Milestone> {
        self.conn
            .execute(
                "INSERT INTO milestones (event_id, title, description, milestone_type,
                    due_date, is_completed, is_critical, impact_description, position)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    event_id,
                    seed.title,
                    seed.description,
                    seed.milestone_type.as_str(),
                    seed.due_date,
                    seed.is_completed,
                    seed.is_critical,
                    seed.impact_description,
                    seed.order,
                ],
            )
            .context("Failed to insert milestone")?;
        let id = self.conn.last_insert_rowid();
        self.get_milestone(id)?
            .context("Milestone not found after insert")
    }

    pub fn get_milestone(&self, id: i64) -> Result<Option<Milestone>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM milestones WHERE id = ?1",
                MILESTONE_COLUMNS
            ))
            .context("Failed to prepare get_milestone")?;
        let mut rows = stmt
            .query_map(params![id], row_to_milestone)
            .context("Failed to query milestone")?;
        rows.next()
            .transpose()
            .context("Failed to read milestone row")
    }

    pub fn list_milestones(&self, event_id: i64) -> Result<Vec<Milestone>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {} FROM milestones WHERE event_id = ?1 ORDER BY due_date",
                MILESTONE_COLUMNS
            ))
            .context("Failed to prepare list_milestones")?;
        let rows = stmt
            .query_map(params![event_id], row_to_milestone)
            .context("Failed to query milestones")?;
        collect_rows(rows, "milestone")
    }

    pub fn complete_milestone(&self, id: i64, completed_at: DateTime<Utc>) -> Result<()> {
        self.conn
            .execute(
                "UPDATE milestones SET is_completed = 1, completed_at = ?2 WHERE id = ?1",
                params![id, completed_at],
            )
            .context("Failed to complete milestone")?;
        Ok(())
    }

    // ── Progress row ──────────────────────────────────────────────────

    pub fn insert_progress(
        &self,
        event_id: i64,
        now: DateTime<Utc>,
    ) -> Result<WorkflowProgress> {
        self.conn
            .execute(
                "INSERT INTO workflow_progress (event_id, last_updated) VALUES (?1, ?2)",
                params![event_id, now],
            )
            .context("Failed to insert progress row")?;
        self.get_progress(event_id)?
            .context("Progress row not found after insert")
    }

    pub fn get_progress(&self, event_id: i64) -> Result<Option<WorkflowProgress>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, event_id, current_phase, completion_percentage, is_on_track,
                    total_tasks, completed_tasks, overdue_tasks, blocked_tasks,
                    days_until_event, days_into_planning, total_milestones,
                    completed_milestones, upcoming_milestone, suggestions, warnings,
                    last_updated
                 FROM workflow_progress WHERE event_id = ?1",
            )
            .context("Failed to prepare get_progress")?;
        let mut rows = stmt
            .query_map(params![event_id], row_to_progress)
            .context("Failed to query progress")?;
        rows.next()
            .transpose()
            .context("Failed to read progress row")
    }

    pub fn update_progress(&self, progress: &WorkflowProgress) -> Result<()> {
        let suggestions = serde_json::to_string(&progress.suggestions)
            .context("Failed to encode suggestions")?;
        let warnings =
            serde_json::to_string(&progress.warnings).context("Failed to encode warnings")?;
        self.conn
            .execute(
                "UPDATE workflow_progress SET
                    current_phase = ?2, completion_percentage = ?3, is_on_track = ?4,
                    total_tasks = ?5, completed_tasks = ?6, overdue_tasks = ?7,
                    blocked_tasks = ?8, days_until_event = ?9, days_into_planning = ?10,
                    total_milestones = ?11, completed_milestones = ?12,
                    upcoming_milestone = ?13, suggestions = ?14, warnings = ?15,
                    last_updated = ?16
                 WHERE event_id = ?1",
                params![
                    progress.event_id,
                    progress.current_phase.as_str(),
                    progress.completion_percentage,
                    progress.is_on_track,
                    progress.total_tasks,
                    progress.completed_tasks,
                    progress.overdue_tasks,
                    progress.blocked_tasks,
                    progress.days_until_event,
                    progress.days_into_planning,
                    progress.total_milestones,
                    progress.completed_milestones,
                    progress.upcoming_milestone,
                    suggestions,
                    warnings,
                    progress.last_updated,
                ],
            )
            .context("Failed to update progress row")?;
        Ok(())
    }
}

const STAGE_COLUMNS: &str = "id, event_id, phase, status, progress, total_tasks, \
    completed_tasks, started_at, completed_at, due_date, position";

const SUBTASK_COLUMNS: &str = "id, stage_id, title, description, category, status, \
    priority, depends_on, is_blocked, assignee_id, due_date, estimated_hours, \
    actual_hours, completed_at, completed_by, position, notes";

const SUBTASK_COLUMNS_QUALIFIED: &str = "s.id, s.stage_id, s.title, s.description, \
    s.category, s.status, s.priority, s.depends_on, s.is_blocked, s.assignee_id, \
    s.due_date, s.estimated_hours, s.actual_hours, s.completed_at, s.completed_by, \
    s.position, s.notes";

const MILESTONE_COLUMNS: &str = "id, event_id, title, description, milestone_type, \
    due_date, completed_at, is_completed, is_critical, impact_description, position";

/// Parse a stored enum string inside a row mapper, converting failures into
/// rusqlite's conversion error so they surface through the query.
fn parse_enum<T>(idx: usize, value: String) -> rusqlite::Result<T>
where
    T: FromStr<Err = String>,
{
    value.parse().map_err(|e: String| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}

fn row_to_stage(row: &Row<'_>) -> rusqlite::Result<Stage> {
    Ok(Stage {
        id: row.get(0)?,
        event_id: row.get(1)?,
        phase: parse_enum(2, row.get::<_, String>(2)?)?,
        status: parse_enum(3, row.get::<_, String>(3)?)?,
        progress: row.get(4)?,
        total_tasks: row.get(5)?,
        completed_tasks: row.get(6)?,
        started_at: row.get(7)?,
        completed_at: row.get(8)?,
        due_date: row.get(9)?,
        order: row.get(10)?,
    })
}

fn row_to_subtask(row: &Row<'_>) -> rusqlite::Result<Subtask> {
    Ok(Subtask {
        id: row.get(0)?,
        stage_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        category: row.get(4)?,
        status: parse_enum(5, row.get::<_, String>(5)?)?,
        priority: parse_enum(6, row.get::<_, String>(6)?)?,
        depends_on: row.get(7)?,
        is_blocked: row.get(8)?,
        assignee_id: row.get(9)?,
        due_date: row.get(10)?,
        estimated_hours: row.get(11)?,
        actual_hours: row.get(12)?,
        completed_at: row.get(13)?,
        completed_by: row.get(14)?,
        order: row.get(15)?,
        notes: row.get(16)?,
    })
}

fn row_to_milestone(row: &Row<'_>) -> rusqlite::Result<Milestone> {
    Ok(Milestone {
        id: row.get(0)?,
        event_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        milestone_type: parse_enum(4, row.get::<_, String>(4)?)?,
        due_date: row.get(5)?,
        completed_at: row.get(6)?,
        is_completed: row.get(7)?,
        is_critical: row.get(8)?,
        impact_description: row.get(9)?,
        order: row.get(10)?,
    })
}

fn row_to_progress(row: &Row<'_>) -> rusqlite::Result<WorkflowProgress> {
    let suggestions: String = row.get(14)?;
    let warnings: String = row.get(15)?;
    let decode = |idx: usize, raw: &str| -> rusqlite::Result<Vec<String>> {
        serde_json::from_str(raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
    };
    Ok(WorkflowProgress {
        id: row.get(0)?,
        event_id: row.get(1)?,
        current_phase: parse_enum(2, row.get::<_, String>(2)?)?,
        completion_percentage: row.get(3)?,
        is_on_track: row.get(4)?,
        total_tasks: row.get(5)?,
        completed_tasks: row.get(6)?,
        overdue_tasks: row.get(7)?,
        blocked_tasks: row.get(8)?,
        days_until_event: row.get(9)?,
        days_into_planning: row.get(10)?,
        total_milestones: row.get(11)?,
        completed_milestones: row.get(12)?,
        upcoming_milestone: row.get(13)?,
        suggestions: decode(14, &suggestions)?,
        warnings: decode(15, &warnings)?,
        last_updated: row.get(16)?,
    })
}

fn collect_rows<T>(
    rows: impl Iterator<Item = rusqlite::Result<T>>,
    what: &str,
) -> Result<Vec<T>> {
    let mut out = Vec::new();
    for row in rows {
        out.push(row.with_context(|| format!("Failed to read {} row", what))?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    fn seed_event(db: &WorkflowDb) -> EventRecord {
        db.create_event(
            "Rust Meetup",
            "rust",
            "Monthly meetup",
            now() + Duration::days(40),
            now(),
        )
        .unwrap()
    }

    fn seed(stage_id: i64, title: &str) -> SubtaskSeed {
        SubtaskSeed {
            stage_id,
            title: title.to_string(),
            description: None,
            category: "general".to_string(),
            status: TaskStatus::Todo,
            priority: Priority::Medium,
            depends_on: None,
            assignee_id: None,
            due_date: None,
            estimated_hours: None,
            order: 1,
            notes: None,
        }
    }

    #[test]
    fn test_file_backed_db_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workflow.db");
        let event_id = {
            let db = WorkflowDb::new(&path).unwrap();
            seed_event(&db).id
        };
        let db = WorkflowDb::new(&path).unwrap();
        assert!(db.get_event(event_id).unwrap().is_some());
    }

    #[test]
    fn test_event_roundtrip() {
        let db = WorkflowDb::new_in_memory().unwrap();
        let event = seed_event(&db);
        let fetched = db.get_event(event.id).unwrap().unwrap();
        assert_eq!(fetched.title, "Rust Meetup");
        assert_eq!(fetched.scheduled_date, now() + Duration::days(40));
        assert!(db.get_event(999).unwrap().is_none());
    }

    #[test]
    fn test_stage_insert_and_list_order() {
        let db = WorkflowDb::new_in_memory().unwrap();
        let event = seed_event(&db);
        // insert out of order, list must come back by position
        db.insert_stage(event.id, Phase::Review, None, 6).unwrap();
        db.insert_stage(event.id, Phase::Ideation, None, 1).unwrap();
        let stages = db.list_stages(event.id).unwrap();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].phase, Phase::Ideation);
        assert_eq!(stages[1].phase, Phase::Review);
        assert_eq!(stages[0].status, StageStatus::Pending);
    }

    #[test]
    fn test_duplicate_stage_phase_rejected() {
        let db = WorkflowDb::new_in_memory().unwrap();
        let event = seed_event(&db);
        db.insert_stage(event.id, Phase::Ideation, None, 1).unwrap();
        assert!(db.insert_stage(event.id, Phase::Ideation, None, 1).is_err());
    }

    #[test]
    fn test_subtask_roundtrip_and_status_update() {
        let db = WorkflowDb::new_in_memory().unwrap();
        let event = seed_event(&db);
        let stage = db.insert_stage(event.id, Phase::Logistics, None, 2).unwrap();
        let task = db.insert_subtask(&seed(stage.id, "Book venue")).unwrap();
        assert_eq!(task.status, TaskStatus::Todo);
        assert!(!task.is_blocked);

        db.update_subtask_status(task.id, TaskStatus::Done, false, Some(now()), Some(7))
            .unwrap();
        let task = db.get_subtask(task.id).unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.completed_at, Some(now()));
        assert_eq!(task.completed_by, Some(7));
    }

    #[test]
    fn test_block_roundtrip_keeps_reason_in_notes() {
        let db = WorkflowDb::new_in_memory().unwrap();
        let event = seed_event(&db);
        let stage = db.insert_stage(event.id, Phase::Logistics, None, 2).unwrap();
        let task = db.insert_subtask(&seed(stage.id, "Book venue")).unwrap();

        db.set_subtask_block(task.id, TaskStatus::Blocked, true, Some("Awaiting budget"))
            .unwrap();
        let task = db.get_subtask(task.id).unwrap().unwrap();
        assert!(task.is_blocked);
        assert_eq!(task.notes.as_deref(), Some("Awaiting budget"));

        db.set_subtask_block(task.id, TaskStatus::Todo, false, None)
            .unwrap();
        let task = db.get_subtask(task.id).unwrap().unwrap();
        assert!(!task.is_blocked);
        assert!(task.notes.is_none());
    }

    #[test]
    fn test_list_subtasks_for_event_spans_stages() {
        let db = WorkflowDb::new_in_memory().unwrap();
        let event = seed_event(&db);
        let s1 = db.insert_stage(event.id, Phase::Ideation, None, 1).unwrap();
        let s2 = db.insert_stage(event.id, Phase::Logistics, None, 2).unwrap();
        db.insert_subtask(&seed(s2.id, "later")).unwrap();
        db.insert_subtask(&seed(s1.id, "earlier")).unwrap();

        let all = db.list_subtasks_for_event(event.id).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "earlier");
        assert_eq!(all[1].title, "later");
    }

    #[test]
    fn test_milestones_listed_by_due_date() {
        let db = WorkflowDb::new_in_memory().unwrap();
        let event = seed_event(&db);
        let milestones = crate::templates::generate_milestones("meetup", event.scheduled_date);
        for m in &milestones {
            db.insert_milestone(event.id, m).unwrap();
        }
        let listed = db.list_milestones(event.id).unwrap();
        assert_eq!(listed.len(), 12);
        assert!(listed.windows(2).all(|w| w[0].due_date <= w[1].due_date));

        db.complete_milestone(listed[0].id, now()).unwrap();
        let listed = db.list_milestones(event.id).unwrap();
        assert!(listed[0].is_completed);
        assert_eq!(listed[0].completed_at, Some(now()));
    }

    #[test]
    fn test_progress_row_roundtrip() {
        let db = WorkflowDb::new_in_memory().unwrap();
        let event = seed_event(&db);
        let mut progress = db.insert_progress(event.id, now()).unwrap();
        assert_eq!(progress.current_phase, Phase::Ideation);
        assert!(progress.is_on_track);
        assert!(progress.suggestions.is_empty());

        progress.completion_percentage = 42.5;
        progress.current_phase = Phase::Marketing;
        progress.suggestions = vec!["Launch campaigns".to_string()];
        progress.warnings = vec!["2 task(s) are overdue.".to_string()];
        progress.last_updated = now();
        db.update_progress(&progress).unwrap();

        let fetched = db.get_progress(event.id).unwrap().unwrap();
        assert_eq!(fetched.completion_percentage, 42.5);
        assert_eq!(fetched.current_phase, Phase::Marketing);
        assert_eq!(fetched.suggestions, vec!["Launch campaigns".to_string()]);
        assert_eq!(fetched.warnings.len(), 1);
    }

    #[test]
    fn test_progress_row_unique_per_event() {
        let db = WorkflowDb::new_in_memory().unwrap();
        let event = seed_event(&db);
        db.insert_progress(event.id, now()).unwrap();
        assert!(db.insert_progress(event.id, now()).is_err());
    }
}
