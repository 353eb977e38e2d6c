//! Core data model for the event planning workflow.
//!
//! Enumerations are stored as snake_case strings in the database and in
//! JSON; the `as_str`/`FromStr` pairs below are the single source of truth
//! for that mapping.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The six fixed planning phases, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Ideation,
    Logistics,
    Marketing,
    Preparation,
    Execution,
    Review,
}

impl Phase {
    /// All phases in canonical planning order. Current-phase selection and
    /// lagging-phase checks depend on this ordering, not on progress values.
    pub const ALL: [Phase; 6] = [
        Phase::Ideation,
        Phase::Logistics,
        Phase::Marketing,
        Phase::Preparation,
        Phase::Execution,
        Phase::Review,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ideation => "ideation",
            Self::Logistics => "logistics",
            Self::Marketing => "marketing",
            Self::Preparation => "preparation",
            Self::Execution => "execution",
            Self::Review => "review",
        }
    }

    /// Zero-based position in canonical order.
    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|p| p == self).unwrap_or(0)
    }

    /// Display form with a leading capital ("ideation" -> "Ideation").
    pub fn title(&self) -> String {
        let s = self.as_str();
        let mut chars = s.chars();
        match chars.next() {
            Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ideation" => Ok(Self::Ideation),
            "logistics" => Ok(Self::Logistics),
            "marketing" => Ok(Self::Marketing),
            "preparation" => Ok(Self::Preparation),
            "execution" => Ok(Self::Execution),
            "review" => Ok(Self::Review),
            _ => Err(format!("Invalid phase: {}", s)),
        }
    }
}

/// Lifecycle status of a per-event stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    InProgress,
    Completed,
    Blocked,
}

impl StageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Blocked => "blocked",
        }
    }
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            "blocked" => Ok(Self::Blocked),
            _ => Err(format!("Invalid stage status: {}", s)),
        }
    }
}

/// Status of an individual subtask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Review,
    Done,
    Blocked,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Review => "review",
            Self::Done => "done",
            Self::Blocked => "blocked",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(Self::Todo),
            "in_progress" => Ok(Self::InProgress),
            "review" => Ok(Self::Review),
            "done" => Ok(Self::Done),
            "blocked" => Ok(Self::Blocked),
            _ => Err(format!("Invalid task status: {}", s)),
        }
    }
}

/// Task priority levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(format!("Invalid priority: {}", s)),
        }
    }
}

/// Kind of dated checkpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneType {
    Deadline,
    Deliverable,
    DecisionPoint,
    Event,
}

impl MilestoneType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deadline => "deadline",
            Self::Deliverable => "deliverable",
            Self::DecisionPoint => "decision_point",
            Self::Event => "event",
        }
    }
}

impl std::fmt::Display for MilestoneType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MilestoneType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deadline" => Ok(Self::Deadline),
            "deliverable" => Ok(Self::Deliverable),
            "decision_point" => Ok(Self::DecisionPoint),
            "event" => Ok(Self::Event),
            _ => Err(format!("Invalid milestone type: {}", s)),
        }
    }
}

/// The event record this engine plans for. Owned by the surrounding
/// application; consumed here only as a source of dates and display text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: i64,
    pub title: String,
    pub topic: String,
    pub description: String,
    pub scheduled_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Per-event instantiation of a phase. One stage per phase per event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    pub id: i64,
    pub event_id: i64,
    pub phase: Phase,
    pub status: StageStatus,
    /// 0-100 percentage, derived from subtask counts unless the stage is
    /// explicitly completed (which forces 100).
    pub progress: f64,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub order: i64,
}

/// The atomic unit of planning work, owned by a stage.
///
/// Writers must keep `is_blocked` and `status == Blocked` consistent; the
/// engine treats them as synonymous.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subtask {
    pub id: i64,
    pub stage_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub status: TaskStatus,
    pub priority: Priority,
    /// Soft link to another subtask. Never traversed or enforced.
    pub depends_on: Option<i64>,
    pub is_blocked: bool,
    pub assignee_id: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    pub actual_hours: Option<f64>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<i64>,
    pub order: i64,
    pub notes: Option<String>,
}

/// A dated checkpoint independent of the stage/subtask tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub id: i64,
    pub event_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub milestone_type: MilestoneType,
    pub due_date: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub is_completed: bool,
    pub is_critical: bool,
    pub impact_description: Option<String>,
    pub order: i64,
}

/// Denormalized one-row-per-event summary of workflow state. A cache of the
/// aggregator's last computation, never the source of truth for task state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowProgress {
    pub id: i64,
    pub event_id: i64,
    pub current_phase: Phase,
    pub completion_percentage: f64,
    pub is_on_track: bool,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub overdue_tasks: i64,
    pub blocked_tasks: i64,
    pub days_until_event: i64,
    pub days_into_planning: i64,
    pub total_milestones: i64,
    pub completed_milestones: i64,
    pub upcoming_milestone: Option<DateTime<Utc>>,
    pub suggestions: Vec<String>,
    pub warnings: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_roundtrip() {
        for s in &[
            "ideation",
            "logistics",
            "marketing",
            "preparation",
            "execution",
            "review",
        ] {
            let parsed: Phase = s.parse().unwrap();
            assert_eq!(parsed.as_str(), *s);
        }
        assert!("invalid".parse::<Phase>().is_err());
    }

    #[test]
    fn test_phase_canonical_order() {
        assert_eq!(Phase::Ideation.index(), 0);
        assert_eq!(Phase::Logistics.index(), 1);
        assert_eq!(Phase::Marketing.index(), 2);
        assert_eq!(Phase::Preparation.index(), 3);
        assert_eq!(Phase::Execution.index(), 4);
        assert_eq!(Phase::Review.index(), 5);
    }

    #[test]
    fn test_phase_title() {
        assert_eq!(Phase::Ideation.title(), "Ideation");
        assert_eq!(Phase::Marketing.title(), "Marketing");
    }

    #[test]
    fn test_stage_status_roundtrip() {
        for s in &["pending", "in_progress", "completed", "blocked"] {
            let parsed: StageStatus = s.parse().unwrap();
            assert_eq!(parsed.as_str(), *s);
        }
        assert!("invalid".parse::<StageStatus>().is_err());
    }

    #[test]
    fn test_task_status_roundtrip() {
        for s in &["todo", "in_progress", "review", "done", "blocked"] {
            let parsed: TaskStatus = s.parse().unwrap();
            assert_eq!(parsed.as_str(), *s);
        }
        assert!("invalid".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn test_priority_roundtrip() {
        for s in &["low", "medium", "high", "critical"] {
            let parsed: Priority = s.parse().unwrap();
            assert_eq!(parsed.as_str(), *s);
        }
        assert!("invalid".parse::<Priority>().is_err());
    }

    #[test]
    fn test_milestone_type_roundtrip() {
        for s in &["deadline", "deliverable", "decision_point", "event"] {
            let parsed: MilestoneType = s.parse().unwrap();
            assert_eq!(parsed.as_str(), *s);
        }
        assert!("invalid".parse::<MilestoneType>().is_err());
    }

    #[test]
    fn test_serde_produces_lowercase_strings() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(
            serde_json::to_string(&Phase::Preparation).unwrap(),
            "\"preparation\""
        );
        assert_eq!(
            serde_json::to_string(&MilestoneType::DecisionPoint).unwrap(),
            "\"decision_point\""
        );
        assert_eq!(
            serde_json::from_str::<Priority>("\"critical\"").unwrap(),
            Priority::Critical
        );
    }
}
