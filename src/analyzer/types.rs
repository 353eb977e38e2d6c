//! Output types for the insight analyzer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{Phase, Priority, Subtask, TaskStatus};

/// What kind of insight this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Warning,
    Suggestion,
    Tip,
    Prediction,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Suggestion => "suggestion",
            Self::Tip => "tip",
            Self::Prediction => "prediction",
        }
    }
}

/// Which planning concern an insight belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    Priority,
    Timeline,
    Resources,
    Dependencies,
    Quality,
}

impl InsightCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Priority => "priority",
            Self::Timeline => "timeline",
            Self::Resources => "resources",
            Self::Dependencies => "dependencies",
            Self::Quality => "quality",
        }
    }
}

/// Severity of the condition an insight describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Impact {
    Low,
    Medium,
    High,
    Critical,
}

impl Impact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Risk bucket for the timeline prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// One actionable finding produced by a sub-analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub category: InsightCategory,
    pub title: String,
    pub description: String,
    /// Fixed per-rule confidence in [0, 1].
    pub confidence: f64,
    pub actionable: bool,
    pub related_task_ids: Vec<i64>,
    pub recommendation: String,
    pub impact: Impact,
}

/// Flattened view of a subtask as the analyzer consumes it. Joins the
/// owning stage's phase onto the task row and surfaces the blocking reason
/// recorded in the task notes.
#[derive(Debug, Clone)]
pub struct AnalyzerTask {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub phase: Phase,
    pub status: TaskStatus,
    pub priority: Priority,
    pub is_blocked: bool,
    pub blocking_reason: Option<String>,
    pub assignee_id: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
}

impl AnalyzerTask {
    /// Project a stored subtask into analyzer form. The blocking reason is
    /// the task's notes, but only while the task is blocked.
    pub fn from_subtask(subtask: &Subtask, phase: Phase) -> Self {
        Self {
            id: subtask.id,
            title: subtask.title.clone(),
            description: subtask.description.clone(),
            category: subtask.category.clone(),
            phase,
            status: subtask.status,
            priority: subtask.priority,
            is_blocked: subtask.is_blocked,
            blocking_reason: if subtask.is_blocked {
                subtask.notes.clone()
            } else {
                None
            },
            assignee_id: subtask.assignee_id,
            due_date: subtask.due_date,
            estimated_hours: subtask.estimated_hours,
        }
    }

    /// Todo or in-progress, and not blocked.
    pub fn is_incomplete(&self) -> bool {
        matches!(self.status, TaskStatus::Todo | TaskStatus::InProgress) && !self.is_blocked
    }
}

/// A proposed priority change for one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityRecommendation {
    pub task_id: i64,
    pub task_title: String,
    pub current_priority: Priority,
    pub suggested_priority: Priority,
    pub reason: String,
    pub factors: Vec<String>,
    pub score: f64,
}

/// Projected completion and associated risk for the remaining work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelinePrediction {
    pub predicted_completion: DateTime<Utc>,
    pub risk_level: RiskLevel,
    pub factors: Vec<String>,
    pub recommendations: Vec<String>,
    pub confidence: f64,
}

/// Full analyzer output for one event's workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowAnalysis {
    pub insights: Vec<Insight>,
    pub priority_recommendations: Vec<PriorityRecommendation>,
    /// 0-100, higher is healthier.
    pub health_score: f64,
    pub timeline_prediction: Option<TimelinePrediction>,
    pub summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_subtask() -> Subtask {
        Subtask {
            id: 1,
            stage_id: 10,
            title: "Book venue".to_string(),
            description: None,
            category: "venue".to_string(),
            status: TaskStatus::Blocked,
            priority: Priority::Critical,
            depends_on: None,
            is_blocked: true,
            assignee_id: Some(5),
            due_date: None,
            estimated_hours: Some(4.0),
            actual_hours: None,
            completed_at: None,
            completed_by: None,
            order: 1,
            notes: Some("Waiting on budget approval".to_string()),
        }
    }

    #[test]
    fn test_blocked_task_surfaces_notes_as_reason() {
        let task = AnalyzerTask::from_subtask(&sample_subtask(), Phase::Logistics);
        assert_eq!(
            task.blocking_reason.as_deref(),
            Some("Waiting on budget approval")
        );
        assert!(!task.is_incomplete());
    }

    #[test]
    fn test_unblocked_task_has_no_reason() {
        let mut subtask = sample_subtask();
        subtask.is_blocked = false;
        subtask.status = TaskStatus::Todo;
        let task = AnalyzerTask::from_subtask(&subtask, Phase::Logistics);
        assert!(task.blocking_reason.is_none());
        assert!(task.is_incomplete());
    }

    #[test]
    fn test_done_task_is_not_incomplete() {
        let mut subtask = sample_subtask();
        subtask.is_blocked = false;
        subtask.status = TaskStatus::Done;
        let task = AnalyzerTask::from_subtask(&subtask, Phase::Preparation);
        assert!(!task.is_incomplete());
    }

    #[test]
    fn test_impact_ordering() {
        assert!(Impact::Critical > Impact::High);
        assert!(Impact::High > Impact::Medium);
        assert!(Impact::Medium > Impact::Low);
    }

    #[test]
    fn test_enum_serde_strings() {
        assert_eq!(
            serde_json::to_string(&InsightKind::Suggestion).unwrap(),
            "\"suggestion\""
        );
        assert_eq!(
            serde_json::to_string(&InsightCategory::Dependencies).unwrap(),
            "\"dependencies\""
        );
        assert_eq!(serde_json::to_string(&Impact::Critical).unwrap(), "\"critical\"");
        assert_eq!(serde_json::to_string(&RiskLevel::Medium).unwrap(), "\"medium\"");
    }
}
