//! Typed error hierarchy for the workflow engine.
//!
//! `WorkflowError` covers the caller-facing failure modes: missing records,
//! invalid state transitions, and double initialization. Store-level
//! failures surface through the transparent `Other` variant.

use thiserror::Error;

/// Errors from workflow orchestration and persistence.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Event {id} not found")]
    EventNotFound { id: i64 },

    #[error("Stage {id} not found")]
    StageNotFound { id: i64 },

    #[error("Subtask {id} not found")]
    SubtaskNotFound { id: i64 },

    #[error("Milestone {id} not found")]
    MilestoneNotFound { id: i64 },

    #[error("Workflow already initialized for event {event_id}")]
    AlreadyInitialized { event_id: i64 },

    #[error("Cannot complete stage {stage_id}: {remaining} subtask(s) remaining")]
    IncompleteSubtasks { stage_id: i64, remaining: usize },

    #[error("Invalid {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_not_found_carries_id() {
        let err = WorkflowError::EventNotFound { id: 42 };
        match &err {
            WorkflowError::EventNotFound { id } => assert_eq!(*id, 42),
            _ => panic!("Expected EventNotFound"),
        }
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn incomplete_subtasks_reports_remaining_count() {
        let err = WorkflowError::IncompleteSubtasks {
            stage_id: 7,
            remaining: 3,
        };
        assert!(err.to_string().contains("3 subtask(s) remaining"));
    }

    #[test]
    fn already_initialized_is_matchable() {
        let err = WorkflowError::AlreadyInitialized { event_id: 1 };
        assert!(matches!(
            err,
            WorkflowError::AlreadyInitialized { event_id: 1 }
        ));
    }

    #[test]
    fn converts_from_anyhow() {
        let inner = anyhow::anyhow!("db exploded");
        let err: WorkflowError = inner.into();
        assert!(matches!(err, WorkflowError::Other(_)));
        assert!(err.to_string().contains("db exploded"));
    }

    #[test]
    fn implements_std_error_trait() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&WorkflowError::SubtaskNotFound { id: 9 });
    }
}
