//! Event planning workflow engine: phase/stage/subtask tracking, milestone
//! schedules, weighted progress aggregation, and rule-based insights over
//! an embedded SQLite store.

pub mod analyzer;
pub mod errors;
pub mod model;
pub mod progress;
pub mod service;
pub mod store;
pub mod templates;

pub use errors::WorkflowError;
pub use model::{
    EventRecord, Milestone, MilestoneType, Phase, Priority, Stage, StageStatus, Subtask,
    TaskStatus, WorkflowProgress,
};
pub use service::{WorkflowService, WorkflowSummary};
pub use store::{DbHandle, SubtaskSeed, WorkflowDb};
