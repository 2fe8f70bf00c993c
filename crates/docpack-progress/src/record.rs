//! Task records and status counters

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use docpack_core::BatchKind;
use docpack_scheduler::TaskStatus;

/// Live record for one tracked task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub task_id: String,
    pub status: TaskStatus,
    pub batch_kind: BatchKind,
    /// Calculated priority carried over from the task definition
    pub priority: f64,
    #[serde(with = "time::serde::timestamp")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::timestamp::option")]
    pub started_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::timestamp::option")]
    pub completed_at: Option<OffsetDateTime>,
    pub attempts: usize,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TaskRecord {
    /// Observed duration for a finished task, in seconds
    pub fn duration_seconds(&self) -> Option<f64> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some((end - start).as_seconds_f64().max(0.0)),
            _ => None,
        }
    }
}

/// Per-status bucket counts
///
/// The sum of all buckets always equals the total tracked task count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounters {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl StatusCounters {
    pub fn total(&self) -> usize {
        self.pending + self.in_progress + self.completed + self.failed + self.skipped
    }

    pub fn bucket_mut(&mut self, status: TaskStatus) -> &mut usize {
        match status {
            TaskStatus::Pending => &mut self.pending,
            TaskStatus::InProgress => &mut self.in_progress,
            TaskStatus::Completed => &mut self.completed,
            TaskStatus::Failed => &mut self.failed,
            TaskStatus::Skipped => &mut self.skipped,
        }
    }

    pub fn terminal(&self) -> usize {
        self.completed + self.failed + self.skipped
    }
}

/// One status transition, kept in a bounded ring buffer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub task_id: String,
    pub from: TaskStatus,
    pub to: TaskStatus,
    #[serde(with = "time::serde::timestamp")]
    pub at: OffsetDateTime,
}
