//! Task definition models

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use docpack_core::{BatchFile, BatchKind};

/// Lifecycle state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Skipped,
}

impl TaskStatus {
    /// Completed, failed, and skipped are terminal and sticky
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Skipped
        )
    }

    /// Valid transitions: pending → inProgress → exactly one terminal state
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        match self {
            TaskStatus::Pending => matches!(
                next,
                TaskStatus::InProgress
                    | TaskStatus::Completed
                    | TaskStatus::Failed
                    | TaskStatus::Skipped
            ),
            TaskStatus::InProgress => next.is_terminal(),
            _ => false,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "inProgress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Skipped => "skipped",
        }
    }
}

/// Priority of a task: a base score plus weighted factor contributions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskPriority {
    pub base: f64,
    pub calculated: f64,
    /// Raw factor values keyed by factor name, kept for inspection
    pub factors: HashMap<String, f64>,
}

/// Dependency relations of a task
///
/// `related` is advisory only (directory co-location); nothing orders or
/// blocks on it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskDependencies {
    pub predecessors: BTreeSet<String>,
    pub successors: BTreeSet<String>,
    pub related: BTreeSet<String>,
}

/// The unit of work handed to the execution driver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Unique within a run. For a chunk of a large file the id encodes the
    /// parent file's sequence position and the chunk index
    /// (`task_<parent>_<chunk>`), so ordering is reconstructible without
    /// auxiliary lookup.
    pub task_id: String,
    /// 1-based position in the input batch list
    pub sequential_id: usize,
    pub batch_kind: BatchKind,
    pub file_info: Vec<BatchFile>,
    pub priority: TaskPriority,
    pub dependencies: TaskDependencies,
    pub estimated_tokens: usize,
    pub estimated_duration_seconds: f64,
    pub status: TaskStatus,
    /// Set when the batch group was malformed (`INVALID_BATCH_CONFIG: ...`)
    #[serde(default)]
    pub build_error: Option<String>,
}

impl TaskDefinition {
    pub fn is_chunk(&self) -> bool {
        self.batch_kind == BatchKind::LargeFileChunk
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states_are_sticky() {
        for terminal in [TaskStatus::Completed, TaskStatus::Failed, TaskStatus::Skipped] {
            assert!(terminal.is_terminal());
            for next in [
                TaskStatus::Pending,
                TaskStatus::InProgress,
                TaskStatus::Completed,
                TaskStatus::Failed,
                TaskStatus::Skipped,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn test_pending_to_in_progress() {
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::InProgress));
        assert!(TaskStatus::InProgress.can_transition_to(TaskStatus::Completed));
        assert!(!TaskStatus::InProgress.can_transition_to(TaskStatus::Pending));
    }
}
