//! Task progress tracking for docpack
//!
//! Maintains one record per scheduled task through the lifecycle
//! `pending → inProgress → {completed | failed | skipped}`:
//! - Transitions are validated; terminal states are sticky and re-entrant
//!   calls are idempotent no-ops
//! - Status bucket counters always sum to the tracked task count
//! - Completed durations feed a running average used for completion
//!   prediction

pub mod record;
pub mod report;

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, warn};

use docpack_core::{CoreError, Result};
use docpack_scheduler::{TaskDefinition, TaskStatus};

pub use record::{HistoryEntry, StatusCounters, TaskRecord};
pub use report::{
    DurationStats, GroupStats, InProgressEntry, OverallProgress, PendingEntry, PerformanceReport,
    QueueStatus, priority_band,
};

/// Configuration for the tracker
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Transition history retention; oldest entries drop past this
    /// (default: 200)
    pub history_max_entries: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            history_max_entries: 200,
        }
    }
}

/// Optional payload reported with a status update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
}

/// What a status update did
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TransitionOutcome {
    /// False for idempotent no-ops (repeat or terminal-state calls)
    pub changed: bool,
    /// Status of the record after the call
    pub status: TaskStatus,
}

/// Tracks live status, aggregate metrics, and completion predictions
pub struct ProgressTracker {
    config: TrackerConfig,
    records: HashMap<String, TaskRecord>,
    /// Seed order, for deterministic report iteration
    order: Vec<String>,
    counters: StatusCounters,
    history: VecDeque<HistoryEntry>,
    run_started_at: Option<OffsetDateTime>,
    completed_count: usize,
    completed_duration_total: f64,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::with_config(TrackerConfig::default()).expect("default tracker config is valid")
    }

    pub fn with_config(config: TrackerConfig) -> Result<Self> {
        if config.history_max_entries == 0 {
            return Err(CoreError::InvalidConfig(
                "history_max_entries must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            config,
            records: HashMap::new(),
            order: Vec::new(),
            counters: StatusCounters::default(),
            history: VecDeque::new(),
            run_started_at: None,
            completed_count: 0,
            completed_duration_total: 0.0,
        })
    }

    /// Reset all counters and seed one pending record per task
    pub fn initialize_tracking(&mut self, tasks: &[TaskDefinition]) {
        self.records.clear();
        self.order.clear();
        self.history.clear();
        self.counters = StatusCounters::default();
        self.completed_count = 0;
        self.completed_duration_total = 0.0;
        self.run_started_at = Some(OffsetDateTime::now_utc());

        for task in tasks {
            if self.records.contains_key(&task.task_id) {
                warn!(task_id = task.task_id, "duplicate task id, keeping first");
                continue;
            }
            self.records.insert(
                task.task_id.clone(),
                TaskRecord {
                    task_id: task.task_id.clone(),
                    status: TaskStatus::Pending,
                    batch_kind: task.batch_kind,
                    priority: task.priority.calculated,
                    created_at: OffsetDateTime::now_utc(),
                    started_at: None,
                    completed_at: None,
                    attempts: 0,
                    result: None,
                    error: None,
                },
            );
            self.order.push(task.task_id.clone());
            self.counters.pending += 1;
        }

        debug!(tasks = self.records.len(), "tracking initialized");
    }

    /// Record a status transition
    ///
    /// Unknown ids fail with `UnknownTask` and leave the tracker unchanged.
    /// Repeat calls and calls on terminal tasks are idempotent no-ops with
    /// no observable effect on aggregate counts. Invalid transitions (e.g.
    /// inProgress back to pending) are also absorbed as no-ops.
    pub fn update_status(
        &mut self,
        task_id: &str,
        new_status: TaskStatus,
        data: StatusUpdate,
    ) -> Result<TransitionOutcome> {
        let record = self
            .records
            .get_mut(task_id)
            .ok_or_else(|| CoreError::UnknownTask(task_id.to_string()))?;

        let old_status = record.status;
        if old_status == new_status || !old_status.can_transition_to(new_status) {
            if !old_status.is_terminal() && old_status != new_status {
                warn!(
                    task_id,
                    from = old_status.name(),
                    to = new_status.name(),
                    "invalid transition ignored"
                );
            }
            return Ok(TransitionOutcome {
                changed: false,
                status: old_status,
            });
        }

        let now = OffsetDateTime::now_utc();

        if new_status == TaskStatus::InProgress {
            record.started_at = Some(now);
            record.attempts += 1;
        }
        if new_status.is_terminal() {
            // A direct pending → terminal jump still counts as an attempt
            if old_status == TaskStatus::Pending {
                record.attempts += 1;
            }
            record.completed_at = Some(now);
            record.result = data.result;
            record.error = data.error;
        }
        record.status = new_status;
        let observed_duration = record.duration_seconds();

        if new_status == TaskStatus::Completed {
            self.completed_count += 1;
            self.completed_duration_total += observed_duration.unwrap_or(0.0);
        }

        *self.counters.bucket_mut(old_status) -= 1;
        *self.counters.bucket_mut(new_status) += 1;
        debug_assert_eq!(self.counters.total(), self.records.len());

        self.history.push_back(HistoryEntry {
            task_id: task_id.to_string(),
            from: old_status,
            to: new_status,
            at: now,
        });
        while self.history.len() > self.config.history_max_entries {
            self.history.pop_front();
        }

        debug!(task_id, status = new_status.name(), "status updated");

        Ok(TransitionOutcome {
            changed: true,
            status: new_status,
        })
    }

    /// Counts, rates, elapsed time, and a predicted remaining time
    pub fn overall_progress(&self) -> OverallProgress {
        let total = self.records.len();
        let counts = self.counters;
        let elapsed_seconds = self
            .run_started_at
            .map(|t| (OffsetDateTime::now_utc() - t).as_seconds_f64().max(0.0))
            .unwrap_or(0.0);

        let completion_rate = rate(counts.completed, total);
        let remaining = counts.pending + counts.in_progress;

        let (predicted, confidence) = if self.completed_count > 0 {
            let avg = self.completed_duration_total / self.completed_count as f64;
            let predicted = remaining as f64 * avg;
            let confidence = (0.5 + completion_rate * 0.45).min(0.95);
            (Some(predicted), Some(confidence))
        } else {
            (None, None)
        };

        OverallProgress {
            total_tasks: total,
            counts,
            completion_rate,
            failure_rate: rate(counts.failed, total),
            elapsed_seconds,
            predicted_remaining_seconds: predicted,
            prediction_confidence: confidence,
        }
    }

    /// Success/failure rates, duration statistics, and breakdowns by task
    /// kind and priority band
    pub fn performance_report(&self) -> PerformanceReport {
        let total = self.records.len();
        let mut durations = Vec::new();
        let mut by_kind: HashMap<String, GroupStats> = HashMap::new();
        let mut by_band: HashMap<String, GroupStats> = HashMap::new();
        let mut kind_durations: HashMap<String, Vec<f64>> = HashMap::new();
        let mut band_durations: HashMap<String, Vec<f64>> = HashMap::new();

        for id in &self.order {
            let Some(record) = self.records.get(id) else {
                continue;
            };
            let kind = record.batch_kind.name().to_string();
            let band = priority_band(record.priority).to_string();

            for (key, map) in [(&kind, &mut by_kind), (&band, &mut by_band)] {
                let stats = map.entry(key.clone()).or_default();
                stats.total += 1;
                match record.status {
                    TaskStatus::Completed => stats.completed += 1,
                    TaskStatus::Failed => stats.failed += 1,
                    _ => {}
                }
            }

            if record.status == TaskStatus::Completed
                && let Some(duration) = record.duration_seconds()
            {
                durations.push(duration);
                kind_durations.entry(kind).or_default().push(duration);
                band_durations.entry(band).or_default().push(duration);
            }
        }

        for (map, per_group) in [(&mut by_kind, kind_durations), (&mut by_band, band_durations)] {
            for (key, values) in per_group {
                if let Some(stats) = map.get_mut(&key)
                    && !values.is_empty()
                {
                    stats.average_duration_seconds =
                        Some(values.iter().sum::<f64>() / values.len() as f64);
                }
            }
        }

        let duration_stats = if durations.is_empty() {
            None
        } else {
            Some(DurationStats {
                min_seconds: durations.iter().copied().fold(f64::INFINITY, f64::min),
                max_seconds: durations.iter().copied().fold(0.0, f64::max),
                average_seconds: durations.iter().sum::<f64>() / durations.len() as f64,
            })
        };

        PerformanceReport {
            success_rate: rate(self.counters.completed, total),
            failure_rate: rate(self.counters.failed, total),
            durations: duration_stats,
            by_kind,
            by_priority_band: by_band,
        }
    }

    /// Pending tasks by priority, running tasks with elapsed time, and
    /// terminal counts
    pub fn queue_status(&self) -> QueueStatus {
        let now = OffsetDateTime::now_utc();
        let mut pending = Vec::new();
        let mut in_progress = Vec::new();

        for id in &self.order {
            let Some(record) = self.records.get(id) else {
                continue;
            };
            match record.status {
                TaskStatus::Pending => pending.push(PendingEntry {
                    task_id: record.task_id.clone(),
                    priority: record.priority,
                }),
                TaskStatus::InProgress => in_progress.push(InProgressEntry {
                    task_id: record.task_id.clone(),
                    elapsed_seconds: record
                        .started_at
                        .map(|t| (now - t).as_seconds_f64().max(0.0))
                        .unwrap_or(0.0),
                    attempts: record.attempts,
                }),
                _ => {}
            }
        }

        pending.sort_by(|a, b| {
            b.priority
                .partial_cmp(&a.priority)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        QueueStatus {
            pending,
            in_progress,
            completed: self.counters.completed,
            failed: self.counters.failed,
            skipped: self.counters.skipped,
        }
    }

    pub fn counters(&self) -> StatusCounters {
        self.counters
    }

    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    pub fn record(&self, task_id: &str) -> Option<&TaskRecord> {
        self.records.get(task_id)
    }

    pub fn total_tracked(&self) -> usize {
        self.records.len()
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

fn rate(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docpack_core::{BatchFile, BatchGroup, BatchKind, ProjectContext};
    use docpack_scheduler::TaskDefinitionBuilder;

    fn tracked_tasks(count: usize) -> (ProgressTracker, Vec<String>) {
        let groups: Vec<BatchGroup> = (0..count)
            .map(|i| {
                BatchGroup::new(
                    BatchKind::SingleFile,
                    vec![BatchFile::new(format!("src/file{i}.ts"), 100 * (i + 1))],
                )
            })
            .collect();
        let outcome = TaskDefinitionBuilder::new().build(&groups, &ProjectContext::default());
        let ids: Vec<String> = outcome.tasks.iter().map(|t| t.task_id.clone()).collect();

        let mut tracker = ProgressTracker::new();
        tracker.initialize_tracking(&outcome.tasks);
        (tracker, ids)
    }

    #[test]
    fn test_initialize_seeds_pending_records() {
        let (tracker, ids) = tracked_tasks(3);
        assert_eq!(tracker.total_tracked(), 3);
        assert_eq!(tracker.counters().pending, 3);
        for id in &ids {
            assert_eq!(tracker.record(id).unwrap().status, TaskStatus::Pending);
        }
    }

    #[test]
    fn test_bucket_sum_invariant_through_transitions() {
        let (mut tracker, ids) = tracked_tasks(4);

        let moves = [
            (&ids[0], TaskStatus::InProgress),
            (&ids[0], TaskStatus::Completed),
            (&ids[1], TaskStatus::InProgress),
            (&ids[2], TaskStatus::InProgress),
            (&ids[2], TaskStatus::Failed),
            (&ids[3], TaskStatus::Skipped),
        ];
        for (id, status) in moves {
            tracker.update_status(id, status, StatusUpdate::default()).unwrap();
            assert_eq!(tracker.counters().total(), tracker.total_tracked());
        }

        let counts = tracker.counters();
        assert_eq!(counts.pending, 0);
        assert_eq!(counts.in_progress, 1);
        assert_eq!(counts.completed, 1);
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.skipped, 1);
    }

    #[test]
    fn test_unknown_task_is_rejected() {
        let (mut tracker, _) = tracked_tasks(1);
        let before = tracker.counters();
        let err = tracker.update_status("task_999", TaskStatus::InProgress, StatusUpdate::default());
        assert!(matches!(err, Err(CoreError::UnknownTask(_))));
        assert_eq!(tracker.counters(), before);
    }

    #[test]
    fn test_terminal_state_is_idempotent() {
        let (mut tracker, ids) = tracked_tasks(1);
        tracker
            .update_status(&ids[0], TaskStatus::InProgress, StatusUpdate::default())
            .unwrap();
        tracker
            .update_status(&ids[0], TaskStatus::Completed, StatusUpdate::default())
            .unwrap();
        let before = tracker.counters();

        let outcome = tracker
            .update_status(&ids[0], TaskStatus::Failed, StatusUpdate::default())
            .unwrap();
        assert!(!outcome.changed);
        assert_eq!(outcome.status, TaskStatus::Completed);
        assert_eq!(tracker.counters(), before);

        let again = tracker
            .update_status(&ids[0], TaskStatus::Completed, StatusUpdate::default())
            .unwrap();
        assert!(!again.changed);
        assert_eq!(tracker.counters(), before);
    }

    #[test]
    fn test_invalid_transition_is_noop() {
        let (mut tracker, ids) = tracked_tasks(1);
        tracker
            .update_status(&ids[0], TaskStatus::InProgress, StatusUpdate::default())
            .unwrap();
        let outcome = tracker
            .update_status(&ids[0], TaskStatus::Pending, StatusUpdate::default())
            .unwrap();
        assert!(!outcome.changed);
        assert_eq!(tracker.counters().in_progress, 1);
    }

    #[test]
    fn test_prediction_absent_before_first_completion() {
        let (mut tracker, ids) = tracked_tasks(2);
        assert!(tracker.overall_progress().predicted_remaining_seconds.is_none());

        tracker
            .update_status(&ids[0], TaskStatus::InProgress, StatusUpdate::default())
            .unwrap();
        tracker
            .update_status(&ids[0], TaskStatus::Completed, StatusUpdate::default())
            .unwrap();

        let progress = tracker.overall_progress();
        assert!(progress.predicted_remaining_seconds.is_some());
        let confidence = progress.prediction_confidence.unwrap();
        assert!(confidence <= 0.95);
    }

    #[test]
    fn test_queue_status_sorted_by_priority() {
        // Mixed kinds produce distinct priorities
        let groups = vec![
            BatchGroup::new(BatchKind::SingleFile, vec![BatchFile::new("util/a.ts", 9000)]),
            BatchGroup::new(BatchKind::SingleFile, vec![BatchFile::new("src/index.ts", 100)]),
        ];
        let outcome = TaskDefinitionBuilder::new().build(&groups, &ProjectContext::default());
        let mut tracker = ProgressTracker::new();
        tracker.initialize_tracking(&outcome.tasks);

        let queue = tracker.queue_status();
        assert_eq!(queue.pending.len(), 2);
        assert!(queue.pending[0].priority >= queue.pending[1].priority);
    }

    #[test]
    fn test_history_is_bounded() {
        let config = TrackerConfig {
            history_max_entries: 3,
        };
        let groups: Vec<BatchGroup> = (0..5)
            .map(|i| {
                BatchGroup::new(
                    BatchKind::SingleFile,
                    vec![BatchFile::new(format!("f{i}.ts"), 100)],
                )
            })
            .collect();
        let outcome = TaskDefinitionBuilder::new().build(&groups, &ProjectContext::default());
        let mut tracker = ProgressTracker::with_config(config).unwrap();
        tracker.initialize_tracking(&outcome.tasks);

        for task in &outcome.tasks {
            tracker
                .update_status(&task.task_id, TaskStatus::InProgress, StatusUpdate::default())
                .unwrap();
        }
        assert_eq!(tracker.history().count(), 3);
        // Oldest entries dropped: the first transition is gone
        let first = tracker.history().next().unwrap();
        assert_ne!(first.task_id, outcome.tasks[0].task_id);
    }

    #[test]
    fn test_performance_report_breakdowns() {
        let groups = vec![
            BatchGroup::new(BatchKind::SingleFile, vec![BatchFile::new("a.ts", 100)]),
            BatchGroup::new(BatchKind::CombinedFiles, vec![
                BatchFile::new("b.ts", 100),
                BatchFile::new("c.ts", 100),
            ]),
        ];
        let outcome = TaskDefinitionBuilder::new().build(&groups, &ProjectContext::default());
        let mut tracker = ProgressTracker::new();
        tracker.initialize_tracking(&outcome.tasks);

        for task in &outcome.tasks {
            tracker
                .update_status(&task.task_id, TaskStatus::InProgress, StatusUpdate::default())
                .unwrap();
            tracker
                .update_status(&task.task_id, TaskStatus::Completed, StatusUpdate::default())
                .unwrap();
        }

        let report = tracker.performance_report();
        assert!((report.success_rate - 1.0).abs() < 1e-9);
        assert_eq!(report.by_kind.len(), 2);
        assert!(report.by_kind.contains_key("singleFile"));
        assert!(report.by_kind.contains_key("combinedFiles"));
        assert!(report.durations.is_some());
        assert!(!report.by_priority_band.is_empty());
    }

    #[test]
    fn test_error_payload_recorded() {
        let (mut tracker, ids) = tracked_tasks(1);
        tracker
            .update_status(&ids[0], TaskStatus::InProgress, StatusUpdate::default())
            .unwrap();
        tracker
            .update_status(
                &ids[0],
                TaskStatus::Failed,
                StatusUpdate {
                    result: None,
                    error: Some("generation timed out".to_string()),
                },
            )
            .unwrap();

        let record = tracker.record(&ids[0]).unwrap();
        assert_eq!(record.error.as_deref(), Some("generation timed out"));
        assert_eq!(record.attempts, 1);
    }
}
