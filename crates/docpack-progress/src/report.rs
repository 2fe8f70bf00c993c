//! Progress, performance, and queue reports

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::record::StatusCounters;

/// Snapshot of overall run progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverallProgress {
    pub total_tasks: usize,
    pub counts: StatusCounters,
    /// Completed / total, 0.0 - 1.0
    pub completion_rate: f64,
    /// Failed / total, 0.0 - 1.0
    pub failure_rate: f64,
    pub elapsed_seconds: f64,
    /// `remaining × average completed duration`; `None` until the first
    /// task completes
    pub predicted_remaining_seconds: Option<f64>,
    /// Prediction confidence, capped at 0.95; `None` with the prediction
    pub prediction_confidence: Option<f64>,
}

/// Aggregate duration statistics over completed tasks
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DurationStats {
    pub min_seconds: f64,
    pub max_seconds: f64,
    pub average_seconds: f64,
}

/// Per-group slice of the performance report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupStats {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub average_duration_seconds: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceReport {
    pub success_rate: f64,
    pub failure_rate: f64,
    /// `None` until at least one task has completed
    pub durations: Option<DurationStats>,
    /// Keyed by batch kind name
    pub by_kind: HashMap<String, GroupStats>,
    /// Keyed by priority band: "high" (≥8), "medium" (≥5), "low"
    pub by_priority_band: HashMap<String, GroupStats>,
}

/// Priority band for reporting: high ≥ 8, medium ≥ 5, low otherwise
pub fn priority_band(priority: f64) -> &'static str {
    if priority >= 8.0 {
        "high"
    } else if priority >= 5.0 {
        "medium"
    } else {
        "low"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingEntry {
    pub task_id: String,
    pub priority: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InProgressEntry {
    pub task_id: String,
    pub elapsed_seconds: f64,
    pub attempts: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStatus {
    /// Pending tasks sorted by priority descending
    pub pending: Vec<PendingEntry>,
    pub in_progress: Vec<InProgressEntry>,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_bands() {
        assert_eq!(priority_band(9.1), "high");
        assert_eq!(priority_band(8.0), "high");
        assert_eq!(priority_band(6.5), "medium");
        assert_eq!(priority_band(5.0), "medium");
        assert_eq!(priority_band(4.99), "low");
    }
}
