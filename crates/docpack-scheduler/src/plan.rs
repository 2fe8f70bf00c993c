//! Execution plan models

use serde::{Deserialize, Serialize};

/// Phase buckets for the execution driver
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanPhases {
    /// Tasks with no predecessors, ready to run now
    pub immediate: Vec<String>,
    /// Tasks gated behind at least one predecessor
    pub dependent: Vec<String>,
    /// Error-recovery tasks, scheduled last regardless of dependencies
    pub cleanup: Vec<String>,
}

/// A set of mutually independent tasks that could run in parallel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelGroup {
    pub task_ids: Vec<String>,
    /// Heuristic saving: a fixed fraction of the summed duration, not a
    /// scheduling simulation
    pub estimated_savings_seconds: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub total_tasks: usize,
    pub estimated_total_seconds: f64,
    pub phases: PlanPhases,
    pub parallelization_opportunities: Vec<ParallelGroup>,
}
