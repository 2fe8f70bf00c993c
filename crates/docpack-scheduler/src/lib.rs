//! Task definition building for docpack
//!
//! Converts externally assembled batch groups into a prioritized,
//! dependency-aware task queue plus an execution plan:
//! - Sequential ids, with chunk ids encoding parent position and chunk index
//! - Linear predecessor chains for chunks of the same file
//! - Directory co-location recorded as advisory `related` metadata
//! - Multi-factor priority with a stable descending sort
//! - Malformed groups flagged, never fatal: the build is best-effort

pub mod plan;
pub mod priority;
pub mod task;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use docpack_core::{BatchGroup, BatchKind, CoreError, ProjectContext, Result};

pub use plan::{ExecutionPlan, ParallelGroup, PlanPhases};
pub use priority::{PriorityFactors, PriorityWeights, calculate, file_importance};
pub use task::{TaskDefinition, TaskDependencies, TaskPriority, TaskStatus};

/// Configuration for task building
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub weights: PriorityWeights,
    /// Base score every task starts from (default: 5.0)
    pub base_priority: f64,
    /// Token count at which the size factor bottoms out (default: 10000)
    pub token_cap: usize,
    /// Duration heuristic: seconds per 1000 estimated tokens (default: 30)
    pub seconds_per_kilotoken: f64,
    /// Duration heuristic: fixed seconds per file in a batch (default: 2)
    pub seconds_per_file: f64,
    /// Fraction of summed duration counted as parallelization saving
    /// (default: 0.3)
    pub parallel_savings_fraction: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            weights: PriorityWeights::default(),
            base_priority: 5.0,
            token_cap: 10_000,
            seconds_per_kilotoken: 30.0,
            seconds_per_file: 2.0,
            parallel_savings_fraction: 0.3,
        }
    }
}

/// Per-run build summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSummary {
    pub run_id: Uuid,
    pub project_name: String,
    pub total_tasks: usize,
    pub total_estimated_tokens: usize,
    pub by_kind: HashMap<String, usize>,
    pub estimated_total_seconds: f64,
    pub invalid_batches: usize,
}

/// Result of one build call: always well-formed, warnings included
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildOutcome {
    pub success: bool,
    pub tasks: Vec<TaskDefinition>,
    pub plan: ExecutionPlan,
    pub summary: BuildSummary,
    pub warnings: Vec<String>,
}

/// Builds the task queue and execution plan from batch groups
pub struct TaskDefinitionBuilder {
    config: SchedulerConfig,
}

impl TaskDefinitionBuilder {
    pub fn new() -> Self {
        Self {
            config: SchedulerConfig::default(),
        }
    }

    pub fn with_config(config: SchedulerConfig) -> Result<Self> {
        if !(0.0..=1.0).contains(&config.parallel_savings_fraction) {
            return Err(CoreError::InvalidConfig(format!(
                "parallel_savings_fraction must be within [0, 1], got {}",
                config.parallel_savings_fraction
            )));
        }
        if config.token_cap == 0 {
            return Err(CoreError::InvalidConfig(
                "token_cap must be at least 1".to_string(),
            ));
        }
        Ok(Self { config })
    }

    /// Build tasks from batch groups. Malformed groups yield a flagged,
    /// failed-at-build task and a warning; the rest of the list is
    /// unaffected.
    pub fn build(&self, groups: &[BatchGroup], project: &ProjectContext) -> BuildOutcome {
        let mut warnings = Vec::new();
        let mut tasks = self.assign_tasks(groups, &mut warnings);

        self.infer_dependencies(&mut tasks);
        self.score_tasks(&mut tasks);

        // Stable sort: ties keep input (sequential) order
        tasks.sort_by(|a, b| {
            b.priority
                .calculated
                .partial_cmp(&a.priority.calculated)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let plan = self.build_plan(&tasks);
        let invalid_batches = tasks.iter().filter(|t| t.build_error.is_some()).count();

        let mut by_kind: HashMap<String, usize> = HashMap::new();
        for task in &tasks {
            *by_kind.entry(task.batch_kind.name().to_string()).or_default() += 1;
        }

        let summary = BuildSummary {
            run_id: Uuid::new_v4(),
            project_name: project.project_name.clone(),
            total_tasks: tasks.len(),
            total_estimated_tokens: tasks.iter().map(|t| t.estimated_tokens).sum(),
            by_kind,
            estimated_total_seconds: plan.estimated_total_seconds,
            invalid_batches,
        };

        debug!(
            tasks = tasks.len(),
            invalid = invalid_batches,
            "built task queue"
        );

        BuildOutcome {
            success: true,
            tasks,
            plan,
            summary,
            warnings,
        }
    }

    /// Pass 1: identifiers, durations, and build-time validation
    fn assign_tasks(&self, groups: &[BatchGroup], warnings: &mut Vec<String>) -> Vec<TaskDefinition> {
        let mut tasks = Vec::with_capacity(groups.len());
        // Parent file path -> ordinal (sequence position of its first chunk)
        let mut parent_ordinals: HashMap<String, usize> = HashMap::new();
        let mut seen_chunks: HashSet<(String, usize)> = HashSet::new();

        for (i, group) in groups.iter().enumerate() {
            let sequential_id = i + 1;
            let mut status = TaskStatus::Pending;
            let mut build_error = None;

            let task_id = match chunk_identity(group) {
                Some((parent, chunk_index)) => {
                    if seen_chunks.insert((parent.to_string(), chunk_index)) {
                        let ordinal = *parent_ordinals
                            .entry(parent.to_string())
                            .or_insert(sequential_id);
                        format!("task_{ordinal}_{chunk_index}")
                    } else {
                        // A repeated (parent, chunk index) pair would collide
                        // on the encoded id; flag it and fall back to the
                        // plain sequential form, which cannot collide
                        let message = format!(
                            "INVALID_BATCH_CONFIG: duplicate chunk {chunk_index} of {parent}"
                        );
                        warn!(sequential_id, "{message}");
                        warnings.push(format!("task_{sequential_id}: {message}"));
                        status = TaskStatus::Failed;
                        build_error = Some(message);
                        format!("task_{sequential_id}")
                    }
                }
                None => format!("task_{sequential_id}"),
            };

            if group.is_malformed() {
                let declared = group.declared_file_count.unwrap_or(0);
                let message = format!(
                    "INVALID_BATCH_CONFIG: declared {declared} files but listed {}",
                    group.files.len()
                );
                warn!(task_id, "{message}");
                warnings.push(format!("{task_id}: {message}"));
                status = TaskStatus::Failed;
                build_error = Some(message);
            }

            let estimated_duration_seconds = (group.estimated_tokens as f64 / 1000.0)
                * self.config.seconds_per_kilotoken
                + group.files.len() as f64 * self.config.seconds_per_file;

            tasks.push(TaskDefinition {
                task_id,
                sequential_id,
                batch_kind: group.kind,
                file_info: group.files.clone(),
                priority: TaskPriority {
                    base: self.config.base_priority,
                    calculated: self.config.base_priority,
                    factors: HashMap::new(),
                },
                dependencies: TaskDependencies::default(),
                estimated_tokens: group.estimated_tokens,
                estimated_duration_seconds,
                status,
                build_error,
            });
        }

        tasks
    }

    /// Pass 2: chunk chains are blocking; directory co-location is advisory
    fn infer_dependencies(&self, tasks: &mut [TaskDefinition]) {
        // Chunks of the same parent form a strict linear chain; tasks that
        // failed at build never gate or get gated
        let mut chains: HashMap<String, Vec<(usize, usize)>> = HashMap::new();
        for (idx, task) in tasks.iter().enumerate() {
            if let Some(file) = task.file_info.first()
                && task.is_chunk()
                && task.build_error.is_none()
                && let Some(chunk_index) = file.chunk_index
            {
                chains
                    .entry(file.path.clone())
                    .or_default()
                    .push((chunk_index, idx));
            }
        }

        for chain in chains.values_mut() {
            chain.sort_by_key(|(chunk_index, _)| *chunk_index);
            for pair in chain.windows(2) {
                let (_, prev_idx) = pair[0];
                let (_, next_idx) = pair[1];
                let prev_id = tasks[prev_idx].task_id.clone();
                let next_id = tasks[next_idx].task_id.clone();
                tasks[next_idx].dependencies.predecessors.insert(prev_id);
                tasks[prev_idx].dependencies.successors.insert(next_id);
            }
        }

        // Tasks whose file sets share a directory are related, advisory only
        let mut by_dir: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, task) in tasks.iter().enumerate() {
            for file in &task.file_info {
                if let Some(dir) = std::path::Path::new(&file.path)
                    .parent()
                    .map(|p| p.to_string_lossy().to_string())
                {
                    let members = by_dir.entry(dir).or_default();
                    if members.last() != Some(&idx) {
                        members.push(idx);
                    }
                }
            }
        }
        for members in by_dir.values() {
            for &a in members {
                for &b in members {
                    if a == b {
                        continue;
                    }
                    let other_id = tasks[b].task_id.clone();
                    let linked = tasks[a].dependencies.predecessors.contains(&other_id)
                        || tasks[a].dependencies.successors.contains(&other_id);
                    if !linked {
                        tasks[a].dependencies.related.insert(other_id);
                    }
                }
            }
        }
    }

    /// Pass 3: multi-factor priority
    fn score_tasks(&self, tasks: &mut [TaskDefinition]) {
        for task in tasks.iter_mut() {
            let importance = task
                .file_info
                .iter()
                .map(|f| file_importance(&f.path).max(f.importance.clamp(0.0, 1.0)))
                .fold(0.0_f64, f64::max);

            let cap = self.config.token_cap as f64;
            let token_factor = 1.0 - (task.estimated_tokens as f64).min(cap) / cap;

            let complexity = match task.batch_kind {
                BatchKind::LargeFileChunk => 1.0,
                BatchKind::CombinedFiles => 0.8,
                BatchKind::SingleFile => 0.4,
                BatchKind::ErrorRecovery => 0.2,
            };

            let blocked = if task.dependencies.predecessors.is_empty() {
                0.0
            } else {
                -0.5
            };
            let unblocks = (task.dependencies.successors.len() as f64 * 0.2).min(1.0);
            let dependency_factor = blocked + unblocks;

            let first_of_many = task.is_chunk()
                && task.file_info.first().is_some_and(|f| {
                    f.chunk_index == Some(1) && f.total_chunks.is_some_and(|t| t > 1)
                });
            let urgency = if task.batch_kind == BatchKind::ErrorRecovery {
                -1.0
            } else if first_of_many {
                1.0
            } else {
                0.0
            };

            let factors = PriorityFactors {
                file_importance: importance,
                token_count: token_factor,
                complexity,
                dependencies: dependency_factor,
                urgency,
            };
            let (calculated, map) = calculate(task.priority.base, &factors, &self.config.weights);
            task.priority.calculated = calculated;
            task.priority.factors = map;
        }
    }

    /// Pass 4: phases and parallelization opportunities
    fn build_plan(&self, tasks: &[TaskDefinition]) -> ExecutionPlan {
        let mut phases = PlanPhases::default();

        for task in tasks {
            if task.batch_kind == BatchKind::ErrorRecovery {
                phases.cleanup.push(task.task_id.clone());
            } else if task.dependencies.predecessors.is_empty() {
                phases.immediate.push(task.task_id.clone());
            } else {
                phases.dependent.push(task.task_id.clone());
            }
        }

        let mut opportunities = Vec::new();

        // The immediate phase is mutually independent by construction
        if phases.immediate.len() >= 2 {
            opportunities.push(self.parallel_group(tasks, &phases.immediate));
        }

        // Chunks at the same depth in different files are pairwise
        // independent as well
        let mut by_depth: HashMap<usize, Vec<String>> = HashMap::new();
        for task in tasks {
            if let Some(file) = task.file_info.first()
                && task.is_chunk()
                && let Some(chunk_index) = file.chunk_index
                && chunk_index > 1
            {
                by_depth.entry(chunk_index).or_default().push(task.task_id.clone());
            }
        }
        let mut depths: Vec<_> = by_depth.into_iter().collect();
        depths.sort_by_key(|(depth, _)| *depth);
        for (_, ids) in depths {
            if ids.len() >= 2 {
                opportunities.push(self.parallel_group(tasks, &ids));
            }
        }

        ExecutionPlan {
            total_tasks: tasks.len(),
            estimated_total_seconds: tasks.iter().map(|t| t.estimated_duration_seconds).sum(),
            phases,
            parallelization_opportunities: opportunities,
        }
    }

    fn parallel_group(&self, tasks: &[TaskDefinition], ids: &[String]) -> ParallelGroup {
        let summed: f64 = tasks
            .iter()
            .filter(|t| ids.contains(&t.task_id))
            .map(|t| t.estimated_duration_seconds)
            .sum();
        ParallelGroup {
            task_ids: ids.to_vec(),
            estimated_savings_seconds: summed * self.config.parallel_savings_fraction,
        }
    }
}

impl Default for TaskDefinitionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Chunk groups carry exactly one chunk file with its index metadata
fn chunk_identity(group: &BatchGroup) -> Option<(&str, usize)> {
    if group.kind != BatchKind::LargeFileChunk {
        return None;
    }
    let file = group.files.first()?;
    if !file.is_chunk {
        return None;
    }
    Some((file.path.as_str(), file.chunk_index?))
}
