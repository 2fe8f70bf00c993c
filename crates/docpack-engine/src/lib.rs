//! Pipeline facade for docpack
//!
//! Wires the planning components together for a caller: estimate token
//! costs, split oversized files at safe boundaries, hand batch groups to
//! the task builder, and seed the progress tracker. Task execution stays
//! with an external driver that reports status back through the tracker.

pub mod planner;

use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use docpack_chunker::{BoundaryChunker, ChunkPlan, ChunkerConfig, StructuralOutline};
use docpack_config::Config;
use docpack_core::{BatchFile, BatchGroup, BatchKind, ProjectContext};
use docpack_progress::{ProgressTracker, TrackerConfig};
use docpack_scheduler::{BuildOutcome, PriorityWeights, SchedulerConfig, TaskDefinitionBuilder};
use docpack_tokens::{EstimatorConfig, FileInput, TokenEstimate, TokenEstimator};

pub use planner::{BatchPlanner, EstimatedFile, OnePerFilePlanner};

/// Everything a driver needs to start executing a run
pub struct PreparedRun {
    pub estimates: Vec<TokenEstimate>,
    pub chunk_plans: Vec<ChunkPlan>,
    pub outcome: BuildOutcome,
    pub tracker: ProgressTracker,
}

pub struct Pipeline {
    estimator: Arc<TokenEstimator>,
    chunker: BoundaryChunker,
    builder: TaskDefinitionBuilder,
    planner: Box<dyn BatchPlanner>,
    tracker_config: TrackerConfig,
    target_chunk_tokens: usize,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::from_config(&Config::default()).expect("default config is valid")
    }

    /// Build a pipeline from the configuration surface
    pub fn from_config(config: &Config) -> Result<Self> {
        let estimator = Arc::new(TokenEstimator::with_config(EstimatorConfig {
            cache_max_entries: config.estimator.cache_max_entries,
            batch_group_size: config.estimator.batch_group_size,
            blend_weighted: config.estimator.blend_weighted,
        })?);

        let chunker = BoundaryChunker::with_config(
            Arc::clone(&estimator),
            ChunkerConfig {
                min_chunk_tokens: config.chunking.min_tokens,
                max_chunk_tokens: config.chunking.max_tokens,
                overlap_lines: config.chunking.overlap_lines,
                preserve_imports: config.chunking.preserve_imports,
                ..ChunkerConfig::default()
            },
        )?;

        let builder = TaskDefinitionBuilder::with_config(SchedulerConfig {
            base_priority: config.scheduler.base_priority,
            token_cap: config.scheduler.token_cap,
            parallel_savings_fraction: config.scheduler.parallel_savings_fraction,
            weights: PriorityWeights {
                file_importance: config.scheduler.weights.file_importance,
                token_count: config.scheduler.weights.token_count,
                complexity: config.scheduler.weights.complexity,
                dependencies: config.scheduler.weights.dependencies,
                urgency: config.scheduler.weights.urgency,
            },
            ..SchedulerConfig::default()
        })?;

        Ok(Self {
            estimator,
            chunker,
            builder,
            planner: Box::new(OnePerFilePlanner),
            tracker_config: TrackerConfig {
                history_max_entries: config.tracker.history_max_entries,
            },
            target_chunk_tokens: config.chunking.target_tokens,
        })
    }

    /// Swap in a real grouping collaborator
    pub fn with_planner(mut self, planner: Box<dyn BatchPlanner>) -> Self {
        self.planner = planner;
        self
    }

    pub fn estimator(&self) -> &Arc<TokenEstimator> {
        &self.estimator
    }

    /// Prepare a run: estimate, chunk oversized files, build the task
    /// queue, and seed tracking.
    ///
    /// Per-file estimation failures are isolated: an unreadable file
    /// yields an error-tagged estimate and is left out of the batches.
    pub async fn prepare(
        &self,
        files: Vec<FileInput>,
        project: &ProjectContext,
    ) -> Result<PreparedRun> {
        let contents: Vec<(String, Option<String>)> = files
            .iter()
            .map(|f| (f.path.clone(), f.content.clone()))
            .collect();

        // 1. Estimate everything, in input order
        let estimates = self.estimator.estimate_batch(files).await;

        // 2. Route each file: oversized files get a chunk plan, the rest
        //    go to the grouping collaborator
        let mut chunk_plans = Vec::new();
        let mut chunk_groups = Vec::new();
        let mut small_files = Vec::new();

        for ((path, content), estimate) in contents.into_iter().zip(&estimates) {
            if estimate.is_error() {
                warn!(path, "skipping unreadable file");
                continue;
            }
            let Some(content) = content else {
                continue;
            };

            if estimate.total_tokens > self.target_chunk_tokens {
                let plan = self.chunker.plan(&path, &content, None, self.target_chunk_tokens);
                let total = plan.chunks.len();
                for chunk in &plan.chunks {
                    chunk_groups.push(BatchGroup::new(
                        BatchKind::LargeFileChunk,
                        vec![BatchFile::chunk(
                            &path,
                            chunk.estimated_tokens,
                            chunk.index,
                            total,
                        )],
                    ));
                }
                chunk_plans.push(plan);
            } else {
                small_files.push(EstimatedFile {
                    path,
                    tokens: estimate.total_tokens,
                    importance: 0.0,
                });
            }
        }

        // 3. Grouping of small files is the collaborator's call
        let mut groups = self
            .planner
            .group(&small_files, self.target_chunk_tokens)
            .await?;
        groups.extend(chunk_groups);

        // 4. Build the queue and seed tracking
        let outcome = self.builder.build(&groups, project);
        let mut tracker = ProgressTracker::with_config(self.tracker_config.clone())?;
        tracker.initialize_tracking(&outcome.tasks);

        debug!(
            files = estimates.len(),
            split = chunk_plans.len(),
            tasks = outcome.tasks.len(),
            "run prepared"
        );

        Ok(PreparedRun {
            estimates,
            chunk_plans,
            outcome,
            tracker,
        })
    }

    /// Plan chunks for one file, with an optional structural outline
    pub fn plan_chunks(
        &self,
        path: &str,
        content: &str,
        outline: Option<&StructuralOutline>,
    ) -> ChunkPlan {
        self.chunker.plan(path, content, outline, self.target_chunk_tokens)
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Read one file into a batch input, isolating access failures
///
/// A file that cannot be read still yields an input; estimation tags it
/// with the error so sibling files are unaffected.
pub async fn load_file(path: &str) -> FileInput {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => FileInput::new(path, content),
        Err(e) => {
            warn!(path, error = %e, "failed to read file");
            FileInput::unreadable(path)
        }
    }
}

/// Read many files, preserving order
pub async fn load_files(paths: &[String]) -> Vec<FileInput> {
    let mut inputs = Vec::with_capacity(paths.len());
    for path in paths {
        inputs.push(load_file(path).await);
    }
    inputs
}
