//! Priority scoring
//!
//! `calculated = base + Σ(weight_f × factor_f)`. The score is a pure
//! function of a small factor struct so it can be tested in isolation;
//! the weights live in one place instead of being scattered through
//! control flow.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Weight applied to each priority factor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorityWeights {
    pub file_importance: f64,
    pub token_count: f64,
    pub complexity: f64,
    pub dependencies: f64,
    pub urgency: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            file_importance: 2.0,
            token_count: 1.0,
            complexity: 1.0,
            dependencies: 1.5,
            urgency: 1.0,
        }
    }
}

/// Raw factor inputs for one task
#[derive(Debug, Clone, Copy, Default)]
pub struct PriorityFactors {
    /// Heuristic name/path importance, 0.0 - 1.0
    pub file_importance: f64,
    /// 1.0 for tiny batches down to 0.0 at the token cap
    pub token_count: f64,
    /// Chunked/combined batches score higher than single-file ones
    pub complexity: f64,
    /// Negative when blocked by predecessors, positive when unblocking many
    pub dependencies: f64,
    /// Error recovery deprioritized; first chunk of a multi-chunk file boosted
    pub urgency: f64,
}

/// Compute the calculated priority and the factor map recorded on the task
pub fn calculate(
    base: f64,
    factors: &PriorityFactors,
    weights: &PriorityWeights,
) -> (f64, HashMap<String, f64>) {
    let calculated = base
        + weights.file_importance * factors.file_importance
        + weights.token_count * factors.token_count
        + weights.complexity * factors.complexity
        + weights.dependencies * factors.dependencies
        + weights.urgency * factors.urgency;

    let map = HashMap::from([
        ("fileImportance".to_string(), factors.file_importance),
        ("tokenCount".to_string(), factors.token_count),
        ("complexity".to_string(), factors.complexity),
        ("dependencies".to_string(), factors.dependencies),
        ("urgency".to_string(), factors.urgency),
    ]);

    (calculated, map)
}

/// Heuristic name/path importance score for one file
///
/// Entry-point files score high, test and fixture files score low.
pub fn file_importance(path: &str) -> f64 {
    let lower = path.to_ascii_lowercase();
    let stem = std::path::Path::new(&lower)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    if lower.contains("test") || lower.contains("spec") || lower.contains("fixture") {
        return 0.2;
    }

    let mut score: f64 = match stem {
        "main" | "index" | "app" | "server" | "lib" | "mod" => 1.0,
        "config" | "settings" | "setup" => 0.6,
        _ => 0.5,
    };

    if lower.contains("src/") || lower.contains("lib/") {
        score += 0.1;
    }

    score.min(1.0)
}
