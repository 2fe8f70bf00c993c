use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Simple configuration for docpack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub estimator: EstimatorConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub tracker: TrackerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_target_tokens")]
    pub target_tokens: usize,

    #[serde(default = "default_min_tokens")]
    pub min_tokens: usize,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_overlap_lines")]
    pub overlap_lines: usize,

    #[serde(default = "default_preserve_imports")]
    pub preserve_imports: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorConfig {
    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,

    #[serde(default = "default_batch_group_size")]
    pub batch_group_size: usize,

    /// Blend weight of the category sum vs. the character-ratio estimate
    #[serde(default = "default_blend_weighted")]
    pub blend_weighted: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_base_priority")]
    pub base_priority: f64,

    #[serde(default = "default_token_cap")]
    pub token_cap: usize,

    #[serde(default = "default_parallel_savings_fraction")]
    pub parallel_savings_fraction: f64,

    #[serde(default)]
    pub weights: WeightsConfig,
}

/// Priority factor weight table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_weight_file_importance")]
    pub file_importance: f64,

    #[serde(default = "default_weight_one")]
    pub token_count: f64,

    #[serde(default = "default_weight_one")]
    pub complexity: f64,

    #[serde(default = "default_weight_dependencies")]
    pub dependencies: f64,

    #[serde(default = "default_weight_one")]
    pub urgency: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_history_max_entries")]
    pub history_max_entries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            estimator: EstimatorConfig::default(),
            scheduler: SchedulerConfig::default(),
            tracker: TrackerConfig::default(),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_tokens: default_target_tokens(),
            min_tokens: default_min_tokens(),
            max_tokens: default_max_tokens(),
            overlap_lines: default_overlap_lines(),
            preserve_imports: default_preserve_imports(),
        }
    }
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            cache_max_entries: default_cache_max_entries(),
            batch_group_size: default_batch_group_size(),
            blend_weighted: default_blend_weighted(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            base_priority: default_base_priority(),
            token_cap: default_token_cap(),
            parallel_savings_fraction: default_parallel_savings_fraction(),
            weights: WeightsConfig::default(),
        }
    }
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            file_importance: default_weight_file_importance(),
            token_count: default_weight_one(),
            complexity: default_weight_one(),
            dependencies: default_weight_dependencies(),
            urgency: default_weight_one(),
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            history_max_entries: default_history_max_entries(),
        }
    }
}

fn default_target_tokens() -> usize {
    8_000
}

fn default_min_tokens() -> usize {
    500
}

fn default_max_tokens() -> usize {
    16_000
}

fn default_overlap_lines() -> usize {
    2
}

fn default_preserve_imports() -> bool {
    true
}

fn default_cache_max_entries() -> usize {
    512
}

fn default_batch_group_size() -> usize {
    8
}

fn default_blend_weighted() -> f64 {
    0.7
}

fn default_base_priority() -> f64 {
    5.0
}

fn default_token_cap() -> usize {
    10_000
}

fn default_parallel_savings_fraction() -> f64 {
    0.3
}

fn default_weight_file_importance() -> f64 {
    2.0
}

fn default_weight_dependencies() -> f64 {
    1.5
}

fn default_weight_one() -> f64 {
    1.0
}

fn default_history_max_entries() -> usize {
    200
}

impl Config {
    /// Load config from default location or create default if not found
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path();

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            // Create default config file
            let config = Config::default();
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(&config)?;
            std::fs::write(&path, content)?;
            Ok(config)
        }
    }

    /// Get config file path
    pub fn config_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "docpack", "docpack") {
            dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("~/.docpack/config.toml")
        }
    }
}
