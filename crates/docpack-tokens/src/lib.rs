//! Heuristic token estimation for docpack
//!
//! Estimates the token cost of source files for a token-limited generation
//! model. Estimates are deliberately approximate but bounded and
//! repeatable:
//! - Categories (comments, strings, keywords, symbols, identifiers) are
//!   extracted by independent passes and weighted per language
//! - The weighted sum is blended with a character-ratio estimate to dampen
//!   outliers
//! - Results are cached by a content-derived key with oldest-first eviction

pub mod cache;
pub mod estimate;
pub mod profile;

use std::sync::{Arc, LazyLock, RwLock};

use regex::Regex;
use tracing::debug;

use docpack_core::{CoreError, Language, Result};

pub use cache::EstimateCache;
pub use estimate::{CategoryBreakdown, TokenEstimate};
pub use profile::{CategoryWeights, LanguageProfile, profile_for};

// Quoted strings: double, single, and backtick quoted, with escapes
static STRING_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*'|`(?:[^`\\]|\\.)*`"#).unwrap()
});

// Identifier-shaped words; keywords are matched out of this set
static IDENT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z_][A-Za-z0-9_]*\b").unwrap());

// Punctuation and operator characters
static SYMBOL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[{}()\[\];:,.<>=+\-*/&|!?%^~#@]").unwrap());

/// Configuration for the token estimator
#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    /// Maximum cached estimates before oldest-first eviction (default: 512)
    pub cache_max_entries: usize,
    /// Concurrent group size for batch estimation (default: 8)
    pub batch_group_size: usize,
    /// Blend weight of the category sum vs. the character ratio
    /// (default: 0.7, i.e. a 70/30 blend)
    pub blend_weighted: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            cache_max_entries: 512,
            batch_group_size: 8,
            blend_weighted: 0.7,
        }
    }
}

/// One file submitted for batch estimation
///
/// `content` is `None` when the caller failed to read the file; the batch
/// still returns an entry for it, tagged with the error.
#[derive(Debug, Clone)]
pub struct FileInput {
    pub path: String,
    pub content: Option<String>,
    pub language_hint: Option<Language>,
}

impl FileInput {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: Some(content.into()),
            language_hint: None,
        }
    }

    pub fn unreadable(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: None,
            language_hint: None,
        }
    }
}

/// Heuristic token estimator with a bounded estimate cache
pub struct TokenEstimator {
    config: EstimatorConfig,
    cache: RwLock<EstimateCache>,
}

impl TokenEstimator {
    pub fn new() -> Self {
        Self::with_config(EstimatorConfig::default()).expect("default estimator config is valid")
    }

    /// Invalid configuration values are the only condition that aborts
    /// construction; estimation itself never fails past the caller.
    pub fn with_config(config: EstimatorConfig) -> Result<Self> {
        if !(0.0..=1.0).contains(&config.blend_weighted) {
            return Err(CoreError::InvalidConfig(format!(
                "blend_weighted must be within [0, 1], got {}",
                config.blend_weighted
            )));
        }
        if config.batch_group_size == 0 {
            return Err(CoreError::InvalidConfig(
                "batch_group_size must be at least 1".to_string(),
            ));
        }
        if config.cache_max_entries == 0 {
            return Err(CoreError::InvalidConfig(
                "cache_max_entries must be at least 1".to_string(),
            ));
        }
        let cache = RwLock::new(EstimateCache::new(config.cache_max_entries));
        Ok(Self { config, cache })
    }

    /// Estimate the token cost of one file
    ///
    /// Never fails: absent content yields an error-tagged estimate with
    /// zero tokens and zero confidence.
    pub fn estimate(
        &self,
        path: &str,
        content: Option<&str>,
        language_hint: Option<Language>,
    ) -> TokenEstimate {
        let Some(content) = content else {
            return TokenEstimate::failed(path, "content unavailable");
        };

        let key = EstimateCache::key(path, content);
        if let Some(hit) = self.cache.read().unwrap().get(&key) {
            return hit.clone();
        }

        let language = language_hint.unwrap_or_else(|| Language::from_path(path));
        let estimate = self.compute(path, content, language, key.clone());

        self.cache.write().unwrap().insert(key, estimate.clone());
        estimate
    }

    /// Estimate a batch of files concurrently in fixed-size groups
    ///
    /// Returns one result per input in input order. Per-item failures are
    /// isolated: an unreadable file or a panicked worker yields an
    /// error-tagged entry, never an aborted batch.
    pub async fn estimate_batch(self: &Arc<Self>, files: Vec<FileInput>) -> Vec<TokenEstimate> {
        let total = files.len();
        let mut results = Vec::with_capacity(total);

        for group in files.chunks(self.config.batch_group_size) {
            let handles: Vec<_> = group
                .iter()
                .cloned()
                .map(|input| {
                    let estimator = Arc::clone(self);
                    tokio::spawn(async move {
                        estimator.estimate(&input.path, input.content.as_deref(), input.language_hint)
                    })
                })
                .collect();

            let joined = futures_util::future::join_all(handles).await;
            for (outcome, input) in joined.into_iter().zip(group) {
                match outcome {
                    Ok(estimate) => results.push(estimate),
                    Err(e) => {
                        results.push(TokenEstimate::failed(
                            &input.path,
                            format!("estimation worker failed: {e}"),
                        ));
                    }
                }
            }
        }

        debug!("Estimated batch of {} files", total);
        results
    }

    pub fn cache_len(&self) -> usize {
        self.cache.read().unwrap().len()
    }

    pub fn clear_cache(&self) {
        self.cache.write().unwrap().clear();
    }

    fn compute(&self, path: &str, content: &str, language: Language, key: String) -> TokenEstimate {
        let profile = profile_for(language);
        let cpt = profile.chars_per_token;
        let w = &profile.weights;

        let comment_chars = count_comment_chars(content, profile);
        let string_chars: usize = STRING_REGEX.find_iter(content).map(|m| m.len()).sum();

        let mut keyword_count = 0usize;
        let mut identifier_count = 0usize;
        for m in IDENT_REGEX.find_iter(content) {
            if profile.keywords.contains(&m.as_str()) {
                keyword_count += 1;
            } else {
                identifier_count += 1;
            }
        }
        let symbol_count = SYMBOL_REGEX.find_iter(content).count();

        let breakdown = CategoryBreakdown {
            comments: ((comment_chars as f64 / cpt) * w.comment).round() as usize,
            strings: ((string_chars as f64 / cpt) * w.string).round() as usize,
            keywords: ((keyword_count as f64) * w.keyword).round() as usize,
            symbols: ((symbol_count as f64) * w.symbol).round() as usize,
            identifiers: ((identifier_count as f64) * w.identifier).round() as usize,
        };

        let weighted = (breakdown.comments
            + breakdown.strings
            + breakdown.keywords
            + breakdown.symbols
            + breakdown.identifiers) as f64;
        let char_ratio = content.chars().count() as f64 / cpt;

        let blend = self.config.blend_weighted;
        let total_tokens = (weighted * blend + char_ratio * (1.0 - blend)).round() as usize;

        let confidence = confidence_for(language, content.chars().count());

        debug!(
            path,
            language = language.name(),
            total_tokens,
            "estimated tokens"
        );

        TokenEstimate {
            total_tokens,
            breakdown,
            confidence,
            language,
            source_size: content.chars().count(),
            cache_key: key,
            error: None,
        }
    }
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self::new()
    }
}

/// Count characters covered by comments according to the profile's markers
fn count_comment_chars(content: &str, profile: &LanguageProfile) -> usize {
    let mut chars = 0usize;

    if let Some(marker) = profile.line_comment {
        for line in content.lines() {
            if let Some(pos) = line.find(marker) {
                chars += line.len() - pos;
            }
        }
    }

    if let Some((open, close)) = profile.block_comment {
        let mut rest = content;
        while let Some(start) = rest.find(open) {
            let after = &rest[start + open.len()..];
            match after.find(close) {
                Some(end) => {
                    chars += open.len() + end + close.len();
                    rest = &after[end + close.len()..];
                }
                None => {
                    chars += rest.len() - start;
                    break;
                }
            }
        }
    }

    chars
}

/// Confidence is higher for explicitly modeled languages and for content
/// whose length sits in a typical band.
fn confidence_for(language: Language, source_size: usize) -> f64 {
    let mut confidence: f64 = 0.5;
    if language.is_modeled() {
        confidence += 0.3;
    }
    if (200..=100_000).contains(&source_size) {
        confidence += 0.15;
    }
    confidence.min(0.95)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS_SAMPLE: &str = r#"
// entry point
import { helper } from './helper';

export function main(): void {
    const message = "hello world";
    helper(message);
}
"#;

    #[test]
    fn test_estimate_bounds() {
        let estimator = TokenEstimator::new();
        let estimate = estimator.estimate("src/main.ts", Some(TS_SAMPLE), None);

        assert!(estimate.total_tokens > 0);
        assert!((0.0..=1.0).contains(&estimate.confidence));
        assert_eq!(estimate.language, Language::TypeScript);
        assert!(estimate.error.is_none());
    }

    #[test]
    fn test_empty_content_is_zero_tokens_not_error() {
        let estimator = TokenEstimator::new();
        let estimate = estimator.estimate("empty.ts", Some(""), None);
        assert_eq!(estimate.total_tokens, 0);
        assert!(estimate.error.is_none());
    }

    #[test]
    fn test_missing_content_is_error_tagged() {
        let estimator = TokenEstimator::new();
        let estimate = estimator.estimate("gone.ts", None, None);
        assert_eq!(estimate.total_tokens, 0);
        assert_eq!(estimate.confidence, 0.0);
        assert!(estimate.is_error());
    }

    #[test]
    fn test_estimate_is_repeatable_and_cached() {
        let estimator = TokenEstimator::new();
        let a = estimator.estimate("src/main.ts", Some(TS_SAMPLE), None);
        let b = estimator.estimate("src/main.ts", Some(TS_SAMPLE), None);
        assert_eq!(a.total_tokens, b.total_tokens);
        assert_eq!(estimator.cache_len(), 1);
    }

    #[test]
    fn test_language_hint_overrides_suffix() {
        let estimator = TokenEstimator::new();
        let estimate = estimator.estimate("script.txt", Some("def f():\n    pass\n"), Some(Language::Python));
        assert_eq!(estimate.language, Language::Python);
    }

    #[test]
    fn test_modeled_language_raises_confidence() {
        let estimator = TokenEstimator::new();
        let body = "x = 1\n".repeat(100);
        let modeled = estimator.estimate("a.py", Some(&body), None);
        let generic = estimator.estimate("a.unknownext", Some(&body), None);
        assert!(modeled.confidence > generic.confidence);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EstimatorConfig {
            blend_weighted: 1.5,
            ..EstimatorConfig::default()
        };
        assert!(TokenEstimator::with_config(config).is_err());
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_cardinality() {
        let estimator = Arc::new(TokenEstimator::new());
        let files = vec![
            FileInput::new("a.ts", "const a = 1;"),
            FileInput::unreadable("b.ts"),
            FileInput::new("c.py", "x = 2"),
        ];
        let results = estimator.estimate_batch(files).await;

        assert_eq!(results.len(), 3);
        assert!(results[0].error.is_none());
        assert!(results[1].is_error());
        assert!(results[2].error.is_none());
        assert_eq!(results[2].language, Language::Python);
    }

    #[tokio::test]
    async fn test_batch_larger_than_group_size() {
        let estimator = Arc::new(
            TokenEstimator::with_config(EstimatorConfig {
                batch_group_size: 2,
                ..EstimatorConfig::default()
            })
            .unwrap(),
        );
        let files: Vec<FileInput> = (0..7)
            .map(|i| FileInput::new(format!("f{i}.ts"), format!("const x{i} = {i};")))
            .collect();
        let results = estimator.estimate_batch(files).await;
        assert_eq!(results.len(), 7);
        assert!(results.iter().all(|r| !r.is_error()));
    }
}
