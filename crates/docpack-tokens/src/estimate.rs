//! Token estimate model

use docpack_core::Language;
use serde::{Deserialize, Serialize};

/// Per-category token sub-counts
///
/// Categories are extracted by independent passes over the full text, so
/// counts may reflect overlapping source spans. This is an accepted
/// approximation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub comments: usize,
    pub strings: usize,
    pub keywords: usize,
    pub symbols: usize,
    pub identifiers: usize,
}

/// An approximate token count for one file's content
///
/// Immutable once computed; cached by a content-derived key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenEstimate {
    pub total_tokens: usize,
    pub breakdown: CategoryBreakdown,
    /// Confidence in the estimate, 0.0 - 1.0
    pub confidence: f64,
    pub language: Language,
    /// Source size in characters
    pub source_size: usize,
    /// blake3(path, content), hex-encoded
    pub cache_key: String,
    /// Set when the content could not be read; total_tokens is 0 then
    #[serde(default)]
    pub error: Option<String>,
}

impl TokenEstimate {
    /// Error-tagged estimate for unreadable or absent content
    pub fn failed(path: &str, reason: impl Into<String>) -> Self {
        Self {
            total_tokens: 0,
            breakdown: CategoryBreakdown::default(),
            confidence: 0.0,
            language: Language::from_path(path),
            source_size: 0,
            cache_key: String::new(),
            error: Some(reason.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
