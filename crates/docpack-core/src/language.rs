//! Language taxonomy shared by estimation and chunking

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Source language of a file, derived from an explicit hint or the path suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    TypeScript,
    JavaScript,
    Python,
    Rust,
    Go,
    Java,
    Markdown,
    Json,
    /// Fallback profile for anything not explicitly modeled
    Generic,
}

impl Language {
    /// Classify from a file path suffix, falling back to `Generic`
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let ext = path
            .as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        Self::from_extension(ext)
    }

    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "ts" | "tsx" | "mts" => Language::TypeScript,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "py" | "pyi" => Language::Python,
            "rs" => Language::Rust,
            "go" => Language::Go,
            "java" => Language::Java,
            "md" | "markdown" => Language::Markdown,
            "json" => Language::Json,
            _ => Language::Generic,
        }
    }

    /// Parse an explicit language hint (case-insensitive), falling back to `Generic`
    pub fn from_hint(hint: &str) -> Self {
        match hint.to_ascii_lowercase().as_str() {
            "typescript" | "ts" => Language::TypeScript,
            "javascript" | "js" => Language::JavaScript,
            "python" | "py" => Language::Python,
            "rust" | "rs" => Language::Rust,
            "go" | "golang" => Language::Go,
            "java" => Language::Java,
            "markdown" | "md" => Language::Markdown,
            "json" => Language::Json,
            _ => Language::Generic,
        }
    }

    /// Whether this language has an explicitly calibrated profile
    /// (affects estimation confidence)
    pub fn is_modeled(&self) -> bool {
        !matches!(self, Language::Generic)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Python => "python",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Java => "java",
            Language::Markdown => "markdown",
            Language::Json => "json",
            Language::Generic => "generic",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(Language::from_path("src/index.ts"), Language::TypeScript);
        assert_eq!(Language::from_path("lib/util.py"), Language::Python);
        assert_eq!(Language::from_path("main.rs"), Language::Rust);
        assert_eq!(Language::from_path("README"), Language::Generic);
    }

    #[test]
    fn test_from_hint_case_insensitive() {
        assert_eq!(Language::from_hint("TypeScript"), Language::TypeScript);
        assert_eq!(Language::from_hint("GOLANG"), Language::Go);
        assert_eq!(Language::from_hint("cobol"), Language::Generic);
    }

    #[test]
    fn test_modeled() {
        assert!(Language::Python.is_modeled());
        assert!(!Language::Generic.is_modeled());
    }
}
