//! Batch group models
//!
//! Batch groups are produced by an external grouping collaborator. Their
//! shape is fixed here so the scheduler can consume them verbatim: each
//! group declares a kind, a token estimate, a file list, and optional chunk
//! metadata.

use serde::{Deserialize, Serialize};

/// What kind of work unit a batch represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchKind {
    /// Several small files combined into one unit
    CombinedFiles,
    /// One file processed on its own
    SingleFile,
    /// One chunk of an oversized file
    LargeFileChunk,
    /// Retry/cleanup work scheduled after failures
    ErrorRecovery,
}

impl BatchKind {
    pub fn name(&self) -> &'static str {
        match self {
            BatchKind::CombinedFiles => "combinedFiles",
            BatchKind::SingleFile => "singleFile",
            BatchKind::LargeFileChunk => "largeFileChunk",
            BatchKind::ErrorRecovery => "errorRecovery",
        }
    }
}

/// One file (or one chunk of a file) inside a batch group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFile {
    pub path: String,
    pub token_count: usize,
    /// Heuristic importance score assigned by the grouping collaborator
    #[serde(default)]
    pub importance: f64,
    #[serde(default)]
    pub is_chunk: bool,
    #[serde(default)]
    pub chunk_index: Option<usize>,
    #[serde(default)]
    pub total_chunks: Option<usize>,
}

impl BatchFile {
    pub fn new(path: impl Into<String>, token_count: usize) -> Self {
        Self {
            path: path.into(),
            token_count,
            importance: 0.0,
            is_chunk: false,
            chunk_index: None,
            total_chunks: None,
        }
    }

    pub fn chunk(
        path: impl Into<String>,
        token_count: usize,
        chunk_index: usize,
        total_chunks: usize,
    ) -> Self {
        Self {
            path: path.into(),
            token_count,
            importance: 0.0,
            is_chunk: true,
            chunk_index: Some(chunk_index),
            total_chunks: Some(total_chunks),
        }
    }
}

/// A grouping of files intended to be processed as one unit of work
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchGroup {
    pub kind: BatchKind,
    pub files: Vec<BatchFile>,
    pub estimated_tokens: usize,
    /// File count the grouping collaborator claims this group holds.
    /// A mismatch against `files.len()` marks the batch invalid.
    #[serde(default)]
    pub declared_file_count: Option<usize>,
}

impl BatchGroup {
    pub fn new(kind: BatchKind, files: Vec<BatchFile>) -> Self {
        let estimated_tokens = files.iter().map(|f| f.token_count).sum();
        Self {
            kind,
            files,
            estimated_tokens,
            declared_file_count: None,
        }
    }

    /// Declared count contradicts the listed files
    pub fn is_malformed(&self) -> bool {
        self.declared_file_count
            .is_some_and(|n| n != self.files.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimated_tokens_sums_files() {
        let group = BatchGroup::new(
            BatchKind::CombinedFiles,
            vec![BatchFile::new("a.ts", 100), BatchFile::new("b.ts", 250)],
        );
        assert_eq!(group.estimated_tokens, 350);
        assert!(!group.is_malformed());
    }

    #[test]
    fn test_malformed_when_declared_count_differs() {
        let mut group = BatchGroup::new(BatchKind::SingleFile, vec![BatchFile::new("a.ts", 10)]);
        group.declared_file_count = Some(2);
        assert!(group.is_malformed());
    }
}
