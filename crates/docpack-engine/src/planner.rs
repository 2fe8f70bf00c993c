//! Batch-grouping collaborator seam
//!
//! Deciding how to cluster small files into combined batches is the
//! grouping collaborator's job; the engine consumes its output verbatim.
//! The default planner does only the trivial mapping: one single-file
//! group per file.

use anyhow::Result;
use async_trait::async_trait;

use docpack_core::{BatchFile, BatchGroup, BatchKind};

/// A file that survived estimation and is small enough to batch whole
#[derive(Debug, Clone)]
pub struct EstimatedFile {
    pub path: String,
    pub tokens: usize,
    pub importance: f64,
}

/// Groups small files into batches
#[async_trait]
pub trait BatchPlanner: Send + Sync {
    fn name(&self) -> &'static str;

    async fn group(&self, files: &[EstimatedFile], budget_tokens: usize) -> Result<Vec<BatchGroup>>;
}

/// One single-file batch per file; no combination logic
pub struct OnePerFilePlanner;

#[async_trait]
impl BatchPlanner for OnePerFilePlanner {
    fn name(&self) -> &'static str {
        "one-per-file"
    }

    async fn group(
        &self,
        files: &[EstimatedFile],
        _budget_tokens: usize,
    ) -> Result<Vec<BatchGroup>> {
        Ok(files
            .iter()
            .map(|file| {
                let mut batch_file = BatchFile::new(&file.path, file.tokens);
                batch_file.importance = file.importance;
                BatchGroup::new(BatchKind::SingleFile, vec![batch_file])
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_one_group_per_file() {
        let planner = OnePerFilePlanner;
        let files = vec![
            EstimatedFile {
                path: "a.ts".to_string(),
                tokens: 100,
                importance: 0.5,
            },
            EstimatedFile {
                path: "b.ts".to_string(),
                tokens: 300,
                importance: 0.9,
            },
        ];
        let groups = planner.group(&files, 8000).await.unwrap();

        assert_eq!(groups.len(), 2);
        assert!(groups.iter().all(|g| g.kind == BatchKind::SingleFile));
        assert_eq!(groups[1].files[0].importance, 0.9);
    }
}
