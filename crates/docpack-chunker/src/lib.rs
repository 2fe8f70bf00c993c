//! Boundary-aware chunk planning for docpack
//!
//! Splits a file too large for one processing unit into the fewest chunks
//! such that no chunk exceeds the token target, cutting only at safe
//! boundaries (declaration starts, comment blocks, imports). Falls back to
//! fixed-size line slicing when no language rules apply, and tags every
//! plan with the strategy used so downstream consumers know whether the
//! semantic guarantees hold.

pub mod boundary;
pub mod chunk;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use docpack_core::{CoreError, Language, Result};
use docpack_tokens::TokenEstimator;

pub use boundary::{BoundaryCandidate, BoundaryKind};
pub use chunk::{Chunk, ChunkKind, OutlineItem, OutlineKind, StructuralOutline};

/// Configuration for chunk planning
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Smallest acceptable chunk; a tiny trailing chunk is merged into its
    /// predecessor (default: 500)
    pub min_chunk_tokens: usize,
    /// Hard ceiling applied to any requested target (default: 16000)
    pub max_chunk_tokens: usize,
    /// Lines of overlap carried into the next chunk's content (default: 2)
    pub overlap_lines: usize,
    /// Duplicate the file's leading import lines into chunks after the
    /// first (default: true)
    pub preserve_imports: bool,
    /// Cap on duplicated import lines (default: 20)
    pub max_import_lines: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            min_chunk_tokens: 500,
            max_chunk_tokens: 16_000,
            overlap_lines: 2,
            preserve_imports: true,
            max_import_lines: 20,
        }
    }
}

/// How a plan was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChunkStrategy {
    /// Cuts fall on safe syntactic boundaries
    BoundaryAware,
    /// Fixed-size line slicing; no semantic guarantees
    SimpleSplit,
}

/// The ordered chunk sequence for one file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkPlan {
    pub path: String,
    pub language: Language,
    pub strategy: ChunkStrategy,
    pub target_tokens: usize,
    pub total_tokens: usize,
    pub chunks: Vec<Chunk>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl ChunkPlan {
    pub fn is_split(&self) -> bool {
        self.chunks.len() > 1
    }
}

/// Plans token-bounded chunks along safe cut lines
pub struct BoundaryChunker {
    estimator: Arc<TokenEstimator>,
    config: ChunkerConfig,
}

impl BoundaryChunker {
    pub fn new(estimator: Arc<TokenEstimator>) -> Self {
        Self {
            estimator,
            config: ChunkerConfig::default(),
        }
    }

    pub fn with_config(estimator: Arc<TokenEstimator>, config: ChunkerConfig) -> Result<Self> {
        if config.min_chunk_tokens >= config.max_chunk_tokens {
            return Err(CoreError::InvalidConfig(format!(
                "min_chunk_tokens ({}) must be below max_chunk_tokens ({})",
                config.min_chunk_tokens, config.max_chunk_tokens
            )));
        }
        Ok(Self { estimator, config })
    }

    /// Plan chunks for one file. Never fails: a malformed outline degrades
    /// to warnings, and a language without boundary rules degrades to the
    /// simple-split strategy.
    pub fn plan(
        &self,
        path: &str,
        content: &str,
        outline: Option<&StructuralOutline>,
        target_chunk_tokens: usize,
    ) -> ChunkPlan {
        let language = Language::from_path(path);
        let target = target_chunk_tokens.min(self.config.max_chunk_tokens).max(1);
        let lines: Vec<&str> = content.lines().collect();

        let total = self
            .estimator
            .estimate(path, Some(content), Some(language))
            .total_tokens;

        let mut warnings = Vec::new();

        if lines.is_empty() {
            return ChunkPlan {
                path: path.to_string(),
                language,
                strategy: ChunkStrategy::BoundaryAware,
                target_tokens: target,
                total_tokens: total,
                chunks: Vec::new(),
                warnings: vec!["empty content, nothing to chunk".to_string()],
            };
        }

        // Already within budget: a single whole-file chunk
        if total <= target {
            let chunk = Chunk {
                index: 1,
                start_line: 1,
                end_line: lines.len(),
                estimated_tokens: total,
                content: content_slice(&lines, 1, lines.len()),
                context_lines: Vec::new(),
                kind: ChunkKind::Mixed,
            };
            return ChunkPlan {
                path: path.to_string(),
                language,
                strategy: ChunkStrategy::BoundaryAware,
                target_tokens: target,
                total_tokens: total,
                chunks: vec![chunk],
                warnings,
            };
        }

        let mut candidates = boundary::scan(content, language);

        if let Some(outline) = outline {
            for item in &outline.items {
                if item.line == 0 || item.line > lines.len() {
                    warnings.push(format!(
                        "outline entry at line {} is out of range, ignored",
                        item.line
                    ));
                    continue;
                }
                candidates.push(BoundaryCandidate {
                    line_number: item.line,
                    kind: match item.kind {
                        OutlineKind::Function => BoundaryKind::Function,
                        OutlineKind::Class => BoundaryKind::Class,
                        OutlineKind::Interface => BoundaryKind::Interface,
                        OutlineKind::Type => BoundaryKind::Type,
                    },
                    indent_level: 0,
                    // Outline entries are precise, so they outrank guesses
                    priority: 15,
                });
            }
        }

        if !boundary::has_rules(language) && candidates.is_empty() {
            warnings.push(format!(
                "no boundary rules for language '{}', using simple split",
                language.name()
            ));
            return self.simple_split(path, language, &lines, total, target, warnings);
        }

        if candidates.is_empty() {
            warnings.push("no safe boundaries found, using simple split".to_string());
            return self.simple_split(path, language, &lines, total, target, warnings);
        }

        candidates.sort_by(|a, b| {
            a.line_number
                .cmp(&b.line_number)
                .then(b.priority.cmp(&a.priority))
        });
        candidates.dedup_by_key(|c| c.line_number);

        let segments = build_segments(&candidates, lines.len());
        let chunks = self.pack_segments(path, language, &lines, &segments, target);

        debug!(
            path,
            chunks = chunks.len(),
            total_tokens = total,
            "planned boundary-aware chunks"
        );

        ChunkPlan {
            path: path.to_string(),
            language,
            strategy: ChunkStrategy::BoundaryAware,
            target_tokens: target,
            total_tokens: total,
            chunks,
            warnings,
        }
    }

    /// Greedily pack whole segments into chunks up to the target. A single
    /// segment larger than the target becomes its own oversized chunk
    /// rather than being corrupted by an arbitrary cut.
    fn pack_segments(
        &self,
        path: &str,
        language: Language,
        lines: &[&str],
        segments: &[Segment],
        target: usize,
    ) -> Vec<Chunk> {
        let mut drafts: Vec<Draft> = Vec::new();
        let mut current: Option<Draft> = None;

        for seg in segments {
            let seg_text = content_slice(lines, seg.start_line, seg.end_line);
            let seg_tokens = self
                .estimator
                .estimate(path, Some(&seg_text), Some(language))
                .total_tokens;

            match current.as_mut() {
                Some(draft) if draft.tokens + seg_tokens > target => {
                    drafts.push(current.take().unwrap());
                    current = Some(Draft::start(seg, seg_tokens));
                }
                Some(draft) => {
                    draft.extend(seg, seg_tokens);
                }
                None => {
                    current = Some(Draft::start(seg, seg_tokens));
                }
            }
        }
        if let Some(draft) = current {
            drafts.push(draft);
        }

        // A trailing sliver is merged into its predecessor, but only while
        // the merged chunk still fits the target
        if drafts.len() > 1 {
            let tail_tokens = drafts.last().map(|d| d.tokens).unwrap_or(0);
            let prev_tokens = drafts[drafts.len() - 2].tokens;
            if tail_tokens < self.config.min_chunk_tokens && prev_tokens + tail_tokens <= target {
                let tail = drafts.pop().unwrap();
                let prev = drafts.last_mut().unwrap();
                prev.end_line = tail.end_line;
                prev.tokens += tail.tokens;
                prev.kinds.extend(tail.kinds);
            }
        }

        let import_lines = if self.config.preserve_imports {
            leading_imports(lines, language, self.config.max_import_lines)
        } else {
            Vec::new()
        };

        drafts
            .into_iter()
            .enumerate()
            .map(|(i, draft)| {
                let index = i + 1;
                let content_start = if index > 1 {
                    draft.start_line.saturating_sub(self.config.overlap_lines).max(1)
                } else {
                    draft.start_line
                };
                Chunk {
                    index,
                    start_line: draft.start_line,
                    end_line: draft.end_line,
                    estimated_tokens: draft.tokens,
                    content: content_slice(lines, content_start, draft.end_line),
                    context_lines: if index > 1 {
                        import_lines.clone()
                    } else {
                        Vec::new()
                    },
                    kind: draft.kind(),
                }
            })
            .collect()
    }

    /// Fixed-size line slicing for files without usable boundaries
    fn simple_split(
        &self,
        path: &str,
        language: Language,
        lines: &[&str],
        total: usize,
        target: usize,
        warnings: Vec<String>,
    ) -> ChunkPlan {
        let tokens_per_line = (total as f64 / lines.len() as f64).max(0.1);
        let lines_per_chunk = ((target as f64 / tokens_per_line).floor() as usize).max(1);

        let mut chunks = Vec::new();
        let mut start = 1usize;
        while start <= lines.len() {
            let end = (start + lines_per_chunk - 1).min(lines.len());
            let text = content_slice(lines, start, end);
            let tokens = self
                .estimator
                .estimate(path, Some(&text), Some(language))
                .total_tokens;
            chunks.push(Chunk {
                index: chunks.len() + 1,
                start_line: start,
                end_line: end,
                estimated_tokens: tokens,
                content: text,
                context_lines: Vec::new(),
                kind: ChunkKind::Fallback,
            });
            start = end + 1;
        }

        debug!(path, chunks = chunks.len(), "planned simple-split chunks");

        ChunkPlan {
            path: path.to_string(),
            language,
            strategy: ChunkStrategy::SimpleSplit,
            target_tokens: target,
            total_tokens: total,
            chunks,
            warnings,
        }
    }
}

/// A span between consecutive safe boundaries (or file edges)
struct Segment {
    start_line: usize,
    end_line: usize,
    kind: Option<BoundaryKind>,
}

struct Draft {
    start_line: usize,
    end_line: usize,
    tokens: usize,
    kinds: Vec<Option<BoundaryKind>>,
}

impl Draft {
    fn start(seg: &Segment, tokens: usize) -> Self {
        Self {
            start_line: seg.start_line,
            end_line: seg.end_line,
            tokens,
            kinds: vec![seg.kind],
        }
    }

    fn extend(&mut self, seg: &Segment, tokens: usize) {
        self.end_line = seg.end_line;
        self.tokens += tokens;
        self.kinds.push(seg.kind);
    }

    fn kind(&self) -> ChunkKind {
        let mut mapped: Vec<ChunkKind> = self
            .kinds
            .iter()
            .map(|k| match k {
                Some(BoundaryKind::Function) => ChunkKind::FunctionFocused,
                Some(BoundaryKind::Class) | Some(BoundaryKind::Interface) => {
                    ChunkKind::ClassFocused
                }
                Some(BoundaryKind::Module) | Some(BoundaryKind::Type) => ChunkKind::ModuleFocused,
                Some(BoundaryKind::Comment) | Some(BoundaryKind::Other) => ChunkKind::Mixed,
                None => ChunkKind::Remainder,
            })
            .collect();
        mapped.dedup();
        match mapped.as_slice() {
            [single] => *single,
            _ => ChunkKind::Mixed,
        }
    }
}

/// Slice segments out of the boundary list so every line lands in exactly
/// one segment.
fn build_segments(candidates: &[BoundaryCandidate], line_count: usize) -> Vec<Segment> {
    let mut segments = Vec::new();

    let first = candidates[0].line_number;
    if first > 1 {
        segments.push(Segment {
            start_line: 1,
            end_line: first - 1,
            kind: None,
        });
    }

    for (i, candidate) in candidates.iter().enumerate() {
        let end = candidates
            .get(i + 1)
            .map(|next| next.line_number - 1)
            .unwrap_or(line_count);
        if candidate.line_number <= end {
            segments.push(Segment {
                start_line: candidate.line_number,
                end_line: end,
                kind: Some(candidate.kind),
            });
        }
    }

    segments
}

/// Join a 1-based inclusive line range back into text
fn content_slice(lines: &[&str], start: usize, end: usize) -> String {
    lines[start - 1..end].join("\n")
}

/// Leading import/module lines from the file head, for duplication into
/// later chunks
fn leading_imports(lines: &[&str], language: Language, max: usize) -> Vec<String> {
    let candidates = boundary::scan(&lines.join("\n"), language);
    let mut imports = Vec::new();
    for (idx, line) in lines.iter().take(max).enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let is_import = candidates
            .iter()
            .any(|c| c.line_number == idx + 1 && c.kind == BoundaryKind::Module);
        if is_import {
            imports.push((*line).to_string());
        } else {
            break;
        }
    }
    imports
}

#[cfg(test)]
mod tests {
    use super::*;
    use docpack_tokens::TokenEstimator;

    fn chunker() -> BoundaryChunker {
        BoundaryChunker::with_config(
            Arc::new(TokenEstimator::new()),
            ChunkerConfig {
                min_chunk_tokens: 10,
                overlap_lines: 0,
                ..ChunkerConfig::default()
            },
        )
        .unwrap()
    }

    fn big_ts_file(functions: usize) -> String {
        let mut out = String::from("import { helper } from './helper';\n\n");
        for i in 0..functions {
            out.push_str(&format!(
                "export function handler{i}(input: string): string {{\n    const value = helper(input) + \"suffix-{i}\";\n    if (value.length > 10) {{\n        return value.toUpperCase();\n    }}\n    return value;\n}}\n\n"
            ));
        }
        out
    }

    #[test]
    fn test_small_file_stays_single_chunk() {
        let plan = chunker().plan("a.ts", "const x = 1;\n", None, 8000);
        assert_eq!(plan.chunks.len(), 1);
        assert_eq!(plan.strategy, ChunkStrategy::BoundaryAware);
    }

    #[test]
    fn test_large_file_is_split_at_boundaries() {
        let content = big_ts_file(80);
        let plan = chunker().plan("big.ts", &content, None, 300);

        assert!(plan.chunks.len() >= 2);
        assert_eq!(plan.strategy, ChunkStrategy::BoundaryAware);
        // Chunk ranges partition the file
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(plan.chunks[0].start_line, 1);
        assert_eq!(plan.chunks.last().unwrap().end_line, lines.len());
        for pair in plan.chunks.windows(2) {
            assert_eq!(pair[1].start_line, pair[0].end_line + 1);
        }
    }

    #[test]
    fn test_round_trip_reconstruction() {
        let content = big_ts_file(40);
        let plan = chunker().plan("big.ts", &content, None, 300);

        let lines: Vec<&str> = content.lines().collect();
        let rebuilt: Vec<String> = plan
            .chunks
            .iter()
            .map(|c| lines[c.start_line - 1..c.end_line].join("\n"))
            .collect();
        assert_eq!(rebuilt.join("\n"), lines.join("\n"));
    }

    #[test]
    fn test_overlap_extends_content_without_shifting_ranges() {
        let content = big_ts_file(80);
        let chunker = BoundaryChunker::with_config(
            Arc::new(TokenEstimator::new()),
            ChunkerConfig {
                min_chunk_tokens: 10,
                overlap_lines: 2,
                ..ChunkerConfig::default()
            },
        )
        .unwrap();
        let plan = chunker.plan("big.ts", &content, None, 300);
        assert!(plan.chunks.len() >= 2);

        // Ranges still partition the file exactly
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(plan.chunks[0].start_line, 1);
        for pair in plan.chunks.windows(2) {
            assert_eq!(pair[1].start_line, pair[0].end_line + 1);
        }
        assert_eq!(plan.chunks.last().unwrap().end_line, lines.len());

        // Later chunks carry the overlap window in content only
        for chunk in &plan.chunks[1..] {
            let window_start = chunk.start_line.saturating_sub(2).max(1);
            let expected = lines[window_start - 1..chunk.end_line].join("\n");
            assert_eq!(chunk.content, expected);
        }

        // Dropping the overlap reconstructs the original file
        let rebuilt: Vec<String> = plan
            .chunks
            .iter()
            .map(|c| lines[c.start_line - 1..c.end_line].join("\n"))
            .collect();
        assert_eq!(rebuilt.join("\n"), lines.join("\n"));
    }

    #[test]
    fn test_chunks_respect_target_except_indivisible() {
        let content = big_ts_file(60);
        let plan = chunker().plan("big.ts", &content, None, 400);

        for chunk in &plan.chunks {
            // An oversized chunk must be a single indivisible unit, which
            // for this input never happens at a 400-token target
            assert!(
                chunk.estimated_tokens <= 400,
                "chunk {} holds {} tokens",
                chunk.index,
                chunk.estimated_tokens
            );
        }
    }

    #[test]
    fn test_indivisible_unit_becomes_oversized_chunk() {
        let mut content = String::from("export function giant() {\n");
        for i in 0..400 {
            content.push_str(&format!("    const row{i} = compute({i}) + \"padding\";\n"));
        }
        content.push_str("}\n");

        let plan = chunker().plan("giant.ts", &content, None, 100);
        assert_eq!(plan.chunks.len(), 1);
        assert!(plan.chunks[0].estimated_tokens > 100);
    }

    #[test]
    fn test_imports_duplicated_into_later_chunks() {
        let content = big_ts_file(80);
        let chunker = BoundaryChunker::new(Arc::new(TokenEstimator::new()));
        let plan = chunker.plan("big.ts", &content, None, 300);

        assert!(plan.chunks.len() >= 2);
        assert!(plan.chunks[0].context_lines.is_empty());
        assert!(
            plan.chunks[1]
                .context_lines
                .iter()
                .any(|l| l.contains("import"))
        );
    }

    #[test]
    fn test_outline_entries_outrank_guesses() {
        let content = "line one\nline two\nline three\nline four\n".repeat(200);
        let outline = StructuralOutline {
            items: vec![
                OutlineItem {
                    line: 401,
                    kind: OutlineKind::Function,
                    name: Some("mid".to_string()),
                },
                OutlineItem {
                    line: 9999,
                    kind: OutlineKind::Function,
                    name: None,
                },
            ],
        };
        let plan = chunker().plan("odd.xyz", &content, Some(&outline), 500);

        // The out-of-range entry degrades to a warning, not a failure
        assert!(plan.warnings.iter().any(|w| w.contains("out of range")));
        assert!(plan.chunks.iter().any(|c| c.start_line == 401));
    }

    #[test]
    fn test_unknown_language_falls_back_to_simple_split() {
        let content = "data ".repeat(5000);
        let plan = chunker().plan("blob.xyz", &content, None, 300);

        assert_eq!(plan.strategy, ChunkStrategy::SimpleSplit);
        assert!(plan.chunks.iter().all(|c| c.kind == ChunkKind::Fallback));
    }

    #[test]
    fn test_empty_content() {
        let plan = chunker().plan("empty.ts", "", None, 100);
        assert!(plan.chunks.is_empty());
        assert!(!plan.warnings.is_empty());
    }
}
