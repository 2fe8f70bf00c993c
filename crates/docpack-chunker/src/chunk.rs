//! Chunk models

use serde::{Deserialize, Serialize};

/// What a chunk mostly contains, derived from the boundary that opened it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChunkKind {
    FunctionFocused,
    ClassFocused,
    ModuleFocused,
    Mixed,
    /// Trailing content after the last recognized boundary
    Remainder,
    /// Produced by the simple-split fallback
    Fallback,
}

/// A contiguous, token-bounded slice of one oversized file
///
/// `start_line`/`end_line` partition the file exactly: every source line
/// belongs to exactly one chunk's range. `content` may additionally carry
/// the configured overlap lines before `start_line`, and
/// `context_lines` the duplicated leading imports; both exist purely to
/// preserve context and are not semantic duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// 1-based position in the chunk sequence
    pub index: usize,
    /// 1-based inclusive line range
    pub start_line: usize,
    pub end_line: usize,
    pub estimated_tokens: usize,
    pub content: String,
    /// Import/dependency lines duplicated from the file head
    #[serde(default)]
    pub context_lines: Vec<String>,
    pub kind: ChunkKind,
}

impl Chunk {
    /// Full text handed to the processing unit: duplicated imports first,
    /// then the (possibly overlap-extended) content.
    pub fn text(&self) -> String {
        if self.context_lines.is_empty() {
            self.content.clone()
        } else {
            format!("{}\n{}", self.context_lines.join("\n"), self.content)
        }
    }

    pub fn line_count(&self) -> usize {
        self.end_line - self.start_line + 1
    }
}

/// Structural outline supplied by an external collaborator
///
/// Entries are precise function/class start lines and outrank
/// pattern-matched boundary guesses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructuralOutline {
    pub items: Vec<OutlineItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlineItem {
    /// 1-based start line of the declaration
    pub line: usize,
    pub kind: OutlineKind,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlineKind {
    Function,
    Class,
    Interface,
    Type,
}
