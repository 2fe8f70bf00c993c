//! Boundary detection
//!
//! Per-language boundary rules are tables of (pattern, kind, priority), not
//! branching code: adding a language is a data change. A boundary is a line
//! where cutting the file does not break a syntactic unit in half.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use docpack_core::Language;

/// Kind of declaration a boundary sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryKind {
    Function,
    Class,
    Interface,
    Type,
    Module,
    Comment,
    Other,
}

/// A candidate cut line, produced transiently during chunk planning
#[derive(Debug, Clone)]
pub struct BoundaryCandidate {
    /// 1-based line number of the declaration start
    pub line_number: usize,
    pub kind: BoundaryKind,
    pub indent_level: usize,
    /// Higher wins when several candidates fall on the same line
    pub priority: i32,
}

/// One pattern rule in a language's boundary table
struct BoundaryRule {
    pattern: &'static str,
    kind: BoundaryKind,
    priority: i32,
}

const TS_RULES: &[BoundaryRule] = &[
    BoundaryRule {
        pattern: r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\b",
        kind: BoundaryKind::Function,
        priority: 10,
    },
    BoundaryRule {
        pattern: r"^\s*(?:export\s+)?(?:abstract\s+)?class\b",
        kind: BoundaryKind::Class,
        priority: 10,
    },
    BoundaryRule {
        pattern: r"^\s*(?:export\s+)?interface\b",
        kind: BoundaryKind::Interface,
        priority: 9,
    },
    BoundaryRule {
        pattern: r"^\s*(?:export\s+)?type\s+\w+\s*=",
        kind: BoundaryKind::Type,
        priority: 8,
    },
    BoundaryRule {
        pattern: r"^\s*(?:import|export)\b",
        kind: BoundaryKind::Module,
        priority: 7,
    },
    BoundaryRule {
        pattern: r"^\s*(?://|/\*)",
        kind: BoundaryKind::Comment,
        priority: 5,
    },
];

const PYTHON_RULES: &[BoundaryRule] = &[
    BoundaryRule {
        pattern: r"^\s*(?:async\s+)?def\b",
        kind: BoundaryKind::Function,
        priority: 10,
    },
    BoundaryRule {
        pattern: r"^\s*class\b",
        kind: BoundaryKind::Class,
        priority: 10,
    },
    BoundaryRule {
        pattern: r"^\s*@\w+",
        kind: BoundaryKind::Function,
        priority: 9,
    },
    BoundaryRule {
        pattern: r"^\s*(?:import|from)\b",
        kind: BoundaryKind::Module,
        priority: 7,
    },
    BoundaryRule {
        pattern: r"^\s*#",
        kind: BoundaryKind::Comment,
        priority: 5,
    },
];

const RUST_RULES: &[BoundaryRule] = &[
    BoundaryRule {
        pattern: r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:unsafe\s+)?fn\b",
        kind: BoundaryKind::Function,
        priority: 10,
    },
    BoundaryRule {
        pattern: r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:struct|enum)\b",
        kind: BoundaryKind::Class,
        priority: 10,
    },
    BoundaryRule {
        pattern: r"^\s*(?:pub(?:\([^)]*\))?\s+)?trait\b",
        kind: BoundaryKind::Interface,
        priority: 9,
    },
    BoundaryRule {
        pattern: r"^\s*impl\b",
        kind: BoundaryKind::Class,
        priority: 9,
    },
    BoundaryRule {
        pattern: r"^\s*(?:pub(?:\([^)]*\))?\s+)?type\b",
        kind: BoundaryKind::Type,
        priority: 8,
    },
    BoundaryRule {
        pattern: r"^\s*(?:use|mod)\b",
        kind: BoundaryKind::Module,
        priority: 7,
    },
    BoundaryRule {
        pattern: r"^\s*(?://|/\*)",
        kind: BoundaryKind::Comment,
        priority: 5,
    },
];

const GO_RULES: &[BoundaryRule] = &[
    BoundaryRule {
        pattern: r"^func\b",
        kind: BoundaryKind::Function,
        priority: 10,
    },
    BoundaryRule {
        pattern: r"^type\s+\w+\s+struct\b",
        kind: BoundaryKind::Class,
        priority: 9,
    },
    BoundaryRule {
        pattern: r"^type\s+\w+\s+interface\b",
        kind: BoundaryKind::Interface,
        priority: 9,
    },
    BoundaryRule {
        pattern: r"^(?:package|import)\b",
        kind: BoundaryKind::Module,
        priority: 7,
    },
    BoundaryRule {
        pattern: r"^\s*(?://|/\*)",
        kind: BoundaryKind::Comment,
        priority: 5,
    },
];

const JAVA_RULES: &[BoundaryRule] = &[
    BoundaryRule {
        pattern: r"^\s*(?:public\s+|private\s+|protected\s+)?(?:abstract\s+|final\s+)?class\b",
        kind: BoundaryKind::Class,
        priority: 10,
    },
    BoundaryRule {
        pattern: r"^\s*(?:public\s+)?interface\b",
        kind: BoundaryKind::Interface,
        priority: 9,
    },
    BoundaryRule {
        pattern: r"^\s*(?:public\s+)?enum\b",
        kind: BoundaryKind::Type,
        priority: 8,
    },
    BoundaryRule {
        pattern: r"^(?:package|import)\b",
        kind: BoundaryKind::Module,
        priority: 7,
    },
    BoundaryRule {
        pattern: r"^\s*(?://|/\*)",
        kind: BoundaryKind::Comment,
        priority: 5,
    },
];

const MARKDOWN_RULES: &[BoundaryRule] = &[
    BoundaryRule {
        pattern: r"^#{1,6}\s",
        kind: BoundaryKind::Module,
        priority: 9,
    },
    BoundaryRule {
        pattern: r"^---\s*$",
        kind: BoundaryKind::Other,
        priority: 6,
    },
];

static COMPILED: LazyLock<HashMap<Language, Vec<(Regex, BoundaryKind, i32)>>> =
    LazyLock::new(|| {
        let tables: [(Language, &[BoundaryRule]); 7] = [
            (Language::TypeScript, TS_RULES),
            (Language::JavaScript, TS_RULES),
            (Language::Python, PYTHON_RULES),
            (Language::Rust, RUST_RULES),
            (Language::Go, GO_RULES),
            (Language::Java, JAVA_RULES),
            (Language::Markdown, MARKDOWN_RULES),
        ];
        tables
            .into_iter()
            .map(|(lang, rules)| {
                let compiled = rules
                    .iter()
                    .map(|r| (Regex::new(r.pattern).unwrap(), r.kind, r.priority))
                    .collect();
                (lang, compiled)
            })
            .collect()
    });

/// Whether boundary rules exist for a language. Without rules the planner
/// degrades to the simple-split strategy.
pub fn has_rules(language: Language) -> bool {
    COMPILED.contains_key(&language)
}

/// Scan the file line by line and collect boundary candidates
///
/// For brace languages a candidate is only safe at brace depth zero, which
/// also keeps cuts out of open control-flow constructs. Python candidates
/// must sit at top-level indentation and outside open brackets.
pub fn scan(content: &str, language: Language) -> Vec<BoundaryCandidate> {
    let Some(rules) = COMPILED.get(&language) else {
        return Vec::new();
    };

    let brace_scoped = !matches!(language, Language::Python | Language::Markdown);
    let mut candidates = Vec::new();
    let mut depth: i64 = 0;

    for (idx, line) in content.lines().enumerate() {
        let line_number = idx + 1;
        let safe = if brace_scoped {
            depth == 0
        } else {
            depth == 0 && indent_of(line) == 0
        };

        if safe {
            let mut best: Option<(BoundaryKind, i32)> = None;
            for (regex, kind, priority) in rules {
                if regex.is_match(line) && best.is_none_or(|(_, p)| *priority > p) {
                    best = Some((*kind, *priority));
                }
            }
            if let Some((kind, priority)) = best {
                candidates.push(BoundaryCandidate {
                    line_number,
                    kind,
                    indent_level: indent_of(line),
                    priority,
                });
            }
        }

        depth += bracket_delta(line, brace_scoped);
        depth = depth.max(0);
    }

    candidates
}

fn indent_of(line: &str) -> usize {
    let mut indent = 0;
    for c in line.chars() {
        match c {
            ' ' => indent += 1,
            '\t' => indent += 4,
            _ => break,
        }
    }
    indent
}

/// Net open/close bracket count on a line, ignoring brackets inside quotes
///
/// A quote only opens a string when it closes on the same line; a lone
/// apostrophe (a lifetime, prose) stays plain text instead of swallowing
/// the rest of the line.
fn bracket_delta(line: &str, braces: bool) -> i64 {
    let mut delta = 0i64;
    let mut in_string: Option<char> = None;
    let mut prev = '\0';

    for (i, c) in line.char_indices() {
        if let Some(quote) = in_string {
            if c == quote && prev != '\\' {
                in_string = None;
            }
        } else {
            match c {
                '"' | '\'' | '`' => {
                    if line[i + c.len_utf8()..].contains(c) {
                        in_string = Some(c);
                    }
                }
                '{' if braces => delta += 1,
                '}' if braces => delta -= 1,
                '(' | '[' if !braces => delta += 1,
                ')' | ']' if !braces => delta -= 1,
                _ => {}
            }
        }
        prev = c;
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    const TS_SAMPLE: &str = "\
import { a } from './a';

export function first() {
    if (a) {
        return 1;
    }
    return 0;
}

export class Widget {
    render() {}
}
";

    #[test]
    fn test_scan_finds_top_level_declarations() {
        let candidates = scan(TS_SAMPLE, Language::TypeScript);
        let lines: Vec<usize> = candidates.iter().map(|c| c.line_number).collect();
        assert!(lines.contains(&1)); // import
        assert!(lines.contains(&3)); // function
        assert!(lines.contains(&10)); // class
    }

    #[test]
    fn test_no_candidate_inside_open_braces() {
        let candidates = scan(TS_SAMPLE, Language::TypeScript);
        // `return 1;` sits inside the if block; `render()` inside the class
        assert!(candidates.iter().all(|c| c.line_number != 5));
        assert!(candidates.iter().all(|c| c.line_number != 11));
    }

    #[test]
    fn test_python_nested_def_is_not_a_candidate() {
        let src = "class A:\n    def method(self):\n        pass\n\ndef top():\n    pass\n";
        let candidates = scan(src, Language::Python);
        let lines: Vec<usize> = candidates.iter().map(|c| c.line_number).collect();
        assert!(lines.contains(&1));
        assert!(lines.contains(&5));
        assert!(!lines.contains(&2));
    }

    #[test]
    fn test_braces_in_strings_ignored() {
        let src = "const s = \"{\";\nfunction f() {}\n";
        let candidates = scan(src, Language::JavaScript);
        assert!(candidates.iter().any(|c| c.line_number == 2));
    }

    #[test]
    fn test_lifetime_apostrophe_does_not_swallow_braces() {
        let src = "fn f<'a>() {\n    use std::fmt;\n    1;\n}\n\nfn g() {}\n";
        let candidates = scan(src, Language::Rust);
        let lines: Vec<usize> = candidates.iter().map(|c| c.line_number).collect();
        // The body line is inside the open brace, never a candidate
        assert!(!lines.contains(&2));
        assert!(lines.contains(&1));
        assert!(lines.contains(&6));
    }

    #[test]
    fn test_paired_lifetimes_keep_depth_in_sync() {
        let src = "fn f<'a>(x: &'a str) -> &'a str {\n    x\n}\n\nfn g() {\n    1;\n}\n";
        let candidates = scan(src, Language::Rust);
        let lines: Vec<usize> = candidates.iter().map(|c| c.line_number).collect();
        assert!(lines.contains(&1));
        assert!(lines.contains(&5));
        assert!(!lines.contains(&6));
    }

    #[test]
    fn test_unknown_language_has_no_rules() {
        assert!(!has_rules(Language::Generic));
        assert!(scan("anything", Language::Generic).is_empty());
    }
}
