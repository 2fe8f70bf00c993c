//! Per-language estimation profiles
//!
//! Profiles are data, not code: adding a language means adding a table
//! entry. Weights are empirical calibration values, not derived from any
//! real tokenizer, and are preserved as configurable defaults.

use docpack_core::Language;

/// Weight applied to each extracted category when summing token cost
#[derive(Debug, Clone, Copy)]
pub struct CategoryWeights {
    pub comment: f64,
    pub string: f64,
    pub keyword: f64,
    pub symbol: f64,
    pub identifier: f64,
}

/// Estimation profile for one language
#[derive(Debug, Clone, Copy)]
pub struct LanguageProfile {
    pub language: Language,
    pub keywords: &'static [&'static str],
    pub line_comment: Option<&'static str>,
    pub block_comment: Option<(&'static str, &'static str)>,
    /// Average characters per token for the character-ratio estimate
    pub chars_per_token: f64,
    pub weights: CategoryWeights,
}

const DEFAULT_WEIGHTS: CategoryWeights = CategoryWeights {
    comment: 0.8,
    string: 0.9,
    keyword: 1.0,
    symbol: 0.9,
    identifier: 1.3,
};

const TYPESCRIPT_KEYWORDS: &[&str] = &[
    "abstract", "any", "as", "async", "await", "boolean", "break", "case", "catch", "class",
    "const", "continue", "declare", "default", "delete", "do", "else", "enum", "export",
    "extends", "finally", "for", "from", "function", "if", "implements", "import", "in",
    "instanceof", "interface", "let", "new", "null", "number", "of", "private", "protected",
    "public", "readonly", "return", "static", "string", "super", "switch", "this", "throw",
    "try", "type", "typeof", "undefined", "var", "void", "while", "yield",
];

const JAVASCRIPT_KEYWORDS: &[&str] = &[
    "async", "await", "break", "case", "catch", "class", "const", "continue", "default",
    "delete", "do", "else", "export", "extends", "finally", "for", "from", "function", "if",
    "import", "in", "instanceof", "let", "new", "null", "of", "return", "static", "super",
    "switch", "this", "throw", "try", "typeof", "undefined", "var", "void", "while", "yield",
];

const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while",
];

const GO_KEYWORDS: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else", "fallthrough",
    "for", "func", "go", "goto", "if", "import", "interface", "map", "package", "range",
    "return", "select", "struct", "switch", "type", "var",
];

const JAVA_KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class",
    "const", "continue", "default", "do", "double", "else", "enum", "extends", "final",
    "finally", "float", "for", "if", "implements", "import", "instanceof", "int", "interface",
    "long", "native", "new", "package", "private", "protected", "public", "return", "short",
    "static", "super", "switch", "synchronized", "this", "throw", "throws", "try", "void",
    "volatile", "while",
];

static PROFILES: &[LanguageProfile] = &[
    LanguageProfile {
        language: Language::TypeScript,
        keywords: TYPESCRIPT_KEYWORDS,
        line_comment: Some("//"),
        block_comment: Some(("/*", "*/")),
        chars_per_token: 3.5,
        weights: DEFAULT_WEIGHTS,
    },
    LanguageProfile {
        language: Language::JavaScript,
        keywords: JAVASCRIPT_KEYWORDS,
        line_comment: Some("//"),
        block_comment: Some(("/*", "*/")),
        chars_per_token: 3.5,
        weights: DEFAULT_WEIGHTS,
    },
    LanguageProfile {
        language: Language::Python,
        keywords: PYTHON_KEYWORDS,
        line_comment: Some("#"),
        block_comment: Some(("\"\"\"", "\"\"\"")),
        chars_per_token: 3.8,
        weights: CategoryWeights {
            comment: 0.8,
            string: 0.9,
            keyword: 1.0,
            symbol: 0.8,
            identifier: 1.2,
        },
    },
    LanguageProfile {
        language: Language::Rust,
        keywords: RUST_KEYWORDS,
        line_comment: Some("//"),
        block_comment: Some(("/*", "*/")),
        chars_per_token: 3.2,
        weights: CategoryWeights {
            comment: 0.8,
            string: 0.9,
            keyword: 1.0,
            symbol: 1.0,
            identifier: 1.3,
        },
    },
    LanguageProfile {
        language: Language::Go,
        keywords: GO_KEYWORDS,
        line_comment: Some("//"),
        block_comment: Some(("/*", "*/")),
        chars_per_token: 3.4,
        weights: DEFAULT_WEIGHTS,
    },
    LanguageProfile {
        language: Language::Java,
        keywords: JAVA_KEYWORDS,
        line_comment: Some("//"),
        block_comment: Some(("/*", "*/")),
        chars_per_token: 3.4,
        weights: DEFAULT_WEIGHTS,
    },
    LanguageProfile {
        language: Language::Markdown,
        keywords: &[],
        line_comment: None,
        block_comment: Some(("<!--", "-->")),
        chars_per_token: 4.2,
        weights: CategoryWeights {
            comment: 0.7,
            string: 1.0,
            keyword: 1.0,
            symbol: 0.6,
            identifier: 1.1,
        },
    },
    LanguageProfile {
        language: Language::Json,
        keywords: &["true", "false", "null"],
        line_comment: None,
        block_comment: None,
        chars_per_token: 3.0,
        weights: CategoryWeights {
            comment: 0.8,
            string: 0.9,
            keyword: 1.0,
            symbol: 1.1,
            identifier: 1.2,
        },
    },
    LanguageProfile {
        language: Language::Generic,
        keywords: &[],
        line_comment: Some("#"),
        block_comment: None,
        chars_per_token: 4.0,
        weights: CategoryWeights {
            comment: 0.8,
            string: 0.9,
            keyword: 1.0,
            symbol: 0.8,
            identifier: 1.2,
        },
    },
];

/// Look up the profile for a language; `Generic` is always present
pub fn profile_for(language: Language) -> &'static LanguageProfile {
    PROFILES
        .iter()
        .find(|p| p.language == language)
        .unwrap_or(&PROFILES[PROFILES.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_language_has_a_profile() {
        for lang in [
            Language::TypeScript,
            Language::JavaScript,
            Language::Python,
            Language::Rust,
            Language::Go,
            Language::Java,
            Language::Markdown,
            Language::Json,
            Language::Generic,
        ] {
            assert_eq!(profile_for(lang).language, lang);
        }
    }

    #[test]
    fn test_generic_fallback_profile() {
        let profile = profile_for(Language::Generic);
        assert!(profile.keywords.is_empty());
        assert!(profile.chars_per_token > 0.0);
    }
}
