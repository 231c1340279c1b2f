//! Ordered content rule tables.
//!
//! Each table is a list of named regexes. Tables are compiled once
//! when a validator is built; scoring counts how many distinct rules match,
//! so one rule matching many times is still a single hit.

use regex::Regex;

use crate::error::ValidateError;

/// A named regex.
#[derive(Debug, Clone, Copy)]
pub struct ContentRule {
    /// Rule name, used in reasons.
    pub name: &'static str,
    /// Regex source.
    pub pattern: &'static str,
}

/// Junk heuristics, in scoring order.
pub static JUNK_RULES: &[ContentRule] = &[
    ContentRule {
        name: "lorem-ipsum",
        pattern: r"(?i)\blorem\s+ipsum\b",
    },
    ContentRule {
        name: "insert-here",
        pattern: r"(?i)<\s*insert\b[^>]*>|\[\s*insert\b[^\]]*\]|\byour\s+(code|content|text)\s+here\b",
    },
    ContentRule {
        name: "fill-marker",
        pattern: r"(?i)\b(todo|fixme)\s*:?\s*(fill|implement|replace)\s+(this|me|in)\b",
    },
    ContentRule {
        name: "encoded-blob",
        pattern: r"[A-Za-z0-9+/=]{200,}",
    },
    ContentRule {
        name: "repeated-punctuation",
        pattern: r"(?m)^[ \t]*(?:(?:[^\s/#*]|/[^/*])[^\n]*?)?(?:!{20,}|\?{20,}|\.{20,}|,{20,}|;{20,}|:{20,}|\*{20,}|#{20,}|~{20,}|\^{20,}|_{20,}|-{20,}|={20,}|\+{20,}|/{20,}|\\{20,}|\|{20,})",
    },
];

/// Code-shape heuristics.
pub static CODE_SHAPE_RULES: &[ContentRule] = &[
    ContentRule {
        name: "module-syntax",
        pattern: r"(?m)^\s*(import\s.+\sfrom\s|import\s+['\x22]|export\s+(default|const|let|function|class|interface|type)\b)",
    },
    ContentRule {
        name: "function-declaration",
        pattern: r"\bfunction\s+[A-Za-z_$][\w$]*\s*\(",
    },
    ContentRule {
        name: "arrow-body",
        pattern: r"=>\s*\{",
    },
    ContentRule {
        name: "binding",
        pattern: r"(?m)^\s*(const|let|var)\s+[A-Za-z_$][\w$]*\s*[:=]",
    },
    ContentRule {
        name: "class-declaration",
        pattern: r"(?m)^\s*(export\s+)?(default\s+)?class\s+[A-Z]\w*",
    },
    ContentRule {
        name: "statement-terminator",
        pattern: r"(?m);[ \t]*$",
    },
];

/// A compiled rule table.
#[derive(Debug, Clone)]
pub struct CompiledRules {
    rules: Vec<(&'static ContentRule, Regex)>,
}

impl CompiledRules {
    /// Compiles every rule in `table`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidateError::Rule`] naming the first rule that doesn't compile.
    pub fn compile(table: &'static [ContentRule]) -> Result<Self, ValidateError> {
        let rules = table
            .iter()
            .map(|rule| {
                Regex::new(rule.pattern)
                    .map(|regex| (rule, regex))
                    .map_err(|source| ValidateError::Rule {
                        name: rule.name,
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Returns the rules matching `text`, in table order.
    #[must_use]
    pub fn hits(&self, text: &str) -> Vec<&'static ContentRule> {
        self.rules
            .iter()
            .filter(|(_, regex)| regex.is_match(text))
            .map(|(rule, _)| *rule)
            .collect()
    }
}

/// Joins rule names for a reason string.
pub(crate) fn rule_names(hits: &[&ContentRule]) -> String {
    hits.iter().map(|rule| rule.name).collect::<Vec<_>>().join(", ")
}
