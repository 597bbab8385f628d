//! Leaf-path patterns used by boundary lookup and target filtering.
//!
//! Only `*` and `?` are wildcards. Everything else, including the brackets
//! of index segments, matches literally.

use crate::path::LeafPath;
use glob::{MatchOptions, Pattern};
use std::sync::OnceLock;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// A compiled leaf-path pattern: `*` matches any run of characters
/// (including `.` and `[`), `?` matches exactly one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafPattern {
    raw: String,
    /// `None` when glob rejects the escaped form; the pattern then matches
    /// only its own text.
    compiled: Option<Pattern>,
}

impl LeafPattern {
    pub fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            compiled: Pattern::new(&to_glob(raw)).ok(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, rendered: &str) -> bool {
        match &self.compiled {
            Some(pattern) => pattern.matches_with(rendered, MATCH_OPTIONS),
            None => self.raw == rendered,
        }
    }

    pub fn matches_path(&self, path: &LeafPath) -> bool {
        self.matches(&path.to_string())
    }
}

/// Escape every literal run; runs of `*` collapse to one so glob never sees
/// a recursive `**`.
fn to_glob(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    let mut literal = String::new();
    for c in raw.chars() {
        match c {
            '*' | '?' => {
                out.push_str(&Pattern::escape(&literal));
                literal.clear();
                if !(c == '*' && out.ends_with('*')) {
                    out.push(c);
                }
            }
            _ => literal.push(c),
        }
    }
    out.push_str(&Pattern::escape(&literal));
    out
}

/// Patterns compiled on first use. Never compared or serialized.
#[derive(Debug, Clone, Default)]
pub(crate) struct PatternCache(OnceLock<Vec<LeafPattern>>);

impl PatternCache {
    pub(crate) fn get_or_compile<'a>(
        &self,
        raw: impl Iterator<Item = &'a str>,
    ) -> &[LeafPattern] {
        self.0.get_or_init(|| raw.map(LeafPattern::new).collect())
    }
}

impl PartialEq for PatternCache {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

/// Include/exclude filter over leaf paths.
///
/// An empty include list admits everything; exclude always wins.
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    include: Vec<LeafPattern>,
    exclude: Vec<LeafPattern>,
}

impl PathFilter {
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        Self {
            include: include.iter().map(|p| LeafPattern::new(p)).collect(),
            exclude: exclude.iter().map(|p| LeafPattern::new(p)).collect(),
        }
    }

    pub fn admits(&self, path: &LeafPath) -> bool {
        let rendered = path.to_string();
        if !self.include.is_empty() && !self.include.iter().any(|p| p.matches(&rendered)) {
            return false;
        }
        !self.exclude.iter().any(|p| p.matches(&rendered))
    }
}
