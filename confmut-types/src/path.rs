use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One step from a container to a child node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Address of a scalar node inside a document.
///
/// Rendered as `servers[0].port`; keys that are empty or contain `.`, `[`,
/// `]`, `"` or `\` are rendered quoted, e.g. `["a.b"].c`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct LeafPath {
    segments: Vec<PathSegment>,
}

impl LeafPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    pub fn child_key(&self, key: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::Key(key.into()));
        next
    }

    pub fn child_index(&self, index: usize) -> Self {
        let mut next = self.clone();
        next.segments.push(PathSegment::Index(index));
        next
    }
}

fn needs_quoting(key: &str) -> bool {
    key.is_empty()
        || key == "$"
        || key
            .chars()
            .any(|c| matches!(c, '.' | '[' | ']' | '"' | '\\') || c.is_whitespace())
}

impl fmt::Display for LeafPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("$");
        }
        for (i, seg) in self.segments.iter().enumerate() {
            match seg {
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
                PathSegment::Key(key) if needs_quoting(key) => {
                    f.write_str("[\"")?;
                    for c in key.chars() {
                        if c == '"' || c == '\\' {
                            f.write_str("\\")?;
                        }
                        write!(f, "{c}")?;
                    }
                    f.write_str("\"]")?;
                }
                PathSegment::Key(key) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(key)?;
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid leaf path '{input}' at byte {offset}: {message}")]
pub struct PathParseError {
    pub input: String,
    pub offset: usize,
    pub message: String,
}

impl FromStr for LeafPath {
    type Err = PathParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let err = |offset: usize, message: &str| PathParseError {
            input: input.to_string(),
            offset,
            message: message.to_string(),
        };

        if input == "$" {
            return Ok(LeafPath::root());
        }

        let chars: Vec<(usize, char)> = input.char_indices().collect();
        let mut segments = Vec::new();
        let mut i = 0;

        while i < chars.len() {
            let (offset, c) = chars[i];
            match c {
                '[' => {
                    i += 1;
                    match chars.get(i) {
                        Some((_, '"')) => {
                            i += 1;
                            let mut key = String::new();
                            loop {
                                match chars.get(i) {
                                    Some((_, '\\')) => {
                                        let (o, escaped) = *chars
                                            .get(i + 1)
                                            .ok_or_else(|| err(offset, "dangling escape"))?;
                                        if escaped != '"' && escaped != '\\' {
                                            return Err(err(o, "unknown escape"));
                                        }
                                        key.push(escaped);
                                        i += 2;
                                    }
                                    Some((_, '"')) => {
                                        i += 1;
                                        break;
                                    }
                                    Some((_, ch)) => {
                                        key.push(*ch);
                                        i += 1;
                                    }
                                    None => return Err(err(offset, "unterminated quoted key")),
                                }
                            }
                            match chars.get(i) {
                                Some((_, ']')) => i += 1,
                                _ => return Err(err(offset, "expected ']' after quoted key")),
                            }
                            segments.push(PathSegment::Key(key));
                        }
                        _ => {
                            let start = i;
                            while let Some((_, ch)) = chars.get(i) {
                                if *ch == ']' {
                                    break;
                                }
                                i += 1;
                            }
                            if chars.get(i).is_none() {
                                return Err(err(offset, "unterminated index"));
                            }
                            let digits: String = chars[start..i].iter().map(|(_, ch)| ch).collect();
                            let index = digits
                                .parse::<usize>()
                                .map_err(|_| err(offset, "index must be a non-negative integer"))?;
                            segments.push(PathSegment::Index(index));
                            i += 1;
                        }
                    }
                }
                '.' if !segments.is_empty() => {
                    i += 1;
                    let key = read_bare(&chars, &mut i);
                    if key.is_empty() {
                        return Err(err(offset, "empty key after '.'"));
                    }
                    segments.push(PathSegment::Key(key));
                }
                _ if segments.is_empty() && i == 0 => {
                    let key = read_bare(&chars, &mut i);
                    if key.is_empty() {
                        return Err(err(offset, "empty key"));
                    }
                    segments.push(PathSegment::Key(key));
                }
                _ => return Err(err(offset, "unexpected character")),
            }
        }

        Ok(LeafPath { segments })
    }
}

fn read_bare(chars: &[(usize, char)], i: &mut usize) -> String {
    let mut key = String::new();
    while let Some((_, ch)) = chars.get(*i) {
        if *ch == '.' || *ch == '[' {
            break;
        }
        key.push(*ch);
        *i += 1;
    }
    key
}

impl From<LeafPath> for String {
    fn from(path: LeafPath) -> Self {
        path.to_string()
    }
}

impl TryFrom<String> for LeafPath {
    type Error = PathParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
