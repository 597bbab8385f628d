//! Boundary declarations: the legal range or candidate set for a leaf.

use crate::path::LeafPath;
use crate::pattern::PatternCache;
use crate::scalar::{Scalar, TypeTag};
use serde::{Deserialize, Serialize};

/// Legal mutation range or candidate set for one leaf.
///
/// A closed set of variants; each one is sampled by its own strategy in
/// `confmut-mutate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Boundary {
    Integer {
        min: i64,
        max: i64,
    },
    Float {
        min: f64,
        max: f64,
    },
    /// Strings. Non-empty `candidates` restrict output to that set; otherwise
    /// a length/charset rule generates values when any rule field is set;
    /// otherwise structural corruption strategies are used.
    String {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        candidates: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_len: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_len: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        charset: Option<String>,
    },
    Boolean,
    Enum {
        values: Vec<Scalar>,
    },
    /// Replacement for null leaves.
    Sentinel {
        value: Scalar,
    },
}

impl Boundary {
    /// Unconstrained string boundary (corruption strategies only).
    pub fn any_string() -> Self {
        Boundary::String {
            candidates: Vec::new(),
            min_len: None,
            max_len: None,
            charset: None,
        }
    }

    /// The type tag a mutated value carries under this boundary.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Boundary::Integer { .. } => TypeTag::Integer,
            Boundary::Float { .. } => TypeTag::Float,
            Boundary::String { .. } => TypeTag::String,
            Boundary::Boolean => TypeTag::Boolean,
            Boundary::Enum { .. } => TypeTag::Enum,
            Boundary::Sentinel { value } => value.type_tag(),
        }
    }

    /// Whether a leaf holding `value` may be mutated under this boundary.
    pub fn accepts(&self, value: &Scalar) -> bool {
        match self {
            Boundary::Integer { .. } => matches!(value, Scalar::Integer(_) | Scalar::Unsigned(_)),
            Boundary::Float { .. } => matches!(value, Scalar::Float(_)),
            Boundary::String { .. } => matches!(value, Scalar::String(_)),
            Boundary::Boolean => matches!(value, Scalar::Bool(_)),
            Boundary::Enum { .. } => true,
            Boundary::Sentinel { .. } => value.is_null(),
        }
    }

    /// Whether `value` lies inside this boundary.
    pub fn contains(&self, value: &Scalar) -> bool {
        match (self, value) {
            (Boundary::Integer { min, max }, Scalar::Integer(v)) => min <= v && v <= max,
            (Boundary::Float { min, max }, Scalar::Float(v)) => *min <= *v && *v <= *max,
            (
                Boundary::String {
                    candidates,
                    min_len,
                    max_len,
                    charset,
                },
                Scalar::String(s),
            ) => {
                if !candidates.is_empty() {
                    return candidates.iter().any(|c| c == s);
                }
                let len = s.chars().count();
                min_len.is_none_or(|m| len >= m)
                    && max_len.is_none_or(|m| len <= m)
                    && charset
                        .as_ref()
                        .is_none_or(|cs| s.chars().all(|c| cs.contains(c)))
            }
            (Boundary::Boolean, Scalar::Bool(_)) => true,
            (Boundary::Enum { values }, v) => values.iter().any(|c| c == v),
            (Boundary::Sentinel { value: sentinel }, v) => sentinel == v,
            _ => false,
        }
    }
}

/// Where the boundary used for a mutation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundarySource {
    Declared,
    Inferred,
}

/// A boundary bound to a leaf path or path pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldBoundary {
    /// Exact leaf path (`db.port`) or glob pattern (`servers[*].port`).
    pub path: String,

    #[serde(flatten)]
    pub boundary: Boundary,
}

/// How boundaries are inferred for leaves with no declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferencePolicy {
    /// Widen numbers to `±|value| * factor`.
    pub factor: f64,
    /// Smallest half-width for inferred integer ranges.
    pub integer_floor: i64,
    /// Absolute ceiling for inferred integer ranges.
    pub integer_ceiling: i64,
    /// Smallest half-width for inferred float ranges.
    pub float_floor: f64,
    /// Absolute ceiling for inferred float ranges.
    pub float_ceiling: f64,
}

impl Default for InferencePolicy {
    fn default() -> Self {
        Self {
            factor: 10.0,
            integer_floor: 10,
            integer_ceiling: 1_000_000_000,
            float_floor: 1.0,
            float_ceiling: 1.0e12,
        }
    }
}

/// Declared boundaries for a document plus the inference fallback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundarySpec {
    #[serde(default)]
    pub fields: Vec<FieldBoundary>,

    #[serde(default)]
    pub inference: InferencePolicy,

    /// Compiled `fields[*].path` patterns, built on the first lookup.
    #[serde(skip)]
    patterns: PatternCache,
}

impl BoundarySpec {
    pub fn new(fields: Vec<FieldBoundary>) -> Self {
        Self {
            fields,
            inference: InferencePolicy::default(),
            patterns: PatternCache::default(),
        }
    }

    pub fn with_inference(mut self, inference: InferencePolicy) -> Self {
        self.inference = inference;
        self
    }

    /// Declared boundary for `path`: an exact match wins, otherwise the first
    /// matching pattern in declaration order.
    pub fn lookup(&self, path: &LeafPath) -> Option<&Boundary> {
        let rendered = path.to_string();
        if let Some(exact) = self.fields.iter().find(|f| f.path == rendered) {
            return Some(&exact.boundary);
        }
        let patterns = self
            .patterns
            .get_or_compile(self.fields.iter().map(|f| f.path.as_str()));
        self.fields
            .iter()
            .zip(patterns)
            .find(|(_, pattern)| pattern.matches(&rendered))
            .map(|(f, _)| &f.boundary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn field(path: &str, boundary: Boundary) -> FieldBoundary {
        FieldBoundary {
            path: path.to_string(),
            boundary,
        }
    }

    #[test]
    fn exact_match_beats_earlier_pattern() {
        let spec = BoundarySpec::new(vec![
            field("servers[*].port", Boundary::Integer { min: 1, max: 10 }),
            field("servers[0].port", Boundary::Integer { min: 100, max: 200 }),
        ]);
        let path: LeafPath = "servers[0].port".parse().unwrap();
        assert_eq!(
            spec.lookup(&path),
            Some(&Boundary::Integer { min: 100, max: 200 })
        );
        let other: LeafPath = "servers[1].port".parse().unwrap();
        assert_eq!(
            spec.lookup(&other),
            Some(&Boundary::Integer { min: 1, max: 10 })
        );
    }

    #[test]
    fn pattern_lookup_is_stable_across_calls_and_clones() {
        let spec = BoundarySpec::new(vec![
            field("db.*", Boundary::Integer { min: 1, max: 5 }),
            field("servers[0].port", Boundary::Boolean),
        ]);
        let pool: LeafPath = "db.pool".parse().unwrap();
        let bracketed: LeafPath = "servers0.port".parse().unwrap();
        for _ in 0..2 {
            assert_eq!(
                spec.lookup(&pool),
                Some(&Boundary::Integer { min: 1, max: 5 })
            );
            assert!(spec.lookup(&bracketed).is_none());
        }
        let copy = spec.clone();
        assert_eq!(copy, BoundarySpec::new(spec.fields.clone()));
        assert!(copy.lookup(&pool).is_some());
    }

    #[test]
    fn lookup_misses_undeclared_leaf() {
        let spec = BoundarySpec::new(vec![field("timeout", Boundary::Boolean)]);
        assert!(spec.lookup(&"retries".parse().unwrap()).is_none());
    }

    #[test]
    fn parses_boundary_table_from_toml() {
        let src = r#"
[[fields]]
path = "timeout"
kind = "integer"
min = 1
max = 5

[[fields]]
path = "mode"
kind = "enum"
values = ["strict", "lenient"]

[[fields]]
path = "ratio"
kind = "float"
min = 0.0
max = 1.0
"#;
        let spec: BoundarySpec = toml::from_str(src).expect("parse");
        assert_eq!(spec.fields.len(), 3);
        assert_eq!(spec.fields[0].boundary, Boundary::Integer { min: 1, max: 5 });
        assert_eq!(
            spec.fields[1].boundary,
            Boundary::Enum {
                values: vec![Scalar::from("strict"), Scalar::from("lenient")]
            }
        );
        assert_eq!(spec.inference, InferencePolicy::default());
    }

    #[test]
    fn contains_respects_kind_and_range() {
        let b = Boundary::Integer { min: 1, max: 5 };
        assert!(b.contains(&Scalar::Integer(3)));
        assert!(!b.contains(&Scalar::Integer(30)));
        assert!(!b.contains(&Scalar::Float(3.0)));

        let s = Boundary::String {
            candidates: vec![],
            min_len: Some(2),
            max_len: Some(3),
            charset: Some("ab".to_string()),
        };
        assert!(s.contains(&Scalar::from("aba")));
        assert!(!s.contains(&Scalar::from("abc")));
        assert!(!s.contains(&Scalar::from("a")));
    }

    #[test]
    fn sentinel_accepts_only_null() {
        let b = Boundary::Sentinel {
            value: Scalar::Integer(0),
        };
        assert!(b.accepts(&Scalar::Null));
        assert!(!b.accepts(&Scalar::Integer(1)));
        assert_eq!(b.type_tag(), TypeTag::Integer);
    }
}
