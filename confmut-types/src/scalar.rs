use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed leaf value of a configuration document.
///
/// Serialized untagged, so a `Scalar` reads and writes as the plain
/// JSON/TOML value it wraps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Integer(i64),
    /// Integer above `i64::MAX`, kept exact.
    Unsigned(u64),
    Float(f64),
    String(String),
}

impl Scalar {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Scalar::Null => TypeTag::Null,
            Scalar::Bool(_) => TypeTag::Boolean,
            Scalar::Integer(_) | Scalar::Unsigned(_) => TypeTag::Integer,
            Scalar::Float(_) => TypeTag::Float,
            Scalar::String(_) => TypeTag::String,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => f.write_str("null"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Integer(i) => write!(f, "{i}"),
            Scalar::Unsigned(u) => write!(f, "{u}"),
            Scalar::Float(x) => write!(f, "{x:?}"),
            Scalar::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<u64> for Scalar {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(i) => Scalar::Integer(i),
            Err(_) => Scalar::Unsigned(value),
        }
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

/// Type tag used to dispatch mutation.
///
/// `Enum` never comes from a value; it is the tag of a leaf whose boundary
/// is an explicit candidate set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    Integer,
    Float,
    String,
    Boolean,
    Null,
    Enum,
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TypeTag::Integer => "integer",
            TypeTag::Float => "float",
            TypeTag::String => "string",
            TypeTag::Boolean => "boolean",
            TypeTag::Null => "null",
            TypeTag::Enum => "enum",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untagged_scalars_read_plain_json() {
        let values: Vec<Scalar> =
            serde_json::from_str(r#"[null, true, 3, 18446744073709551615, 2.5, "x"]"#)
                .expect("parse");
        assert_eq!(
            values,
            vec![
                Scalar::Null,
                Scalar::Bool(true),
                Scalar::Integer(3),
                Scalar::Unsigned(u64::MAX),
                Scalar::Float(2.5),
                Scalar::String("x".to_string()),
            ]
        );
    }

    #[test]
    fn type_tags_follow_variant() {
        assert_eq!(Scalar::Integer(1).type_tag(), TypeTag::Integer);
        assert_eq!(Scalar::Float(1.0).type_tag(), TypeTag::Float);
        assert_eq!(Scalar::from("a").type_tag(), TypeTag::String);
        assert_eq!(Scalar::Bool(false).type_tag(), TypeTag::Boolean);
        assert_eq!(Scalar::Null.type_tag(), TypeTag::Null);
        assert_eq!(Scalar::Unsigned(u64::MAX).type_tag(), TypeTag::Integer);
    }

    #[test]
    fn from_u64_prefers_signed_when_it_fits() {
        assert_eq!(Scalar::from(7u64), Scalar::Integer(7));
        assert_eq!(Scalar::from(u64::MAX), Scalar::Unsigned(u64::MAX));
        assert_eq!(Scalar::from(u64::MAX).to_string(), "18446744073709551615");
    }

    #[test]
    fn display_quotes_strings_only() {
        assert_eq!(Scalar::from("strict").to_string(), "\"strict\"");
        assert_eq!(Scalar::Integer(30).to_string(), "30");
        assert_eq!(Scalar::Float(1.0).to_string(), "1.0");
    }
}
