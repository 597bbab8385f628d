use crate::{CodecError, Format};
use confmut_doc::{ConfigDocument, Mapping, Node};
use confmut_types::Scalar;
use serde_json::{Map, Number, Value};

pub(crate) fn parse(text: &str) -> Result<ConfigDocument, CodecError> {
    let value: Value = serde_json::from_str(text).map_err(|e| CodecError::parse(Format::Json, e))?;
    Ok(ConfigDocument::new(from_value(value)))
}

fn from_value(value: Value) -> Node {
    match value {
        Value::Null => Node::null(),
        Value::Bool(b) => Node::scalar(b),
        Value::Number(n) => Node::Scalar(number_to_scalar(&n)),
        Value::String(s) => Node::scalar(s),
        Value::Array(items) => Node::sequence(items.into_iter().map(from_value)),
        Value::Object(map) => {
            let mut mapping = Mapping::new();
            for (k, v) in map {
                mapping.insert(k, from_value(v));
            }
            Node::Mapping(mapping)
        }
    }
}

fn number_to_scalar(n: &Number) -> Scalar {
    if let Some(i) = n.as_i64() {
        Scalar::Integer(i)
    } else if let Some(u) = n.as_u64() {
        Scalar::Unsigned(u)
    } else {
        Scalar::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

pub(crate) fn encode(doc: &ConfigDocument) -> Result<String, CodecError> {
    let value = to_value(doc.root())?;
    let mut out =
        serde_json::to_string_pretty(&value).map_err(|e| CodecError::serialization(Format::Json, e))?;
    out.push('\n');
    Ok(out)
}

fn to_value(node: &Node) -> Result<Value, CodecError> {
    Ok(match node {
        Node::Scalar(s) => match s {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Integer(i) => Value::Number((*i).into()),
            Scalar::Unsigned(u) => Value::Number((*u).into()),
            Scalar::Float(f) => Value::Number(Number::from_f64(*f).ok_or_else(|| {
                CodecError::serialization(Format::Json, format!("non-finite float {f}"))
            })?),
            Scalar::String(s) => Value::String(s.clone()),
        },
        Node::Sequence(items) => Value::Array(
            items
                .iter()
                .map(|item| to_value(item))
                .collect::<Result<_, _>>()?,
        ),
        Node::Mapping(mapping) => {
            let mut map = Map::new();
            for (k, v) in mapping.iter() {
                map.insert(k.to_string(), to_value(v)?);
            }
            Value::Object(map)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn keeps_key_order_and_number_kinds() {
        let doc = parse(r#"{"z": 1, "a": 2.5, "m": [true, null, "x"]}"#).unwrap();
        let leaves: Vec<(String, Scalar)> = doc
            .leaves()
            .map(|(p, v)| (p.to_string(), v.clone()))
            .collect();
        assert_eq!(
            leaves,
            vec![
                ("z".to_string(), Scalar::Integer(1)),
                ("a".to_string(), Scalar::Float(2.5)),
                ("m[0]".to_string(), Scalar::Bool(true)),
                ("m[1]".to_string(), Scalar::Null),
                ("m[2]".to_string(), Scalar::from("x")),
            ]
        );
    }

    #[test]
    fn huge_unsigned_stays_exact() {
        let doc = parse(r#"{"n": 18446744073709551615}"#).unwrap();
        assert_eq!(
            doc.get(&"n".parse().unwrap()),
            Ok(&Scalar::Unsigned(u64::MAX))
        );
    }

    #[test]
    fn huge_unsigned_survives_a_mutation_elsewhere() {
        let doc = parse(r#"{"id": 18446744073709551615, "t": 30}"#).unwrap();
        let doc = doc.update(&"t".parse().unwrap(), Scalar::Integer(2)).unwrap();
        assert_eq!(
            encode(&doc).unwrap(),
            "{\n  \"id\": 18446744073709551615,\n  \"t\": 2\n}\n"
        );
    }

    #[test]
    fn encodes_pretty_with_two_spaces() {
        let doc = parse(r#"{"a":{"b":1}}"#).unwrap();
        assert_eq!(encode(&doc).unwrap(), "{\n  \"a\": {\n    \"b\": 1\n  }\n}\n");
    }

    #[test]
    fn non_finite_float_is_a_serialization_error() {
        let doc = parse(r#"{"a": 1.5}"#).unwrap();
        let doc = doc.update(&"a".parse().unwrap(), Scalar::Float(f64::INFINITY)).unwrap();
        assert!(encode(&doc).unwrap_err().is_serialization());
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(matches!(parse("{"), Err(CodecError::Parse { .. })));
    }
}
