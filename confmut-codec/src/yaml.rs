use crate::{CodecError, Format};
use confmut_doc::{ConfigDocument, Mapping, Node};
use confmut_types::Scalar;
use serde_yaml::Value;

pub(crate) fn parse(text: &str) -> Result<ConfigDocument, CodecError> {
    let value: Value = serde_yaml::from_str(text).map_err(|e| CodecError::parse(Format::Yaml, e))?;
    Ok(ConfigDocument::new(from_value(value)?))
}

fn from_value(value: Value) -> Result<Node, CodecError> {
    Ok(match value {
        Value::Null => Node::null(),
        Value::Bool(b) => Node::scalar(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Node::scalar(i)
            } else if let Some(u) = n.as_u64() {
                Node::scalar(u)
            } else {
                Node::scalar(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => Node::scalar(s),
        Value::Sequence(items) => Node::Sequence(
            items
                .into_iter()
                .map(|v| from_value(v).map(std::sync::Arc::new))
                .collect::<Result<_, _>>()?,
        ),
        Value::Mapping(map) => {
            let mut mapping = Mapping::new();
            for (k, v) in map {
                mapping.insert(key_string(k)?, from_value(v)?);
            }
            Node::Mapping(mapping)
        }
        Value::Tagged(tagged) => from_value(tagged.value)?,
    })
}

fn key_string(key: Value) -> Result<String, CodecError> {
    match key {
        Value::String(s) => Ok(s),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok("null".to_string()),
        Value::Tagged(tagged) => key_string(tagged.value),
        other => Err(CodecError::parse(
            Format::Yaml,
            format!("unsupported complex mapping key: {other:?}"),
        )),
    }
}

pub(crate) fn encode(doc: &ConfigDocument) -> Result<String, CodecError> {
    serde_yaml::to_string(&to_value(doc.root())).map_err(|e| CodecError::serialization(Format::Yaml, e))
}

fn to_value(node: &Node) -> Value {
    match node {
        Node::Scalar(s) => match s {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Integer(i) => Value::Number((*i).into()),
            Scalar::Unsigned(u) => Value::Number((*u).into()),
            Scalar::Float(f) => Value::Number((*f).into()),
            Scalar::String(s) => Value::String(s.clone()),
        },
        Node::Sequence(items) => Value::Sequence(items.iter().map(|item| to_value(item)).collect()),
        Node::Mapping(mapping) => {
            let mut map = serde_yaml::Mapping::new();
            for (k, v) in mapping.iter() {
                map.insert(Value::String(k.to_string()), to_value(v));
            }
            Value::Mapping(map)
        }
    }
}
