use crate::{CodecError, Format};
use confmut_doc::{ConfigDocument, Mapping, Node};
use confmut_types::{LeafPath, PathSegment, Scalar};
use std::sync::Arc;
use toml_edit::{Array, ArrayOfTables, DocumentMut, InlineTable, Item, Table, Value};

pub(crate) fn parse(text: &str) -> Result<ConfigDocument, CodecError> {
    let doc: DocumentMut = text.parse().map_err(|e| CodecError::parse(Format::Toml, e))?;
    Ok(ConfigDocument::new(table_node(doc.as_table())))
}

fn table_node(table: &Table) -> Node {
    let mut mapping = Mapping::new();
    for (k, item) in table.iter() {
        match item {
            Item::None => {}
            Item::Value(v) => mapping.insert(k, value_node(v)),
            Item::Table(t) => mapping.insert(k, table_node(t)),
            Item::ArrayOfTables(aot) => mapping.insert(k, Node::sequence(aot.iter().map(table_node))),
        }
    }
    Node::Mapping(mapping)
}

fn value_node(value: &Value) -> Node {
    match value {
        Value::String(s) => Node::scalar(s.value().as_str()),
        Value::Integer(i) => Node::scalar(*i.value()),
        Value::Float(f) => Node::scalar(*f.value()),
        Value::Boolean(b) => Node::scalar(*b.value()),
        // Datetimes have no scalar kind of their own.
        Value::Datetime(dt) => Node::scalar(dt.value().to_string()),
        Value::Array(items) => Node::sequence(items.iter().map(value_node)),
        Value::InlineTable(t) => Node::mapping(t.iter().map(|(k, v)| (k, value_node(v)))),
    }
}

pub(crate) fn encode(doc: &ConfigDocument) -> Result<String, CodecError> {
    let Node::Mapping(root) = doc.root() else {
        return Err(CodecError::serialization(
            Format::Toml,
            "document root must be a table",
        ));
    };
    let table = to_table(root, &LeafPath::root())?;
    Ok(DocumentMut::from(table).to_string())
}

fn to_table(mapping: &Mapping, at: &LeafPath) -> Result<Table, CodecError> {
    let mut table = Table::new();
    for (k, v) in mapping.iter() {
        table.insert(k, to_item(v, &at.child_key(k))?);
    }
    Ok(table)
}

fn to_item(node: &Node, at: &LeafPath) -> Result<Item, CodecError> {
    Ok(match node {
        Node::Scalar(s) => Item::Value(edit_value(s, at)?),
        Node::Mapping(m) => Item::Table(to_table(m, at)?),
        Node::Sequence(items) if is_table_array(items) => {
            let mut aot = ArrayOfTables::new();
            for (i, item) in items.iter().enumerate() {
                if let Node::Mapping(m) = item.as_ref() {
                    aot.push(to_table(m, &at.child_index(i))?);
                }
            }
            Item::ArrayOfTables(aot)
        }
        Node::Sequence(_) => Item::Value(to_inline(node, at)?),
    })
}

fn is_table_array(items: &[Arc<Node>]) -> bool {
    !items.is_empty() && items.iter().all(|i| matches!(i.as_ref(), Node::Mapping(_)))
}

fn to_inline(node: &Node, at: &LeafPath) -> Result<Value, CodecError> {
    Ok(match node {
        Node::Scalar(s) => edit_value(s, at)?,
        Node::Mapping(m) => {
            let mut table = InlineTable::new();
            for (k, v) in m.iter() {
                table.insert(k, to_inline(v, &at.child_key(k))?);
            }
            Value::InlineTable(table)
        }
        Node::Sequence(items) => {
            let mut array = Array::new();
            for (i, item) in items.iter().enumerate() {
                array.push(to_inline(item, &at.child_index(i))?);
            }
            Value::Array(array)
        }
    })
}

fn null_error(at: &LeafPath) -> CodecError {
    CodecError::serialization(Format::Toml, format!("TOML has no null value (at '{at}')"))
}

/// Replace the values at `edits` in `source`, keeping everything else
/// (comments, whitespace, key order) byte-for-byte.
pub(crate) fn patch(source: &str, edits: &[(LeafPath, Scalar)]) -> Result<String, CodecError> {
    let mut doc: DocumentMut = source.parse().map_err(|e| CodecError::parse(Format::Toml, e))?;

    for (path, scalar) in edits {
        let item = resolve_mut(&mut doc, path).ok_or_else(|| {
            CodecError::serialization(Format::Toml, format!("no TOML value at '{path}'"))
        })?;
        let Some(old) = item.as_value() else {
            return Err(CodecError::serialization(
                Format::Toml,
                format!("'{path}' is a table, not a value"),
            ));
        };
        let mut new = edit_value(scalar, path)?;
        *new.decor_mut() = old.decor().clone();
        *item = Item::Value(new);
    }

    Ok(doc.to_string())
}

fn resolve_mut<'a>(doc: &'a mut DocumentMut, path: &LeafPath) -> Option<&'a mut Item> {
    let mut item = doc.as_item_mut();
    for segment in path.segments() {
        item = match segment {
            PathSegment::Key(k) => item.get_mut(k.as_str())?,
            PathSegment::Index(i) => item.get_mut(*i)?,
        };
    }
    Some(item)
}

fn edit_value(scalar: &Scalar, at: &LeafPath) -> Result<Value, CodecError> {
    Ok(match scalar {
        Scalar::Null => return Err(null_error(at)),
        Scalar::Bool(b) => Value::from(*b),
        Scalar::Integer(i) => Value::from(*i),
        Scalar::Unsigned(u) => {
            return Err(CodecError::serialization(
                Format::Toml,
                format!("integer {u} at {at} does not fit a TOML integer"),
            ));
        }
        Scalar::Float(f) => Value::from(*f),
        Scalar::String(s) => Value::from(s.as_str()),
    })
}
