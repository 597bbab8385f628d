//! In-memory configuration document for confmut.
//!
//! A document is a tree of [`Node`]s: mappings, ordered sequences and scalar
//! leaves. Children are held behind `Arc`, so [`ConfigDocument::update`]
//! clones only the nodes on the path to the changed leaf and shares the rest
//! with the original document.

use confmut_types::{LeafPath, PathSegment, Scalar};
use std::sync::Arc;
use thiserror::Error;

mod walk;

pub use walk::Leaves;

/// A leaf path that does not resolve to a scalar in this document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid path '{path}': {reason}")]
pub struct InvalidPathError {
    pub path: LeafPath,
    pub reason: String,
}

impl InvalidPathError {
    fn new(path: &LeafPath, reason: impl Into<String>) -> Self {
        Self {
            path: path.clone(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Mapping,
    Sequence,
    Scalar,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            NodeKind::Mapping => "mapping",
            NodeKind::Sequence => "sequence",
            NodeKind::Scalar => "scalar",
        })
    }
}

/// Mapping node. Keys are unique and keep the order they were inserted in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    entries: Vec<(String, Arc<Node>)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `key`. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, node: Node) {
        let key = key.into();
        let node = Arc::new(node);
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = node,
            None => self.entries.push((key, node)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_ref())
    }

    fn get_arc_mut(&mut self, key: &str) -> Option<&mut Arc<Node>> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (&str, &Node)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Node)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, Node)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (k, v) in iter {
            mapping.insert(k, v);
        }
        mapping
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Mapping(Mapping),
    Sequence(Vec<Arc<Node>>),
    Scalar(Scalar),
}

impl Node {
    pub fn mapping<K: Into<String>>(entries: impl IntoIterator<Item = (K, Node)>) -> Self {
        Node::Mapping(entries.into_iter().collect())
    }

    pub fn sequence(items: impl IntoIterator<Item = Node>) -> Self {
        Node::Sequence(items.into_iter().map(Arc::new).collect())
    }

    pub fn scalar(value: impl Into<Scalar>) -> Self {
        Node::Scalar(value.into())
    }

    pub fn null() -> Self {
        Node::Scalar(Scalar::Null)
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Mapping(_) => NodeKind::Mapping,
            Node::Sequence(_) => NodeKind::Sequence,
            Node::Scalar(_) => NodeKind::Scalar,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Node::Scalar(s) => Some(s),
            _ => None,
        }
    }

    fn child(&self, segment: &PathSegment) -> Result<&Node, String> {
        match (self, segment) {
            (Node::Mapping(m), PathSegment::Key(k)) => {
                m.get(k).ok_or_else(|| format!("no key '{k}'"))
            }
            (Node::Sequence(items), PathSegment::Index(i)) => items
                .get(*i)
                .map(Arc::as_ref)
                .ok_or_else(|| format!("index {i} out of bounds (len {})", items.len())),
            (node, PathSegment::Key(k)) => Err(format!("key '{k}' applied to a {}", node.kind())),
            (node, PathSegment::Index(i)) => {
                Err(format!("index {i} applied to a {}", node.kind()))
            }
        }
    }

    fn child_arc_mut(&mut self, segment: &PathSegment) -> Result<&mut Arc<Node>, String> {
        let kind = self.kind();
        match (self, segment) {
            (Node::Mapping(m), PathSegment::Key(k)) => {
                m.get_arc_mut(k).ok_or_else(|| format!("no key '{k}'"))
            }
            (Node::Sequence(items), PathSegment::Index(i)) => {
                let len = items.len();
                items
                    .get_mut(*i)
                    .ok_or_else(|| format!("index {i} out of bounds (len {len})"))
            }
            (_, PathSegment::Key(k)) => Err(format!("key '{k}' applied to a {kind}")),
            (_, PathSegment::Index(i)) => Err(format!("index {i} applied to a {kind}")),
        }
    }

    fn same_shape(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Scalar(_), Node::Scalar(_)) => true,
            (Node::Sequence(a), Node::Sequence(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_shape(y))
            }
            (Node::Mapping(a), Node::Mapping(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|((ka, va), (kb, vb))| ka == kb && va.same_shape(vb))
            }
            _ => false,
        }
    }
}

/// A parsed configuration document.
///
/// Cloning is cheap; clones share the whole tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    root: Arc<Node>,
}

impl ConfigDocument {
    pub fn new(root: Node) -> Self {
        Self {
            root: Arc::new(root),
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Every scalar leaf, depth-first, mapping keys in insertion order and
    /// sequence items in index order.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves::new(&self.root)
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().count()
    }

    pub fn get(&self, path: &LeafPath) -> Result<&Scalar, InvalidPathError> {
        let mut node: &Node = &self.root;
        for segment in path.segments() {
            node = node
                .child(segment)
                .map_err(|reason| InvalidPathError::new(path, reason))?;
        }
        node.as_scalar().ok_or_else(|| {
            InvalidPathError::new(path, format!("resolves to a {}, not a scalar", node.kind()))
        })
    }

    /// Return a new document with the scalar at `path` replaced by `value`.
    ///
    /// `self` is left untouched; untouched subtrees are shared with it.
    pub fn update(&self, path: &LeafPath, value: Scalar) -> Result<ConfigDocument, InvalidPathError> {
        // Resolve first so a bad path never triggers any cloning.
        self.get(path)?;

        let mut root = Arc::clone(&self.root);
        let mut cursor: &mut Node = Arc::make_mut(&mut root);
        for segment in path.segments() {
            let child = cursor
                .child_arc_mut(segment)
                .map_err(|reason| InvalidPathError::new(path, reason))?;
            cursor = Arc::make_mut(child);
        }
        match cursor {
            Node::Scalar(slot) => *slot = value,
            other => {
                return Err(InvalidPathError::new(
                    path,
                    format!("resolves to a {}, not a scalar", other.kind()),
                ));
            }
        }
        Ok(ConfigDocument { root })
    }

    /// Apply several updates in order.
    pub fn update_all<'a>(
        &self,
        edits: impl IntoIterator<Item = (&'a LeafPath, Scalar)>,
    ) -> Result<ConfigDocument, InvalidPathError> {
        let mut doc = self.clone();
        for (path, value) in edits {
            doc = doc.update(path, value)?;
        }
        Ok(doc)
    }

    /// Whether both documents have the same keys, key order and sequence
    /// lengths, ignoring scalar values.
    pub fn same_shape(&self, other: &ConfigDocument) -> bool {
        self.root.same_shape(&other.root)
    }

    /// Paths whose scalar values differ, or `None` when the shapes differ.
    pub fn differing_leaves(&self, other: &ConfigDocument) -> Option<Vec<LeafPath>> {
        if !self.same_shape(other) {
            return None;
        }
        Some(
            self.leaves()
                .zip(other.leaves())
                .filter(|((_, a), (_, b))| a != b)
                .map(|((path, _), _)| path)
                .collect(),
        )
    }

    /// Whether `other` shares `path`'s subtree with `self` without a copy.
    pub fn shares_subtree(&self, other: &ConfigDocument, path: &LeafPath) -> bool {
        fn resolve<'a>(mut node: &'a Arc<Node>, path: &LeafPath) -> Option<&'a Arc<Node>> {
            for segment in path.segments() {
                node = match (node.as_ref(), segment) {
                    (Node::Mapping(m), PathSegment::Key(k)) => {
                        m.entries.iter().find(|(key, _)| key == k).map(|(_, v)| v)?
                    }
                    (Node::Sequence(items), PathSegment::Index(i)) => items.get(*i)?,
                    _ => return None,
                };
            }
            Some(node)
        }
        match (resolve(&self.root, path), resolve(&other.root, path)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}
