use crate::Node;
use confmut_types::{LeafPath, Scalar};

/// Lazy depth-first iterator over the scalar leaves of a document.
///
/// Uses an explicit stack, so nesting depth is bounded by memory rather than
/// by the call stack.
pub struct Leaves<'a> {
    stack: Vec<(LeafPath, &'a Node)>,
}

impl<'a> Leaves<'a> {
    pub(crate) fn new(root: &'a Node) -> Self {
        Self {
            stack: vec![(LeafPath::root(), root)],
        }
    }
}

impl<'a> Iterator for Leaves<'a> {
    type Item = (LeafPath, &'a Scalar);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((path, node)) = self.stack.pop() {
            match node {
                Node::Scalar(value) => return Some((path, value)),
                Node::Mapping(mapping) => {
                    // Reversed so the first key is popped first.
                    for (key, child) in mapping.iter().rev() {
                        self.stack.push((path.child_key(key), child));
                    }
                }
                Node::Sequence(items) => {
                    for (index, child) in items.iter().enumerate().rev() {
                        self.stack.push((path.child_index(index), child.as_ref()));
                    }
                }
            }
        }
        None
    }
}
