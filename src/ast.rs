use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::operator::Operator;
use crate::value::Value;

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    Single(Value),
    List(Vec<Value>),
}

impl Operand {
    pub fn values(&self) -> &[Value] {
        match self {
            Operand::Single(v) => std::slice::from_ref(v),
            Operand::List(vs) => vs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Comparison {
    pub property: String,
    pub operator: Operator,
    pub operand: Operand,
}

/// Immutable expression tree.
///
/// `Group` only records that the source text had parentheses; it is ignored by
/// equality, hashing, the serializer and the compiler.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Comparison(Comparison),
    And(Box<Node>, Box<Node>),
    Or(Box<Node>, Box<Node>),
    Group(Box<Node>),
}

impl Node {
    pub fn comparison(property: impl Into<String>, operator: Operator, operand: Operand) -> Self {
        Node::Comparison(Comparison {
            property: property.into(),
            operator,
            operand,
        })
    }

    pub fn and(left: Node, right: Node) -> Self {
        Node::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Node, right: Node) -> Self {
        Node::Or(Box::new(left), Box::new(right))
    }

    pub fn group(inner: Node) -> Self {
        Node::Group(Box::new(inner))
    }

    /// Strip any number of enclosing `Group` wrappers.
    pub fn ungrouped(&self) -> &Node {
        let mut node = self;
        while let Node::Group(inner) = node {
            node = inner;
        }
        node
    }

    /// Number of comparisons in the tree.
    pub fn comparisons(&self) -> usize {
        let mut count = 0;
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            match node {
                Node::Comparison(_) => count += 1,
                Node::And(l, r) | Node::Or(l, r) => {
                    pending.push(r);
                    pending.push(l);
                }
                Node::Group(inner) => pending.push(inner),
            }
        }
        count
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        let mut pending = vec![(self, other)];
        while let Some((a, b)) = pending.pop() {
            match (a.ungrouped(), b.ungrouped()) {
                (Node::Comparison(a), Node::Comparison(b)) if a == b => {}
                (Node::And(al, ar), Node::And(bl, br)) | (Node::Or(al, ar), Node::Or(bl, br)) => {
                    pending.push((&**ar, &**br));
                    pending.push((&**al, &**bl));
                }
                _ => return false,
            }
        }
        true
    }
}

impl Eq for Node {}

impl Hash for Node {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Pre-order walk; the tags keep distinct shapes apart.
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            match node.ungrouped() {
                Node::Comparison(c) => {
                    0u8.hash(state);
                    c.hash(state);
                }
                Node::And(l, r) => {
                    1u8.hash(state);
                    pending.push(r);
                    pending.push(l);
                }
                Node::Or(l, r) => {
                    2u8.hash(state);
                    pending.push(r);
                    pending.push(l);
                }
                Node::Group(_) => {}
            }
        }
    }
}

// Chains built with the typed builder can be far deeper than the stack;
// unlink children onto a heap stack instead of dropping recursively.
impl Drop for Node {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut node) = pending.pop() {
            node.detach_children(&mut pending);
        }
    }
}

impl Node {
    fn detach_children(&mut self, into: &mut Vec<Node>) {
        match self {
            Node::Comparison(_) => {}
            Node::And(l, r) | Node::Or(l, r) => {
                into.push(std::mem::replace(&mut **l, Node::placeholder()));
                into.push(std::mem::replace(&mut **r, Node::placeholder()));
            }
            Node::Group(inner) => into.push(std::mem::replace(&mut **inner, Node::placeholder())),
        }
    }

    // Allocation-free leaf left behind by `detach_children`.
    fn placeholder() -> Node {
        Node::comparison(String::new(), Operator::Exists, Operand::List(Vec::new()))
    }
}

impl From<Comparison> for Node {
    fn from(c: Comparison) -> Self {
        Node::Comparison(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;

    fn eq(name: &str, v: i64) -> Node {
        Node::comparison(name, Operator::Eq, Operand::Single(Value::Integer(v)))
    }

    fn hash_of(node: &Node) -> u64 {
        let mut h = DefaultHasher::new();
        node.hash(&mut h);
        h.finish()
    }

    #[test]
    fn groups_are_transparent() {
        let plain = Node::or(eq("a", 1), Node::and(eq("b", 2), eq("c", 3)));
        let grouped = Node::or(eq("a", 1), Node::group(Node::and(eq("b", 2), eq("c", 3))));
        assert_eq!(plain, grouped);
        assert_eq!(hash_of(&plain), hash_of(&grouped));
        assert_eq!(Node::group(Node::group(eq("a", 1))), eq("a", 1));
    }

    #[test]
    fn shape_matters() {
        let left = Node::and(Node::and(eq("a", 1), eq("b", 2)), eq("c", 3));
        let right = Node::and(eq("a", 1), Node::and(eq("b", 2), eq("c", 3)));
        assert_ne!(left, right);
        assert_ne!(Node::and(eq("a", 1), eq("b", 2)), Node::or(eq("a", 1), eq("b", 2)));
        assert_eq!(left.comparisons(), 3);
    }

    #[test]
    fn deep_chains_do_not_recurse() {
        let chain = |n: i64| (1..n).fold(eq("a", 0), |acc, i| Node::and(acc, eq("a", i)));
        let (one, two) = (chain(200_000), chain(200_000));
        assert_eq!(one.comparisons(), 200_000);
        assert_eq!(one, two);
        assert_eq!(hash_of(&one), hash_of(&two));
        assert_ne!(one, chain(199_999));
        drop(one);
        drop(two);
    }
}
