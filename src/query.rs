use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::ast::Node;
use crate::compiler::{self, Predicate};
use crate::errors::{QueryError, Result};
use crate::grammar;
use crate::options::{CompileOptions, ParseOptions};
use crate::registry::{Filterable, PropertyRegistry};
use crate::serializer;

/// A filter over domain type `T`.
///
/// Equality and hashing are structural over the tree, so a query built with
/// the typed builder equals the one parsed back from its text. The empty
/// query matches every instance and renders as the empty string.
pub struct Query<T> {
    root: Option<Node>,
    _domain: PhantomData<fn(&T)>,
}

impl<T> Query<T> {
    /// The empty query.
    pub fn all() -> Self {
        Self {
            root: None,
            _domain: PhantomData,
        }
    }

    /// Wrap an existing tree. It is validated against a registry when compiled.
    pub fn from_node(node: Node) -> Self {
        Self {
            root: Some(node),
            _domain: PhantomData,
        }
    }

    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    pub fn into_root(self) -> Option<Node> {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// `self ; other`
    pub fn and(self, other: Query<T>) -> Query<T> {
        self.combine(other, Node::and)
    }

    /// `self , other`
    pub fn or(self, other: Query<T>) -> Query<T> {
        self.combine(other, Node::or)
    }

    /// Conjunction of all queries, folded left to right.
    pub fn all_of<I: IntoIterator<Item = Query<T>>>(queries: I) -> Query<T> {
        queries.into_iter().fold(Query::all(), Query::and)
    }

    /// Disjunction of all queries, folded left to right.
    pub fn any_of<I: IntoIterator<Item = Query<T>>>(queries: I) -> Query<T> {
        queries.into_iter().fold(Query::all(), Query::or)
    }

    fn combine(self, other: Query<T>, join: fn(Node, Node) -> Node) -> Query<T> {
        match (self.root, other.root) {
            (Some(left), Some(right)) => Query::from_node(join(left, right)),
            (Some(only), None) | (None, Some(only)) => Query::from_node(only),
            (None, None) => Query::all(),
        }
    }

    /// Canonical RSQL text.
    pub fn to_rsql(&self) -> String {
        self.root.as_ref().map(serializer::serialize).unwrap_or_default()
    }
}

impl<T: 'static> Query<T> {
    pub fn parse_with(
        text: &str,
        registry: &PropertyRegistry<T>,
        options: &ParseOptions,
    ) -> Result<Self> {
        Ok(Self {
            root: grammar::parse(text, registry, options)?,
            _domain: PhantomData,
        })
    }

    pub fn compile_with(
        &self,
        registry: &PropertyRegistry<T>,
        options: &CompileOptions,
    ) -> Result<Predicate<T>> {
        match &self.root {
            Some(node) => compiler::compile(node, registry, options),
            None => Ok(compiler::accept_all()),
        }
    }
}

impl<T: Filterable> Query<T> {
    /// Parse text against the registry of `T`.
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with(text, T::registry(), &ParseOptions::default())
    }

    /// Compile against the registry of `T` with the default absent-value policy.
    pub fn compile(&self) -> Result<Predicate<T>> {
        self.compile_with(T::registry(), &CompileOptions::default())
    }
}

impl<T: Filterable> FromStr for Query<T> {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self> {
        Query::parse(s)
    }
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            _domain: PhantomData,
        }
    }
}

impl<T> Default for Query<T> {
    fn default() -> Self {
        Query::all()
    }
}

impl<T> PartialEq for Query<T> {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

impl<T> Eq for Query<T> {}

impl<T> Hash for Query<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.root.hash(state);
    }
}

impl<T> fmt::Debug for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Query").field(&self.to_rsql()).finish()
    }
}

impl<T> fmt::Display for Query<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rsql())
    }
}

impl<T> From<Node> for Query<T> {
    fn from(node: Node) -> Self {
        Query::from_node(node)
    }
}

/// Queries travel as their canonical text.
impl<T> Serialize for Query<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_rsql())
    }
}

impl<'de, T: Filterable> Deserialize<'de> for Query<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Query::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Operand;
    use crate::operator::Operator;
    use crate::value::Value;

    struct Unit;

    fn cmp(name: &str, v: i64) -> Query<Unit> {
        Query::from_node(Node::comparison(name, Operator::Eq, Operand::Single(Value::Integer(v))))
    }

    #[test]
    fn empty_is_identity() {
        let q = cmp("a", 1);
        assert_eq!(Query::all().and(q.clone()), q);
        assert_eq!(q.clone().or(Query::all()), q);
        assert_eq!(Query::<Unit>::all().to_rsql(), "");
        assert!(Query::<Unit>::all_of(Vec::new()).is_empty());
    }

    #[test]
    fn combinators_fold_left() {
        let folded = Query::all_of([cmp("a", 1), cmp("b", 2), cmp("c", 3)]);
        let chained = cmp("a", 1).and(cmp("b", 2)).and(cmp("c", 3));
        assert_eq!(folded, chained);
        assert_eq!(folded.to_rsql(), "a==1;b==2;c==3");
        assert_eq!(
            Query::any_of([cmp("a", 1), cmp("b", 2)]).to_rsql(),
            "a==1,b==2"
        );
    }

    #[test]
    fn combining_leaves_inputs_untouched() {
        let base = cmp("a", 1);
        let extended = base.clone().or(cmp("b", 2));
        assert_eq!(base.to_rsql(), "a==1");
        assert_eq!(extended.to_rsql(), "a==1,b==2");
    }
}
