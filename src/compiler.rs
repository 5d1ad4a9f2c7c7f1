use std::cmp::Ordering;
use std::sync::Arc;

use regex::Regex;

use crate::ast::{Comparison, Node, Operand};
use crate::comparison::{cmp_values, values_equal, LikePattern};
use crate::errors::{QueryError, Result};
use crate::operator::Operator;
use crate::options::{AbsentPolicy, CompileOptions};
use crate::registry::PropertyRegistry;
use crate::value::Value;

/// A compiled filter. Cheap to clone and safe to share between threads.
pub type Predicate<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Compile a tree into a predicate over `T`.
///
/// Trees produced by the parser or the typed builder always compile; a
/// hand-assembled tree is checked against the registry the same way parsed
/// text is.
pub fn compile<T: 'static>(
    node: &Node,
    registry: &PropertyRegistry<T>,
    options: &CompileOptions,
) -> Result<Predicate<T>> {
    let predicate = compile_node(node, registry, options)?;
    tracing::debug!(comparisons = node.comparisons(), "compiled predicate");
    Ok(predicate)
}

/// The predicate of the empty query.
pub fn accept_all<T: 'static>() -> Predicate<T> {
    Arc::new(|_: &T| true)
}

fn compile_node<T: 'static>(
    node: &Node,
    registry: &PropertyRegistry<T>,
    options: &CompileOptions,
) -> Result<Predicate<T>> {
    let predicate: Predicate<T> = match node.ungrouped() {
        Node::Comparison(c) => compile_comparison(c, registry, options)?,
        chain @ Node::And(..) => {
            let parts = compile_chain(chain, registry, options)?;
            Arc::new(move |t: &T| parts.iter().all(|p| p(t)))
        }
        chain => {
            let parts = compile_chain(chain, registry, options)?;
            Arc::new(move |t: &T| parts.iter().any(|p| p(t)))
        }
    };
    Ok(predicate)
}

/// Compile a run of same-operator nodes into one flat list, so a long `;` or
/// `,` chain costs one loop at evaluation time instead of one stack frame per
/// link.
fn compile_chain<T: 'static>(
    chain: &Node,
    registry: &PropertyRegistry<T>,
    options: &CompileOptions,
) -> Result<Vec<Predicate<T>>> {
    let is_and = matches!(chain, Node::And(..));
    let mut parts = Vec::new();
    let mut pending = vec![chain];
    while let Some(node) = pending.pop() {
        match node.ungrouped() {
            Node::And(l, r) if is_and => {
                pending.push(r);
                pending.push(l);
            }
            Node::Or(l, r) if !is_and => {
                pending.push(r);
                pending.push(l);
            }
            // A nested chain of the other operator starts a new level.
            other => parts.push(compile_node(other, registry, options)?),
        }
    }
    Ok(parts)
}

fn compile_comparison<T: 'static>(
    c: &Comparison,
    registry: &PropertyRegistry<T>,
    options: &CompileOptions,
) -> Result<Predicate<T>> {
    // No source text here, so positions are 0.
    let descriptor = registry.resolve(&c.property, 0)?;
    descriptor.check_operator(c.operator)?;
    let expected = descriptor.operand_kind(c.operator);
    if let Some(bad) = c.operand.values().iter().find(|v| v.kind() != expected) {
        return Err(QueryError::ValueCoercion {
            literal: bad.literal(),
            target: expected,
        });
    }

    let test = Test::prepare(c)?;
    // The absent outcome depends only on the operator and policy.
    let absent = test.on_absent(options.absent);
    let accessor = descriptor.accessor();
    let predicate: Predicate<T> = Arc::new(move |t: &T| match accessor(t) {
        Some(value) => test.on_present(&value),
        None => absent,
    });
    Ok(predicate)
}

/// An operator with its operand prepared for repeated evaluation.
enum Test {
    Equal(Value),
    NotEqual(Value),
    Order(Operator, Value),
    In(Vec<Value>),
    Out(Vec<Value>),
    Like(LikePattern),
    Regex(Regex),
    Exists(bool),
}

impl Test {
    fn prepare(c: &Comparison) -> Result<Test> {
        let operator = c.operator;
        let values = c.operand.values();
        // Only `=in=` and `=out=` take a list; everything else wants exactly one value.
        let single = || match (&c.operand, values) {
            (Operand::Single(value), _) | (Operand::List(_), [value]) => Ok(value.clone()),
            _ => Err(QueryError::InvalidOperand {
                property: c.property.clone(),
                operator: operator.symbol().to_string(),
                expected: "a single value".into(),
            }),
        };
        Ok(match operator {
            Operator::In => Test::In(values.to_vec()),
            Operator::Out => Test::Out(values.to_vec()),
            Operator::Eq => Test::Equal(single()?),
            Operator::Ne => Test::NotEqual(single()?),
            Operator::Gt | Operator::Ge | Operator::Lt | Operator::Le => {
                Test::Order(operator, single()?)
            }
            Operator::Like => Test::Like(LikePattern::new(single()?.as_str().unwrap_or_default())),
            Operator::Regex => {
                let value = single()?;
                let pattern = value.as_str().unwrap_or_default();
                let regex = Regex::new(pattern).map_err(|e| QueryError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                })?;
                Test::Regex(regex)
            }
            Operator::Exists => Test::Exists(matches!(single()?, Value::Boolean(true))),
        })
    }

    fn on_present(&self, actual: &Value) -> bool {
        match self {
            Test::Equal(v) => values_equal(actual, v),
            Test::NotEqual(v) => !values_equal(actual, v),
            Test::Order(op, v) => match cmp_values(actual, v) {
                Some(ord) => match op {
                    Operator::Gt => ord == Ordering::Greater,
                    Operator::Ge => ord != Ordering::Less,
                    Operator::Lt => ord == Ordering::Less,
                    _ => ord != Ordering::Greater,
                },
                None => false,
            },
            Test::In(vs) => vs.iter().any(|v| values_equal(actual, v)),
            Test::Out(vs) => !vs.iter().any(|v| values_equal(actual, v)),
            // Pattern operators only apply to text.
            Test::Like(pattern) => actual.as_str().is_some_and(|s| pattern.matches(s)),
            Test::Regex(regex) => actual.as_str().is_some_and(|s| regex.is_match(s)),
            Test::Exists(want) => *want,
        }
    }

    fn on_absent(&self, policy: AbsentPolicy) -> bool {
        match self {
            Test::Exists(want) => !*want,
            Test::NotEqual(_) | Test::Out(_) => policy == AbsentPolicy::Distinct,
            _ => false,
        }
    }
}
