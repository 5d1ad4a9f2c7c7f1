use itertools::Itertools;

use crate::ast::{Comparison, Node, Operand};
use crate::value::Value;

/// Render a tree as canonical RSQL text.
pub fn serialize(node: &Node) -> String {
    let mut out = String::new();
    write_node(node, &mut out);
    out
}

fn write_node(node: &Node, out: &mut String) {
    match node.ungrouped() {
        Node::Comparison(c) => write_comparison(c, out),
        and @ Node::And(..) => {
            // `;` binds tighter than `,`, and re-parsing folds to the left.
            let (first, rest) = left_spine(and);
            write_child(first, out, is_or(first));
            for right in rest.into_iter().rev() {
                out.push(';');
                write_child(right, out, is_or(right) || is_and(right));
            }
        }
        or => {
            let (first, rest) = left_spine(or);
            write_node(first, out);
            for right in rest.into_iter().rev() {
                out.push(',');
                write_child(right, out, is_or(right));
            }
        }
    }
}

/// Walk down the left children of a same-operator chain. Returns the leftmost
/// operand and the right operands, innermost last.
fn left_spine(chain: &Node) -> (&Node, Vec<&Node>) {
    let and = is_and(chain);
    let mut rights = Vec::new();
    let mut node = chain.ungrouped();
    loop {
        match node {
            Node::And(left, right) if and => {
                rights.push(&**right);
                node = left.ungrouped();
            }
            Node::Or(left, right) if !and => {
                rights.push(&**right);
                node = left.ungrouped();
            }
            _ => return (node, rights),
        }
    }
}

fn write_child(node: &Node, out: &mut String, parenthesize: bool) {
    if parenthesize {
        out.push('(');
        write_node(node, out);
        out.push(')');
    } else {
        write_node(node, out);
    }
}

fn is_and(node: &Node) -> bool {
    matches!(node.ungrouped(), Node::And(..))
}

fn is_or(node: &Node) -> bool {
    matches!(node.ungrouped(), Node::Or(..))
}

fn write_comparison(c: &Comparison, out: &mut String) {
    out.push_str(&c.property);
    out.push_str(c.operator.symbol());
    match &c.operand {
        Operand::Single(v) => out.push_str(&render_value(v)),
        Operand::List(vs) => {
            out.push('(');
            out.push_str(&vs.iter().map(render_value).join(","));
            out.push(')');
        }
    }
}

pub(crate) fn is_reserved(c: char) -> bool {
    c.is_whitespace()
        || matches!(
            c,
            '"' | '\'' | '(' | ')' | ';' | ',' | '=' | '!' | '~' | '<' | '>' | '\\'
        )
}

fn render_value(value: &Value) -> String {
    let literal = value.literal();
    if !literal.is_empty() && !literal.chars().any(is_reserved) {
        return literal;
    }
    let mut quoted = String::with_capacity(literal.len() + 2);
    quoted.push('"');
    for c in literal.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::Operator;
    use pretty_assertions::assert_eq;

    fn cmp(name: &str, v: i64) -> Node {
        Node::comparison(name, Operator::Eq, Operand::Single(Value::Integer(v)))
    }

    #[test]
    fn quotes_only_when_needed() {
        let bare = Node::comparison("name", Operator::Eq, Operand::Single(Value::String("Doe".into())));
        assert_eq!(serialize(&bare), "name==Doe");

        let spaced = Node::comparison(
            "name",
            Operator::Gt,
            Operand::Single(Value::String("John Doe".into())),
        );
        assert_eq!(serialize(&spaced), "name=gt=\"John Doe\"");

        let nasty = Node::comparison(
            "name",
            Operator::Ne,
            Operand::Single(Value::String(r#"say "hi" \ bye"#.into())),
        );
        assert_eq!(serialize(&nasty), r#"name!="say \"hi\" \\ bye""#);

        let empty = Node::comparison("name", Operator::Eq, Operand::Single(Value::String(String::new())));
        assert_eq!(serialize(&empty), r#"name=="""#);
    }

    #[test]
    fn lists_and_numbers() {
        let node = Node::comparison(
            "age",
            Operator::In,
            Operand::List(vec![Value::Integer(20), Value::Integer(25), Value::Integer(-3)]),
        );
        assert_eq!(serialize(&node), "age=in=(20,25,-3)");
        let f = Node::comparison("score", Operator::Gt, Operand::Single(Value::Float(20.0)));
        assert_eq!(serialize(&f), "score=gt=20.0");
        let none = Node::comparison("age", Operator::Out, Operand::List(Vec::new()));
        assert_eq!(serialize(&none), "age=out=()");
    }

    #[test]
    fn long_chains_render_without_recursing() {
        let chain = (1..100_000).fold(cmp("a", 0), |acc, i| Node::or(acc, cmp("a", i)));
        let text = serialize(&chain);
        assert!(text.starts_with("a==0,a==1,a==2,"));
        assert!(text.ends_with(",a==99999"));
        assert_eq!(text.matches(',').count(), 99_999);
    }

    #[test]
    fn minimal_parentheses() {
        let or_in_and = Node::and(Node::or(cmp("a", 1), cmp("b", 2)), cmp("c", 3));
        assert_eq!(serialize(&or_in_and), "(a==1,b==2);c==3");

        let and_in_or = Node::or(cmp("a", 1), Node::and(cmp("b", 2), cmp("c", 3)));
        assert_eq!(serialize(&and_in_or), "a==1,b==2;c==3");

        let left_chain = Node::and(Node::and(cmp("a", 1), cmp("b", 2)), cmp("c", 3));
        assert_eq!(serialize(&left_chain), "a==1;b==2;c==3");

        let right_chain = Node::and(cmp("a", 1), Node::and(cmp("b", 2), cmp("c", 3)));
        assert_eq!(serialize(&right_chain), "a==1;(b==2;c==3)");

        let grouped = Node::group(Node::or(cmp("a", 1), Node::group(cmp("b", 2))));
        assert_eq!(serialize(&grouped), "a==1,b==2");
    }
}
