use regex::Regex;

use crate::ast::{Node, Operand};
use crate::errors::{QueryError, Result};
use crate::operator::Operator;
use crate::options::ParseOptions;
use crate::parser::Parser;
use crate::property::PropertyDescriptor;
use crate::registry::PropertyRegistry;

/// Parse RSQL text against `registry`. Blank text yields `None`, the empty query.
pub fn parse<T: 'static>(
    input: &str,
    registry: &PropertyRegistry<T>,
    options: &ParseOptions,
) -> Result<Option<Node>> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    let mut g = Grammar {
        parser: Parser::new(input),
        registry,
        max_depth: options.max_depth,
        max_comparisons: options.max_comparisons,
        comparisons: 0,
    };
    let node = g.parse_or(0)?;
    // Anything left over is a syntax error, e.g. a stray `)`.
    g.parser.skip_ws();
    if !g.parser.eof() {
        return Err(QueryError::parse(
            g.parser.position(),
            "',', ';' or end of input",
        ));
    }
    tracing::debug!(comparisons = g.comparisons, "parsed query");
    Ok(Some(node))
}

struct Grammar<'a, 'r, T> {
    parser: Parser<'a>,
    registry: &'r PropertyRegistry<T>,
    max_depth: usize,
    max_comparisons: usize,
    // Comparisons seen so far; chains fold into a tree this deep.
    comparisons: usize,
}

impl<T: 'static> Grammar<'_, '_, T> {
    fn parse_or(&mut self, depth: usize) -> Result<Node> {
        let mut left = self.parse_and(depth)?;
        loop {
            self.parser.skip_ws();
            if self.parser.consume_char(',') {
                let right = self.parse_and(depth)?;
                left = Node::or(left, right);
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_and(&mut self, depth: usize) -> Result<Node> {
        let mut left = self.parse_comparison(depth)?;
        loop {
            self.parser.skip_ws();
            if self.parser.consume_char(';') {
                let right = self.parse_comparison(depth)?;
                left = Node::and(left, right);
            } else {
                break;
            }
        }
        Ok(left)
    }

    fn parse_comparison(&mut self, depth: usize) -> Result<Node> {
        self.parser.skip_ws();
        let start = self.parser.position();
        // Parenthesised sub-expression.
        if self.parser.consume_char('(') {
            if depth >= self.max_depth {
                return Err(QueryError::NestingTooDeep {
                    position: start,
                    limit: self.max_depth,
                });
            }
            let inner = self.parse_or(depth + 1)?;
            self.parser.skip_ws();
            self.parser.expect(')')?;
            return Ok(Node::group(inner));
        }

        if self.comparisons == self.max_comparisons {
            return Err(QueryError::TooManyComparisons {
                position: start,
                limit: self.max_comparisons,
            });
        }
        self.comparisons += 1;

        // selector, operator, operand
        let name = self.parser.parse_selector()?;
        let descriptor = self.registry.resolve(name, start)?;
        self.parser.skip_ws();
        let op_start = self.parser.position();
        let symbol = self.parser.parse_operator()?;
        let operator = Operator::from_symbol(symbol)
            .ok_or_else(|| QueryError::parse(op_start, "a known comparison operator"))?;
        descriptor.check_operator(operator)?;
        self.parser.skip_ws();
        let operand = self.parse_operand(&descriptor, operator)?;
        tracing::trace!(property = name, %operator, "parsed comparison");
        Ok(Node::comparison(name, operator, operand))
    }

    fn parse_operand(
        &mut self,
        descriptor: &PropertyDescriptor<T>,
        operator: Operator,
    ) -> Result<Operand> {
        if self.parser.peek_char() == Some('(') {
            if !operator.is_multi_value() {
                return Err(QueryError::parse(self.parser.position(), "a single value"));
            }
            self.parser.consume_char('(');
            self.parser.skip_ws();
            // `()` is the empty list: `=in=` never matches, `=out=` always does.
            if self.parser.consume_char(')') {
                return Ok(Operand::List(Vec::new()));
            }
            let mut values = Vec::new();
            loop {
                self.parser.skip_ws();
                let literal = self.parser.parse_literal()?;
                values.push(self.coerce(descriptor, operator, &literal)?);
                self.parser.skip_ws();
                if !self.parser.consume_char(',') {
                    break;
                }
            }
            self.parser.expect(')')?;
            return Ok(Operand::List(values));
        }
        // A bare literal after `=in=`/`=out=` is a one-element list.
        let literal = self.parser.parse_literal()?;
        let value = self.coerce(descriptor, operator, &literal)?;
        if operator.is_multi_value() {
            Ok(Operand::List(vec![value]))
        } else {
            Ok(Operand::Single(value))
        }
    }

    fn coerce(
        &self,
        descriptor: &PropertyDescriptor<T>,
        operator: Operator,
        literal: &str,
    ) -> Result<crate::value::Value> {
        let value = descriptor.coerce(operator, literal)?;
        // Reject bad patterns here rather than at compile time.
        if operator == Operator::Regex {
            Regex::new(literal).map_err(|e| QueryError::InvalidPattern {
                pattern: literal.to_string(),
                reason: e.to_string(),
            })?;
        }
        Ok(value)
    }
}
