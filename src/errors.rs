use thiserror::Error;

use crate::value::ValueKind;

/// Everything that can go wrong while turning text or a hand-built tree into a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    // Malformed input; `position` is a byte offset into the query text.
    #[error("parse error at {position}: expected {expected}")]
    Parse { position: usize, expected: String },

    // Selector not declared in the registry (exact, case-sensitive match).
    #[error("unknown property `{name}` at {position}")]
    UnknownProperty { name: String, position: usize },

    // Operator outside the set allowed for the property's kind.
    #[error("operator `{operator}` is not supported by {kind} property `{property}`")]
    UnsupportedOperator {
        operator: String,
        property: String,
        kind: ValueKind,
    },

    // Literal that does not convert to the property's kind.
    #[error("cannot coerce `{literal}` to {target}")]
    ValueCoercion { literal: String, target: ValueKind },

    // Parentheses nested past `ParseOptions::max_depth`.
    #[error("nesting deeper than {limit} levels at {position}")]
    NestingTooDeep { position: usize, limit: usize },

    // More comparisons than `ParseOptions::max_comparisons`.
    #[error("more than {limit} comparisons at {position}")]
    TooManyComparisons { position: usize, limit: usize },

    // Operand shape that does not fit the operator, e.g. a list under `==`.
    #[error("operand of `{property}{operator}` must be {expected}")]
    InvalidOperand {
        property: String,
        operator: String,
        expected: String,
    },

    // `=re=` operand that is not a valid regular expression.
    #[error("invalid pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl QueryError {
    pub(crate) fn parse(position: usize, expected: impl Into<String>) -> Self {
        QueryError::Parse {
            position,
            expected: expected.into(),
        }
    }
}

// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, QueryError>;
