use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::ValueKind;

/// Comparison operators of the grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    In,
    Out,
    Like,
    /// Presence test; the operand is a boolean.
    Exists,
    /// Regular expression search; anchor the pattern to match the whole value.
    Regex,
}

const STRING_OPERATORS: &[Operator] = &[
    Operator::Eq,
    Operator::Ne,
    Operator::Gt,
    Operator::Ge,
    Operator::Lt,
    Operator::Le,
    Operator::In,
    Operator::Out,
    Operator::Like,
    Operator::Regex,
    Operator::Exists,
];

const NUMBER_OPERATORS: &[Operator] = &[
    Operator::Eq,
    Operator::Ne,
    Operator::Gt,
    Operator::Ge,
    Operator::Lt,
    Operator::Le,
    Operator::In,
    Operator::Out,
    Operator::Exists,
];

const BOOLEAN_OPERATORS: &[Operator] = &[Operator::Eq, Operator::Ne, Operator::Exists];

const INSTANT_OPERATORS: &[Operator] = &[
    Operator::Eq,
    Operator::Ne,
    Operator::Gt,
    Operator::Ge,
    Operator::Lt,
    Operator::Le,
    Operator::Exists,
];

const ENUM_OPERATORS: &[Operator] = &[
    Operator::Eq,
    Operator::Ne,
    Operator::In,
    Operator::Out,
    Operator::Exists,
];

// Custom values compare by encoded text: equality family only.
const CUSTOM_OPERATORS: &[Operator] = &[
    Operator::Eq,
    Operator::Ne,
    Operator::In,
    Operator::Out,
    Operator::Exists,
];

impl Operator {
    pub const ALL: [Operator; 11] = [
        Operator::Eq,
        Operator::Ne,
        Operator::Gt,
        Operator::Ge,
        Operator::Lt,
        Operator::Le,
        Operator::In,
        Operator::Out,
        Operator::Like,
        Operator::Exists,
        Operator::Regex,
    ];

    /// Canonical symbol, as written by the serializer.
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Gt => "=gt=",
            Operator::Ge => "=ge=",
            Operator::Lt => "=lt=",
            Operator::Le => "=le=",
            Operator::In => "=in=",
            Operator::Out => "=out=",
            Operator::Like => "=like=",
            Operator::Exists => "=ex=",
            Operator::Regex => "=re=",
        }
    }

    /// Resolve a symbol, including the `<`, `<=`, `>`, `>=` aliases.
    pub fn from_symbol(symbol: &str) -> Option<Operator> {
        let op = match symbol {
            "<" => Operator::Lt,
            "<=" => Operator::Le,
            ">" => Operator::Gt,
            ">=" => Operator::Ge,
            _ => return Operator::ALL.into_iter().find(|op| op.symbol() == symbol),
        };
        Some(op)
    }

    /// Operators taking a parenthesised list of values.
    pub fn is_multi_value(self) -> bool {
        matches!(self, Operator::In | Operator::Out)
    }

    /// The operators a property of `kind` accepts.
    pub fn allowed_for(kind: ValueKind) -> &'static [Operator] {
        match kind {
            ValueKind::String => STRING_OPERATORS,
            ValueKind::Integer | ValueKind::Float => NUMBER_OPERATORS,
            ValueKind::Boolean => BOOLEAN_OPERATORS,
            ValueKind::Instant => INSTANT_OPERATORS,
            ValueKind::Enum => ENUM_OPERATORS,
            ValueKind::Custom => CUSTOM_OPERATORS,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_resolve_back() {
        for op in Operator::ALL {
            assert_eq!(Operator::from_symbol(op.symbol()), Some(op));
        }
        assert_eq!(Operator::from_symbol(">="), Some(Operator::Ge));
        assert_eq!(Operator::from_symbol("=foo="), None);
    }

    #[test]
    fn boolean_has_no_ordering() {
        let allowed = Operator::allowed_for(ValueKind::Boolean);
        assert!(!allowed.contains(&Operator::Gt));
        assert!(!allowed.contains(&Operator::In));
        assert!(Operator::allowed_for(ValueKind::String).contains(&Operator::Like));
        assert!(!Operator::allowed_for(ValueKind::Integer).contains(&Operator::Like));
        assert!(!Operator::allowed_for(ValueKind::Custom).contains(&Operator::Gt));
    }
}
