use std::cmp::Ordering;

use crate::value::Value;

/// Order two values of compatible kinds; `None` when they cannot be ordered.
///
/// Integers and floats are compared numerically across kinds, everything else
/// only against its own kind.
pub fn cmp_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::String(sa), Value::String(sb)) => Some(sa.cmp(sb)),
        (Value::Integer(ia), Value::Integer(ib)) => Some(ia.cmp(ib)),
        (Value::Float(fa), Value::Float(fb)) => fa.partial_cmp(fb),
        (Value::Integer(i), Value::Float(f)) => (*i as f64).partial_cmp(f),
        (Value::Float(f), Value::Integer(i)) => f.partial_cmp(&(*i as f64)),
        (Value::Boolean(ba), Value::Boolean(bb)) => Some(ba.cmp(bb)),
        (Value::Instant(da), Value::Instant(db)) => Some(da.cmp(db)),
        (Value::Enum(ea), Value::Enum(eb)) => Some(ea.cmp(eb)),
        (Value::Custom(ca), Value::Custom(cb)) => Some(ca.cmp(cb)),
        _ => None,
    }
}

/// Equality used by `==`, `!=`, `=in=` and `=out=`.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Float(fa), Value::Float(fb)) => fa == fb,
        _ => cmp_values(a, b) == Some(Ordering::Equal),
    }
}

/// A `=like=` pattern where `*` stands for any run of characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LikePattern {
    parts: Vec<String>,
}

impl LikePattern {
    pub fn new(pattern: &str) -> Self {
        Self {
            parts: pattern.split('*').map(str::to_string).collect(),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        // A pattern without `*` has one part and must equal the text.
        let (first, rest) = match self.parts.split_first() {
            Some(split) => split,
            None => return text.is_empty(),
        };
        let Some(mut remaining) = text.strip_prefix(first.as_str()) else {
            return false;
        };
        let Some((last, middle)) = rest.split_last() else {
            return remaining.is_empty();
        };
        for part in middle {
            match remaining.find(part.as_str()) {
                Some(at) => remaining = &remaining[at + part.len()..],
                None => return false,
            }
        }
        remaining.len() >= last.len() && remaining.ends_with(last.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_wildcards() {
        let p = LikePattern::new("J*n*e");
        assert!(p.matches("Jane"));
        assert!(p.matches("Joanne"));
        assert!(!p.matches("Jan"));
        assert!(LikePattern::new("*").matches(""));
        assert!(LikePattern::new("Doe").matches("Doe"));
        assert!(!LikePattern::new("Doe").matches("Does"));
        assert!(LikePattern::new("*oe").matches("Doe"));
        assert!(LikePattern::new("D*").matches("D"));
        assert!(!LikePattern::new("ab*ba").matches("aba"));
    }

    #[test]
    fn numeric_ordering_crosses_kinds() {
        assert_eq!(cmp_values(&Value::Integer(2), &Value::Float(2.5)), Some(Ordering::Less));
        assert_eq!(cmp_values(&Value::Float(f64::NAN), &Value::Float(1.0)), None);
        assert_eq!(cmp_values(&Value::String("a".into()), &Value::Integer(1)), None);
        assert!(values_equal(&Value::Float(0.0), &Value::Float(-0.0)));
        assert!(!values_equal(&Value::Float(f64::NAN), &Value::Float(f64::NAN)));
    }
}
