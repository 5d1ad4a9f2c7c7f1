use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{QueryError, Result};

/// The declared type of a property, which decides both coercion and the operator set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    String,
    Integer,
    Float,
    Boolean,
    Instant,
    Enum,
    /// User-defined type carried as canonical text, see [`PropertyCodec`].
    Custom,
}

impl ValueKind {
    /// Convert a literal taken from query text into a value of this kind.
    pub fn coerce(self, literal: &str) -> Result<Value> {
        let fail = || QueryError::ValueCoercion {
            literal: literal.to_string(),
            target: self,
        };
        match self {
            ValueKind::String => Ok(Value::String(literal.to_string())),
            ValueKind::Integer => literal
                .parse::<i64>()
                .map(Value::Integer)
                .map_err(|_| fail()),
            ValueKind::Float => literal
                .parse::<f64>()
                .map(Value::float)
                .map_err(|_| fail()),
            ValueKind::Boolean => {
                if literal.eq_ignore_ascii_case("true") {
                    Ok(Value::Boolean(true))
                } else if literal.eq_ignore_ascii_case("false") {
                    Ok(Value::Boolean(false))
                } else {
                    Err(fail())
                }
            }
            ValueKind::Instant => DateTime::parse_from_rfc3339(literal)
                .map(|dt| Value::Instant(dt.with_timezone(&Utc)))
                .map_err(|_| fail()),
            ValueKind::Enum if literal.is_empty() => Err(fail()),
            ValueKind::Enum => Ok(Value::Enum(literal.to_string())),
            ValueKind::Custom => Ok(Value::Custom(literal.to_string())),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::String => "string",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Boolean => "boolean",
            ValueKind::Instant => "instant",
            ValueKind::Enum => "enum",
            ValueKind::Custom => "custom",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for ValueKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "string" => Ok(ValueKind::String),
            "integer" => Ok(ValueKind::Integer),
            "float" => Ok(ValueKind::Float),
            "boolean" => Ok(ValueKind::Boolean),
            "instant" => Ok(ValueKind::Instant),
            "enum" => Ok(ValueKind::Enum),
            "custom" => Ok(ValueKind::Custom),
            other => Err(format!("unknown value kind `{other}`")),
        }
    }
}

/// A typed operand or extracted property value.
///
/// Floats compare and hash by bit pattern so that `Value` can take part in
/// structural equality of whole trees. Every NaN counts as the same value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Instant(DateTime<Utc>),
    Enum(String),
    Custom(String),
}

impl Value {
    /// A float value with NaN folded to a single bit pattern.
    pub fn float(f: f64) -> Value {
        Value::Float(if f.is_nan() { f64::NAN } else { f })
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            Value::String(_) => ValueKind::String,
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::Boolean(_) => ValueKind::Boolean,
            Value::Instant(_) => ValueKind::Instant,
            Value::Enum(_) => ValueKind::Enum,
            Value::Custom(_) => ValueKind::Custom,
        }
    }

    /// Canonical literal text, before any quoting.
    pub fn literal(&self) -> String {
        match self {
            Value::String(s) | Value::Enum(s) | Value::Custom(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => decimal(*f),
            Value::Boolean(b) => b.to_string(),
            Value::Instant(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Enum(s) | Value::Custom(s) => Some(s),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::String(a), Value::String(b))
            | (Value::Enum(a), Value::Enum(b))
            | (Value::Custom(a), Value::Custom(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => float_bits(*a) == float_bits(*b),
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Instant(a), Value::Instant(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            Value::String(s) | Value::Enum(s) | Value::Custom(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => float_bits(*f).hash(state),
            Value::Boolean(b) => b.hash(state),
            Value::Instant(dt) => dt.hash(state),
        }
    }
}

/// Shortest round-trip digits of `f`, written out in positional notation.
/// Non-finite values keep their `inf`/`NaN` spelling.
fn decimal(f: f64) -> String {
    let debug = format!("{f:?}");
    let Some((mantissa, exponent)) = debug.split_once('e') else {
        return debug;
    };
    let Ok(exponent) = exponent.parse::<i64>() else {
        return debug;
    };
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let digits = format!("{whole}{fraction}");
    // Position of the decimal point within `digits`.
    let point = whole.len() as i64 + exponent;
    let len = digits.len() as i64;
    if point <= 0 {
        format!("{sign}0.{}{digits}", "0".repeat(point.unsigned_abs() as usize))
    } else if point >= len {
        format!("{sign}{digits}{}.0", "0".repeat((point - len) as usize))
    } else {
        let (int, frac) = digits.split_at(point as usize);
        format!("{sign}{int}.{frac}")
    }
}

fn float_bits(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else {
        f.to_bits()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal())
    }
}

/// Conversion from native Rust values into [`Value`].
pub trait IntoValue {
    fn into_value(self) -> Value;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::String(self.to_string())
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Boolean(self)
    }
}

impl IntoValue for DateTime<Utc> {
    fn into_value(self) -> Value {
        Value::Instant(self)
    }
}

/// Native numeric types usable behind a [`NumberProperty`](crate::NumberProperty).
pub trait Numeric: IntoValue + Copy + Send + Sync + 'static {
    const KIND: ValueKind;
}

macro_rules! integer_values {
    ($($t:ty),*) => {
        $(
            impl IntoValue for $t {
                fn into_value(self) -> Value {
                    Value::Integer(i64::from(self))
                }
            }

            impl Numeric for $t {
                const KIND: ValueKind = ValueKind::Integer;
            }
        )*
    };
}

macro_rules! float_values {
    ($($t:ty),*) => {
        $(
            impl IntoValue for $t {
                fn into_value(self) -> Value {
                    Value::float(f64::from(self))
                }
            }

            impl Numeric for $t {
                const KIND: ValueKind = ValueKind::Float;
            }
        )*
    };
}

integer_values!(i8, i16, i32, i64, u8, u16, u32);
float_values!(f32, f64);

/// Enumerations filterable by variant name.
pub trait FilterEnum: Sized + Send + Sync + 'static {
    /// Every accepted variant name, as it appears in query text.
    const VARIANTS: &'static [&'static str];

    fn variant_name(&self) -> &'static str;
}

/// Text codec for a user-defined property type.
///
/// Values are compared by their encoded text, so `encode` must be canonical:
/// `decode(encode(v))` encodes back to the same string.
pub trait PropertyCodec: Sized + Send + Sync + 'static {
    fn encode(&self) -> String;

    /// `None` rejects the text as a literal of this type.
    fn decode(text: &str) -> Option<Self>;
}

/// Type-erased canonicalisation of a literal, stored on a property descriptor.
pub type Canonicalize = fn(&str) -> Option<String>;

/// Decode and re-encode `text`, yielding the canonical form.
pub fn canonical<V: PropertyCodec>(text: &str) -> Option<String> {
    V::decode(text).map(|v| v.encode())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn coerce_integer_rejects_text() {
        let err = ValueKind::Integer.coerce("abc").unwrap_err();
        assert_eq!(
            err,
            QueryError::ValueCoercion {
                literal: "abc".into(),
                target: ValueKind::Integer
            }
        );
    }

    #[test]
    fn coerce_each_kind() {
        assert_eq!(ValueKind::Integer.coerce("-42").unwrap(), Value::Integer(-42));
        assert_eq!(ValueKind::Float.coerce("20").unwrap(), Value::Float(20.0));
        assert_eq!(ValueKind::Boolean.coerce("TRUE").unwrap(), Value::Boolean(true));
        assert!(ValueKind::Boolean.coerce("yes").is_err());
        assert_eq!(
            ValueKind::Instant.coerce("2024-01-01T02:00:00+01:00").unwrap(),
            Value::Instant(Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap())
        );
        assert!(ValueKind::Enum.coerce("").is_err());
    }

    #[test]
    fn literals_are_canonical() {
        assert_eq!(Value::Integer(7).literal(), "7");
        assert_eq!(Value::Float(20.0).literal(), "20.0");
        assert_eq!(Value::Float(1e20).literal(), "100000000000000000000.0");
        assert_eq!(Value::Float(-1.5e-7).literal(), "-0.00000015");
        assert_eq!(Value::Float(1.25e17).literal(), "125000000000000000.0");
        assert_eq!(Value::Float(f64::NEG_INFINITY).literal(), "-inf");
        assert_eq!(
            Value::Instant(Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap()).literal(),
            "2024-01-01T01:00:00Z"
        );
    }

    #[test]
    fn decimal_floats_parse_back_exactly() {
        for f in [1e20, 1e-7, -2.5e-300, f64::MAX, f64::MIN_POSITIVE, 123456.789e15, 5e-324] {
            let text = Value::Float(f).literal();
            assert!(!text.contains('e'), "{text}");
            assert_eq!(ValueKind::Float.coerce(&text).unwrap(), Value::Float(f), "{text}");
        }
    }

    #[test]
    fn float_equality_is_bitwise() {
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Float(0.0), Value::Float(-0.0));
        assert_ne!(Value::Integer(1), Value::Float(1.0));
    }

    #[test]
    fn nan_sign_is_ignored() {
        let negative = Value::Float(-f64::NAN);
        assert_eq!(negative, Value::Float(f64::NAN));
        assert_eq!((-f64::NAN).into_value(), ValueKind::Float.coerce("NaN").unwrap());
        assert_eq!(negative.literal(), "NaN");
        if let Value::Float(f) = Value::float(-f64::NAN) {
            assert_eq!(f.to_bits(), f64::NAN.to_bits());
        }
    }

    #[derive(Debug, PartialEq)]
    struct Point(i32, i32);

    impl PropertyCodec for Point {
        fn encode(&self) -> String {
            format!("{},{}", self.0, self.1)
        }

        fn decode(text: &str) -> Option<Self> {
            let (x, y) = text.split_once(',')?;
            Some(Point(x.trim().parse().ok()?, y.trim().parse().ok()?))
        }
    }

    #[test]
    fn custom_values_canonicalise_through_their_codec() {
        assert_eq!(canonical::<Point>("1, 02"), Some("1,2".to_string()));
        assert_eq!(canonical::<Point>("1"), None);
        assert_eq!(ValueKind::Custom.coerce("x").unwrap(), Value::Custom("x".into()));
        assert_eq!("custom".parse::<ValueKind>(), Ok(ValueKind::Custom));
    }
}
