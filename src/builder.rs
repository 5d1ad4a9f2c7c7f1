//! Typed property cursors.
//!
//! A cursor is bound to one property name and only offers the operators its
//! value kind supports, so a query assembled through cursors always passes the
//! operator and coercion checks the parser performs on text.

use std::borrow::Cow;
use std::marker::PhantomData;

use chrono::{DateTime, Utc};

use crate::ast::{Node, Operand};
use crate::operator::Operator;
use crate::query::Query;
use crate::registry::RegistryBuilder;
use crate::value::{canonical, Canonicalize, FilterEnum, IntoValue, Numeric, PropertyCodec, Value, ValueKind};

/// Implemented by every cursor type; ties a cursor to its native Rust type and value kind.
pub trait Cursor<T>: Sized {
    /// What the property accessor returns.
    type Native;

    const KIND: ValueKind;

    fn bind(name: &'static str) -> Self;

    fn into_value(native: Self::Native) -> Value;

    /// Accepted variant names, for enum-valued properties.
    fn variants() -> Option<&'static [&'static str]> {
        None
    }

    /// Literal canonicalisation, for custom-typed properties.
    fn codec() -> Option<Canonicalize> {
        None
    }
}

fn single<T>(name: &str, operator: Operator, value: Value) -> Query<T> {
    Query::from_node(Node::comparison(name, operator, Operand::Single(value)))
}

fn list<T>(name: &str, operator: Operator, values: Vec<Value>) -> Query<T> {
    Query::from_node(Node::comparison(name, operator, Operand::List(values)))
}

// `bind` and `declare` are what `filterable!` calls, by type path; `declare`
// checks the accessor closure against the cursor's native type.
macro_rules! binding_methods {
    ($native:ty) => {
        pub fn bind(name: &'static str) -> Self {
            Self {
                name: Cow::Borrowed(name),
                _domain: PhantomData,
            }
        }

        pub fn declare<F>(builder: RegistryBuilder<T>, name: &'static str, accessor: F) -> RegistryBuilder<T>
        where
            T: 'static,
            F: Fn(&T) -> Option<$native> + Send + Sync + 'static,
        {
            builder.property::<Self, F>(name, accessor)
        }
    };
}

macro_rules! presence_methods {
    () => {
        /// `name=ex=true`
        pub fn exists(&self) -> Query<T> {
            single(&self.name, Operator::Exists, Value::Boolean(true))
        }

        /// `name=ex=false`
        pub fn does_not_exist(&self) -> Query<T> {
            single(&self.name, Operator::Exists, Value::Boolean(false))
        }

        pub fn name(&self) -> &str {
            &self.name
        }
    };
}

pub struct StringProperty<T> {
    name: Cow<'static, str>,
    _domain: PhantomData<fn(&T)>,
}

impl<T> Cursor<T> for StringProperty<T> {
    type Native = String;
    const KIND: ValueKind = ValueKind::String;

    fn bind(name: &'static str) -> Self {
        Self::bind(name)
    }

    fn into_value(native: String) -> Value {
        Value::String(native)
    }
}

impl<T> StringProperty<T> {
    presence_methods!();
    binding_methods!(String);

    pub fn eq(&self, value: impl Into<String>) -> Query<T> {
        single(&self.name, Operator::Eq, Value::String(value.into()))
    }

    pub fn ne(&self, value: impl Into<String>) -> Query<T> {
        single(&self.name, Operator::Ne, Value::String(value.into()))
    }

    /// `*` in `pattern` matches any run of characters.
    pub fn like(&self, pattern: impl Into<String>) -> Query<T> {
        single(&self.name, Operator::Like, Value::String(pattern.into()))
    }

    /// `=re=` with the source text of an already compiled `regex`.
    pub fn pattern(&self, regex: &regex::Regex) -> Query<T> {
        single(&self.name, Operator::Regex, Value::String(regex.as_str().to_string()))
    }

    pub fn lexically_after(&self, value: impl Into<String>) -> Query<T> {
        single(&self.name, Operator::Gt, Value::String(value.into()))
    }

    pub fn lexically_not_before(&self, value: impl Into<String>) -> Query<T> {
        single(&self.name, Operator::Ge, Value::String(value.into()))
    }

    pub fn lexically_before(&self, value: impl Into<String>) -> Query<T> {
        single(&self.name, Operator::Lt, Value::String(value.into()))
    }

    pub fn lexically_not_after(&self, value: impl Into<String>) -> Query<T> {
        single(&self.name, Operator::Le, Value::String(value.into()))
    }

    pub fn value_in<I, S>(&self, values: I) -> Query<T>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        list(&self.name, Operator::In, strings(values))
    }

    pub fn value_not_in<I, S>(&self, values: I) -> Query<T>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        list(&self.name, Operator::Out, strings(values))
    }
}

fn strings<I, S>(values: I) -> Vec<Value>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    values.into_iter().map(|s| Value::String(s.into())).collect()
}

pub struct NumberProperty<T, N> {
    name: Cow<'static, str>,
    _domain: PhantomData<fn(&T, N)>,
}

impl<T, N: Numeric> Cursor<T> for NumberProperty<T, N> {
    type Native = N;
    const KIND: ValueKind = N::KIND;

    fn bind(name: &'static str) -> Self {
        Self::bind(name)
    }

    fn into_value(native: N) -> Value {
        native.into_value()
    }
}

impl<T, N: Numeric> NumberProperty<T, N> {
    presence_methods!();
    binding_methods!(N);

    pub fn eq(&self, value: N) -> Query<T> {
        single(&self.name, Operator::Eq, value.into_value())
    }

    pub fn ne(&self, value: N) -> Query<T> {
        single(&self.name, Operator::Ne, value.into_value())
    }

    pub fn gt(&self, value: N) -> Query<T> {
        single(&self.name, Operator::Gt, value.into_value())
    }

    pub fn ge(&self, value: N) -> Query<T> {
        single(&self.name, Operator::Ge, value.into_value())
    }

    pub fn lt(&self, value: N) -> Query<T> {
        single(&self.name, Operator::Lt, value.into_value())
    }

    pub fn le(&self, value: N) -> Query<T> {
        single(&self.name, Operator::Le, value.into_value())
    }

    /// Inclusive range, `name=ge=low;name=le=high`.
    pub fn between(&self, low: N, high: N) -> Query<T> {
        self.ge(low).and(self.le(high))
    }

    pub fn value_in<I: IntoIterator<Item = N>>(&self, values: I) -> Query<T> {
        list(&self.name, Operator::In, values.into_iter().map(IntoValue::into_value).collect())
    }

    pub fn value_not_in<I: IntoIterator<Item = N>>(&self, values: I) -> Query<T> {
        list(&self.name, Operator::Out, values.into_iter().map(IntoValue::into_value).collect())
    }
}

pub struct BooleanProperty<T> {
    name: Cow<'static, str>,
    _domain: PhantomData<fn(&T)>,
}

impl<T> Cursor<T> for BooleanProperty<T> {
    type Native = bool;
    const KIND: ValueKind = ValueKind::Boolean;

    fn bind(name: &'static str) -> Self {
        Self::bind(name)
    }

    fn into_value(native: bool) -> Value {
        Value::Boolean(native)
    }
}

impl<T> BooleanProperty<T> {
    presence_methods!();
    binding_methods!(bool);

    pub fn is_true(&self) -> Query<T> {
        self.eq(true)
    }

    pub fn is_false(&self) -> Query<T> {
        self.eq(false)
    }

    pub fn eq(&self, value: bool) -> Query<T> {
        single(&self.name, Operator::Eq, Value::Boolean(value))
    }

    pub fn ne(&self, value: bool) -> Query<T> {
        single(&self.name, Operator::Ne, Value::Boolean(value))
    }
}

pub struct InstantProperty<T> {
    name: Cow<'static, str>,
    _domain: PhantomData<fn(&T)>,
}

impl<T> Cursor<T> for InstantProperty<T> {
    type Native = DateTime<Utc>;
    const KIND: ValueKind = ValueKind::Instant;

    fn bind(name: &'static str) -> Self {
        Self::bind(name)
    }

    fn into_value(native: DateTime<Utc>) -> Value {
        Value::Instant(native)
    }
}

impl<T> InstantProperty<T> {
    presence_methods!();
    binding_methods!(DateTime<Utc>);

    pub fn eq(&self, instant: DateTime<Utc>) -> Query<T> {
        single(&self.name, Operator::Eq, Value::Instant(instant))
    }

    pub fn ne(&self, instant: DateTime<Utc>) -> Query<T> {
        single(&self.name, Operator::Ne, Value::Instant(instant))
    }

    /// `=lt=` when `exclusive`, otherwise `=le=`.
    pub fn before(&self, instant: DateTime<Utc>, exclusive: bool) -> Query<T> {
        let op = if exclusive { Operator::Lt } else { Operator::Le };
        single(&self.name, op, Value::Instant(instant))
    }

    /// `=gt=` when `exclusive`, otherwise `=ge=`.
    pub fn after(&self, instant: DateTime<Utc>, exclusive: bool) -> Query<T> {
        let op = if exclusive { Operator::Gt } else { Operator::Ge };
        single(&self.name, op, Value::Instant(instant))
    }

    /// Strictly after `after` and strictly before `before`.
    pub fn between(&self, after: DateTime<Utc>, before: DateTime<Utc>) -> Query<T> {
        self.after(after, true).and(self.before(before, true))
    }
}

pub struct EnumProperty<T, E> {
    name: Cow<'static, str>,
    _domain: PhantomData<fn(&T, E)>,
}

impl<T, E: FilterEnum> Cursor<T> for EnumProperty<T, E> {
    type Native = E;
    const KIND: ValueKind = ValueKind::Enum;

    fn bind(name: &'static str) -> Self {
        Self::bind(name)
    }

    fn into_value(native: E) -> Value {
        variant(&native)
    }

    fn variants() -> Option<&'static [&'static str]> {
        Some(E::VARIANTS)
    }
}

fn variant<E: FilterEnum>(value: &E) -> Value {
    Value::Enum(value.variant_name().to_string())
}

impl<T, E: FilterEnum> EnumProperty<T, E> {
    presence_methods!();
    binding_methods!(E);

    pub fn eq(&self, value: E) -> Query<T> {
        single(&self.name, Operator::Eq, variant(&value))
    }

    pub fn ne(&self, value: E) -> Query<T> {
        single(&self.name, Operator::Ne, variant(&value))
    }

    pub fn value_in<I: IntoIterator<Item = E>>(&self, values: I) -> Query<T> {
        list(&self.name, Operator::In, values.into_iter().map(|v| variant(&v)).collect())
    }

    pub fn value_not_in<I: IntoIterator<Item = E>>(&self, values: I) -> Query<T> {
        list(&self.name, Operator::Out, values.into_iter().map(|v| variant(&v)).collect())
    }
}

/// A user-defined type compared through its [`PropertyCodec`] text.
pub struct CustomProperty<T, V> {
    name: Cow<'static, str>,
    _domain: PhantomData<fn(&T, V)>,
}

impl<T, V: PropertyCodec> Cursor<T> for CustomProperty<T, V> {
    type Native = V;
    const KIND: ValueKind = ValueKind::Custom;

    fn bind(name: &'static str) -> Self {
        Self::bind(name)
    }

    fn into_value(native: V) -> Value {
        Value::Custom(native.encode())
    }

    fn codec() -> Option<Canonicalize> {
        Some(canonical::<V>)
    }
}

impl<T, V: PropertyCodec> CustomProperty<T, V> {
    presence_methods!();
    binding_methods!(V);

    pub fn eq(&self, value: &V) -> Query<T> {
        single(&self.name, Operator::Eq, Value::Custom(value.encode()))
    }

    pub fn ne(&self, value: &V) -> Query<T> {
        single(&self.name, Operator::Ne, Value::Custom(value.encode()))
    }

    pub fn value_in<'v, I: IntoIterator<Item = &'v V>>(&self, values: I) -> Query<T> {
        list(&self.name, Operator::In, values.into_iter().map(|v| Value::Custom(v.encode())).collect())
    }

    pub fn value_not_in<'v, I: IntoIterator<Item = &'v V>>(&self, values: I) -> Query<T> {
        list(&self.name, Operator::Out, values.into_iter().map(|v| Value::Custom(v.encode())).collect())
    }
}

/// A map of string values; each key is addressed as `name.key`.
pub struct StringMapProperty<T> {
    name: &'static str,
    _domain: PhantomData<fn(&T)>,
}

impl<T> StringMapProperty<T> {
    pub fn bind(name: &'static str) -> Self {
        Self {
            name,
            _domain: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// String cursor over the entry under `key`. Keys are written into the
    /// selector as-is, so they must be letters, digits, `_` or `.`.
    pub fn entry(&self, key: &str) -> StringProperty<T> {
        StringProperty {
            name: Cow::Owned(format!("{}.{}", self.name, key)),
            _domain: PhantomData,
        }
    }

    pub fn declare<F>(builder: RegistryBuilder<T>, name: &'static str, accessor: F) -> RegistryBuilder<T>
    where
        T: 'static,
        F: Fn(&T, &str) -> Option<String> + Send + Sync + 'static,
    {
        builder.string_map(name, accessor)
    }
}
