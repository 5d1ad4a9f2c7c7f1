use std::fmt;
use std::sync::Arc;

use crate::errors::{QueryError, Result};
use crate::operator::Operator;
use crate::value::{Canonicalize, Value, ValueKind};

/// Reads one property from a domain instance; `None` means the value is absent.
pub type Accessor<T> = Arc<dyn Fn(&T) -> Option<Value> + Send + Sync>;

/// Metadata for one filterable property of `T`.
pub struct PropertyDescriptor<T> {
    name: String,
    kind: ValueKind,
    accessor: Accessor<T>,
    operators: &'static [Operator],
    variants: Option<&'static [&'static str]>,
    codec: Option<Canonicalize>,
}

impl<T> PropertyDescriptor<T> {
    pub fn new<F>(name: impl Into<String>, kind: ValueKind, accessor: F) -> Self
    where
        F: Fn(&T) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            kind,
            accessor: Arc::new(accessor),
            operators: Operator::allowed_for(kind),
            variants: None,
            codec: None,
        }
    }

    /// Restrict an enum property to the given variant names.
    pub fn with_variants(mut self, variants: &'static [&'static str]) -> Self {
        self.variants = Some(variants);
        self
    }

    /// Route literals of a custom property through its codec.
    pub fn with_codec(mut self, codec: Canonicalize) -> Self {
        self.codec = Some(codec);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    pub fn operators(&self) -> &'static [Operator] {
        self.operators
    }

    pub fn supports(&self, operator: Operator) -> bool {
        self.operators.contains(&operator)
    }

    pub fn extract(&self, instance: &T) -> Option<Value> {
        (self.accessor)(instance)
    }

    pub(crate) fn accessor(&self) -> Accessor<T> {
        Arc::clone(&self.accessor)
    }

    pub fn check_operator(&self, operator: Operator) -> Result<()> {
        if self.supports(operator) {
            Ok(())
        } else {
            Err(QueryError::UnsupportedOperator {
                operator: operator.symbol().to_string(),
                property: self.name.clone(),
                kind: self.kind,
            })
        }
    }

    /// The kind operands of `operator` are coerced to; `=ex=` always takes a boolean.
    pub fn operand_kind(&self, operator: Operator) -> ValueKind {
        match operator {
            Operator::Exists => ValueKind::Boolean,
            _ => self.kind,
        }
    }

    /// Coerce a literal from query text into an operand for `operator`.
    pub fn coerce(&self, operator: Operator, literal: &str) -> Result<Value> {
        let kind = self.operand_kind(operator);
        let fail = || QueryError::ValueCoercion {
            literal: literal.to_string(),
            target: kind,
        };
        match (kind, self.variants, self.codec) {
            (ValueKind::Enum, Some(variants), _) if !variants.contains(&literal) => Err(fail()),
            // Store the canonical text so equality does not depend on spelling.
            (ValueKind::Custom, _, Some(codec)) => codec(literal).map(Value::Custom).ok_or_else(fail),
            _ => kind.coerce(literal),
        }
    }
}

/// Reads one entry of a map-valued property by key.
pub type KeyedAccessor<T> = Arc<dyn Fn(&T, &str) -> Option<Value> + Send + Sync>;

/// A map-valued property: `prefix.<key>` addresses the entry under `key`.
pub struct MapDescriptor<T> {
    prefix: String,
    kind: ValueKind,
    accessor: KeyedAccessor<T>,
}

impl<T: 'static> MapDescriptor<T> {
    pub fn new<F>(prefix: impl Into<String>, kind: ValueKind, accessor: F) -> Self
    where
        F: Fn(&T, &str) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            prefix: prefix.into(),
            kind,
            accessor: Arc::new(accessor),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Descriptor for the entry under `key`, named `prefix.key`.
    pub fn entry(&self, key: &str) -> PropertyDescriptor<T> {
        let accessor = Arc::clone(&self.accessor);
        let owned = key.to_string();
        PropertyDescriptor::new(
            format!("{}.{}", self.prefix, key),
            self.kind,
            move |t: &T| accessor(t, &owned),
        )
    }
}

impl<T> fmt::Debug for MapDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapDescriptor")
            .field("prefix", &self.prefix)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl<T> Clone for PropertyDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            kind: self.kind,
            accessor: Arc::clone(&self.accessor),
            operators: self.operators,
            variants: self.variants,
            codec: self.codec,
        }
    }
}

impl<T> fmt::Debug for PropertyDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("operators", &self.operators)
            .field("variants", &self.variants)
            .field("codec", &self.codec.is_some())
            .finish_non_exhaustive()
    }
}
