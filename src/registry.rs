use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::builder::Cursor;
use crate::errors::{QueryError, Result};
use crate::property::{MapDescriptor, PropertyDescriptor};
use crate::value::{IntoValue, Value, ValueKind};

/// A domain type whose properties can be filtered on.
///
/// Implementations hand out a process-wide registry built at most once, usually
/// through the [`filterable!`](crate::filterable) macro.
pub trait Filterable: Sized + 'static {
    fn registry() -> &'static PropertyRegistry<Self>;
}

/// Name → descriptor lookup for one domain type. Immutable once built.
pub struct PropertyRegistry<T> {
    descriptors: Vec<PropertyDescriptor<T>>,
    by_name: HashMap<String, usize>,
    maps: Vec<MapDescriptor<T>>,
}

impl<T: 'static> PropertyRegistry<T> {
    pub fn builder() -> RegistryBuilder<T> {
        RegistryBuilder {
            descriptors: Vec::new(),
            maps: Vec::new(),
        }
    }

    /// Initialise `cell` with `init` unless another caller already has.
    ///
    /// Concurrent first calls block on the cell until the single initialiser
    /// finishes; later calls are a plain atomic load.
    pub fn cached<F>(cell: &'static OnceLock<Self>, init: F) -> &'static Self
    where
        F: FnOnce() -> Self,
    {
        cell.get_or_init(|| {
            let registry = init();
            tracing::debug!(
                domain = std::any::type_name::<T>(),
                properties = registry.len(),
                maps = registry.maps.len(),
                "property registry built"
            );
            registry
        })
    }

    /// Case-sensitive exact lookup, then `prefix.key` against map-valued properties.
    pub fn get(&self, name: &str) -> Option<Cow<'_, PropertyDescriptor<T>>> {
        if let Some(&i) = self.by_name.get(name) {
            return Some(Cow::Borrowed(&self.descriptors[i]));
        }
        // Shortest matching prefix wins; the key is everything after it.
        name.match_indices('.').find_map(|(at, _)| {
            let (prefix, key) = (&name[..at], &name[at + 1..]);
            if key.is_empty() {
                return None;
            }
            self.map(prefix).map(|m| Cow::Owned(m.entry(key)))
        })
    }

    pub(crate) fn resolve(
        &self,
        name: &str,
        position: usize,
    ) -> Result<Cow<'_, PropertyDescriptor<T>>> {
        self.get(name).ok_or_else(|| QueryError::UnknownProperty {
            name: name.to_string(),
            position,
        })
    }

    pub fn map(&self, prefix: &str) -> Option<&MapDescriptor<T>> {
        self.maps.iter().find(|m| m.prefix() == prefix)
    }

    /// Descriptors in declaration order; map-valued properties are not included.
    pub fn iter(&self) -> impl Iterator<Item = &PropertyDescriptor<T>> {
        self.descriptors.iter()
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty() && self.maps.is_empty()
    }
}

impl<T> std::fmt::Debug for PropertyRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.descriptors.iter())
            .entries(self.maps.iter())
            .finish()
    }
}

pub struct RegistryBuilder<T> {
    descriptors: Vec<PropertyDescriptor<T>>,
    maps: Vec<MapDescriptor<T>>,
}

impl<T: 'static> RegistryBuilder<T> {
    /// Add a descriptor. A later descriptor with the same name replaces the earlier one.
    pub fn descriptor(mut self, descriptor: PropertyDescriptor<T>) -> Self {
        if let Some(slot) = self
            .descriptors
            .iter_mut()
            .find(|d| d.name() == descriptor.name())
        {
            tracing::warn!(property = descriptor.name(), "duplicate property declaration replaced");
            *slot = descriptor;
        } else {
            self.descriptors.push(descriptor);
        }
        self
    }

    /// Declare a property through its typed cursor, e.g. `StringProperty<T>`.
    pub fn property<C, F>(self, name: &'static str, accessor: F) -> Self
    where
        C: Cursor<T>,
        F: Fn(&T) -> Option<C::Native> + Send + Sync + 'static,
    {
        let mut descriptor =
            PropertyDescriptor::new(name, C::KIND, move |t: &T| accessor(t).map(C::into_value));
        if let Some(variants) = C::variants() {
            descriptor = descriptor.with_variants(variants);
        }
        if let Some(codec) = C::codec() {
            descriptor = descriptor.with_codec(codec);
        }
        self.descriptor(descriptor)
    }

    /// Declare an untyped property; used when the schema is only known at runtime.
    pub fn dynamic<F>(self, name: impl Into<String>, kind: ValueKind, accessor: F) -> Self
    where
        F: Fn(&T) -> Option<Value> + Send + Sync + 'static,
    {
        self.descriptor(PropertyDescriptor::new(name, kind, accessor))
    }

    pub fn string<F, S>(self, name: &'static str, accessor: F) -> Self
    where
        F: Fn(&T) -> Option<S> + Send + Sync + 'static,
        S: IntoValue,
    {
        self.dynamic(name, ValueKind::String, move |t: &T| {
            accessor(t).map(IntoValue::into_value)
        })
    }

    /// Declare a map-valued property whose entries are read by key.
    pub fn map<F>(mut self, prefix: impl Into<String>, kind: ValueKind, accessor: F) -> Self
    where
        F: Fn(&T, &str) -> Option<Value> + Send + Sync + 'static,
    {
        let map = MapDescriptor::new(prefix, kind, accessor);
        if let Some(slot) = self.maps.iter_mut().find(|m| m.prefix() == map.prefix()) {
            tracing::warn!(property = map.prefix(), "duplicate map declaration replaced");
            *slot = map;
        } else {
            self.maps.push(map);
        }
        self
    }

    /// A map of string values, e.g. `tags.<key>`.
    pub fn string_map<F>(self, prefix: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&T, &str) -> Option<String> + Send + Sync + 'static,
    {
        self.map(prefix, ValueKind::String, move |t: &T, key: &str| {
            accessor(t, key).map(Value::String)
        })
    }

    pub fn build(self) -> PropertyRegistry<T> {
        let by_name = self
            .descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name().to_string(), i))
            .collect();
        PropertyRegistry {
            descriptors: self.descriptors,
            by_name,
            maps: self.maps,
        }
    }
}
