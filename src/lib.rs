//! Typed RSQL filters: build them fluently, render them as text, parse the
//! text back, and compile either form into an in-memory predicate.
//!
//! ```text
//! builder ──▶ Node ──serialize──▶ "lastName==Doe;age=gt=20" ──parse──▶ Node ──compile──▶ Fn(&T) -> bool
//! ```

pub mod errors;
pub mod options;
mod macros;
mod ast;
mod builder;
mod comparison;
mod compiler;
mod grammar;
mod operator;
mod parser;
mod property;
mod query;
mod registry;
mod serializer;
mod value;

pub use ast::{Comparison, Node, Operand};
pub use builder::{
    BooleanProperty, Cursor, CustomProperty, EnumProperty, InstantProperty, NumberProperty,
    StringMapProperty, StringProperty,
};
pub use comparison::LikePattern;
pub use compiler::{compile, Predicate};
pub use errors::{QueryError, Result};
pub use operator::Operator;
pub use options::{AbsentPolicy, CompileOptions, ParseOptions};
pub use property::{Accessor, KeyedAccessor, MapDescriptor, PropertyDescriptor};
pub use query::Query;
pub use registry::{Filterable, PropertyRegistry, RegistryBuilder};
pub use serializer::serialize;
pub use value::{
    canonical, Canonicalize, FilterEnum, IntoValue, Numeric, PropertyCodec, Value, ValueKind,
};

/// Parse `text` against `registry` with default options.
pub fn parse<T: 'static>(text: &str, registry: &PropertyRegistry<T>) -> Result<Query<T>> {
    Query::parse_with(text, registry, &ParseOptions::default())
}
