/// Declare the filterable properties of a domain type.
///
/// Generates a unit builder struct with one cursor-returning method per
/// property and implements [`Filterable`](crate::Filterable) for the domain
/// type with a registry built once on first use.
///
/// Each accessor is checked against its cursor's `declare`: `|p| Option<Native>`
/// for scalar cursors, `|p, key| Option<String>` for `StringMapProperty`.
///
/// ```
/// use std::collections::HashMap;
/// use rsql_filter::{filterable, Query};
///
/// pub struct Person {
///     last_name: String,
///     age: u8,
///     tags: HashMap<String, String>,
/// }
///
/// filterable! {
///     pub struct PersonQuery for Person {
///         last_name("lastName"): StringProperty => |p| Some(p.last_name.clone()),
///         age("age"): NumberProperty<u8> => |p| Some(p.age),
///         tags("tags"): StringMapProperty => |p, key| p.tags.get(key).cloned(),
///     }
/// }
///
/// let q = PersonQuery.last_name().eq("Doe").and(PersonQuery.age().gt(20));
/// assert_eq!(q.to_string(), "lastName==Doe;age=gt=20");
/// assert_eq!(Query::<Person>::parse("lastName==Doe;age=gt=20").unwrap(), q);
///
/// let tagged = PersonQuery.tags().entry("team").eq("core");
/// assert_eq!(Query::<Person>::parse("tags.team==core").unwrap(), tagged);
/// ```
#[macro_export]
macro_rules! filterable {
    (
        $(#[$meta:meta])*
        $vis:vis struct $query:ident for $domain:ty {
            $(
                $(#[$pmeta:meta])*
                $method:ident ($name:literal) : $cursor:ident $(< $native:ty >)? => $accessor:expr
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default)]
        $vis struct $query;

        impl $query {
            $(
                $(#[$pmeta])*
                pub fn $method(self) -> $crate::$cursor<$domain $(, $native)?> {
                    $crate::$cursor::<$domain $(, $native)?>::bind($name)
                }
            )*

            /// Parse query text against this type's registry.
            pub fn parse(self, text: &str) -> $crate::Result<$crate::Query<$domain>> {
                $crate::Query::<$domain>::parse(text)
            }
        }

        impl $crate::Filterable for $domain {
            fn registry() -> &'static $crate::PropertyRegistry<Self> {
                static REGISTRY: ::std::sync::OnceLock<$crate::PropertyRegistry<$domain>> =
                    ::std::sync::OnceLock::new();
                $crate::PropertyRegistry::cached(&REGISTRY, || {
                    let builder = $crate::PropertyRegistry::builder();
                    $(
                        let builder =
                            $crate::$cursor::<$domain $(, $native)?>::declare(builder, $name, $accessor);
                    )*
                    builder.build()
                })
            }
        }
    };
}
