//! The `entity!` declarative macro.
//!
//! `entity!` is the primary way application code opts a type into the
//! metadata cache: it emits the plain Rust item plus a complete
//! [`Reflected`] implementation whose accessor thunks are baked at compile
//! time. Shapes the macro cannot express (indexed properties, methods,
//! custom collection capabilities) fall back to implementing [`Reflected`]
//! by hand through [`TypeShapeBuilder`].
//!
//! [`Reflected`]: crate::metadata::Reflected
//! [`TypeShapeBuilder`]: crate::metadata::TypeShapeBuilder

/// Declare an entity struct or enum and derive its [`Reflected`] shape.
///
/// # Struct form
///
/// Every field becomes a public property with a generated getter and setter.
/// Field tags adjust the metadata:
///
/// - `#[readonly]` — no setter at any visibility
/// - `#[hidden]` — the property and its setter are non-public
/// - `#[set(private)]` — public property, non-public setter; population
///   resolves it late through `ensure_setter`
/// - `#[attr("Name")]` — record the presence of a custom attribute
///
/// Fields require a trailing comma.
///
/// ```rust
/// use rowcast::entity;
///
/// entity! {
///     pub struct Customer {
///         customer_id: i32,
///         customer_name: String,
///         #[set(private)]
///         row_version: i64,
///     }
/// }
/// ```
///
/// # Enum form
///
/// Variants carry explicit discriminants; the first variant is the default.
/// Enum values cross the cell boundary as 32-bit integers.
///
/// ```rust
/// use rowcast::entity;
///
/// entity! {
///     pub enum OrderStatus {
///         Open = 1,
///         Shipped = 2,
///         Cancelled = 3,
///     }
/// }
/// ```
///
/// [`Reflected`]: crate::metadata::Reflected
#[macro_export]
macro_rules! entity {
    // ------------------------------------------------------------------
    // Struct form
    // ------------------------------------------------------------------
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $($body:tt)*
        }
    ) => {
        $crate::entity!(@munch $name, [$(#[$meta])*], [], [], $($body)*);
    };

    // Terminal: emit the struct and its Reflected implementation
    (@munch $name:ident, [$($meta:tt)*], [$($struct_fields:tt)*], [$($blueprints:tt)*], ) => {
        $($meta)*
        #[derive(Debug, Default, Clone, PartialEq)]
        pub struct $name {
            $($struct_fields)*
        }

        impl $crate::metadata::Reflected for $name {
            fn shape() -> $crate::metadata::TypeShape {
                $crate::metadata::TypeShape::builder(stringify!($name))
                    .constructor($crate::accessor::constructor::<$name>())
                    $($blueprints)*
                    .finish()
            }

            fn cell_kind() -> $crate::convert::CellKind {
                $crate::convert::CellKind::Object
            }

            fn from_value(value: $crate::convert::CellValue) -> $crate::Result<Self> {
                value.downcast_ref::<$name>().cloned().ok_or_else(|| {
                    $crate::Error::ConversionInvalid {
                        from: value.kind(),
                        to: $crate::convert::CellKind::Object,
                    }
                })
            }

            fn to_value(&self) -> $crate::convert::CellValue {
                $crate::convert::CellValue::object(self.clone())
            }
        }
    };

    // Read-only property: getter only
    (@munch $name:ident, [$($meta:tt)*], [$($struct_fields:tt)*], [$($blueprints:tt)*],
        #[readonly] $field:ident : $fty:ty , $($rest:tt)*
    ) => {
        $crate::entity!(@munch $name, [$($meta)*],
            [$($struct_fields)* pub $field: $fty,],
            [$($blueprints)* .property($crate::entity!(@getter $name, $field, $fty, Public))],
            $($rest)*
        );
    };

    // Hidden property: non-public getter and setter
    (@munch $name:ident, [$($meta:tt)*], [$($struct_fields:tt)*], [$($blueprints:tt)*],
        #[hidden] $field:ident : $fty:ty , $($rest:tt)*
    ) => {
        $crate::entity!(@munch $name, [$($meta)*],
            [$($struct_fields)* pub $field: $fty,],
            [$($blueprints)* .property(
                $crate::entity!(@getter $name, $field, $fty, Private)
                    .with_setter(
                        $crate::metadata::Visibility::Private,
                        $crate::entity!(@setter $name, $field, $fty),
                    )
            )],
            $($rest)*
        );
    };

    // Public property with a non-public setter
    (@munch $name:ident, [$($meta:tt)*], [$($struct_fields:tt)*], [$($blueprints:tt)*],
        #[set(private)] $field:ident : $fty:ty , $($rest:tt)*
    ) => {
        $crate::entity!(@munch $name, [$($meta)*],
            [$($struct_fields)* pub $field: $fty,],
            [$($blueprints)* .property(
                $crate::entity!(@getter $name, $field, $fty, Public)
                    .with_setter(
                        $crate::metadata::Visibility::Private,
                        $crate::entity!(@setter $name, $field, $fty),
                    )
            )],
            $($rest)*
        );
    };

    // Attributed property: otherwise plain
    (@munch $name:ident, [$($meta:tt)*], [$($struct_fields:tt)*], [$($blueprints:tt)*],
        #[attr($attr:literal)] $field:ident : $fty:ty , $($rest:tt)*
    ) => {
        $crate::entity!(@munch $name, [$($meta)*],
            [$($struct_fields)* pub $field: $fty,],
            [$($blueprints)* .property(
                $crate::entity!(@getter $name, $field, $fty, Public)
                    .with_setter(
                        $crate::metadata::Visibility::Public,
                        $crate::entity!(@setter $name, $field, $fty),
                    )
                    .with_attribute($attr)
            )],
            $($rest)*
        );
    };

    // Plain property: public getter and setter
    (@munch $name:ident, [$($meta:tt)*], [$($struct_fields:tt)*], [$($blueprints:tt)*],
        $field:ident : $fty:ty , $($rest:tt)*
    ) => {
        $crate::entity!(@munch $name, [$($meta)*],
            [$($struct_fields)* pub $field: $fty,],
            [$($blueprints)* .property(
                $crate::entity!(@getter $name, $field, $fty, Public)
                    .with_setter(
                        $crate::metadata::Visibility::Public,
                        $crate::entity!(@setter $name, $field, $fty),
                    )
            )],
            $($rest)*
        );
    };

    // A property blueprint with its getter installed
    (@getter $name:ident, $field:ident, $fty:ty, $visibility:ident) => {
        $crate::metadata::PropertyBlueprint::new(
            stringify!($field),
            $crate::metadata::Visibility::$visibility,
            <$fty as $crate::metadata::Reflected>::cell_kind(),
            |registry| registry.describe::<$fty>(),
            $crate::accessor::getter(|entity: &$name| {
                $crate::metadata::Reflected::to_value(&entity.$field)
            }),
        )
    };

    // The strict setter thunk for one field
    (@setter $name:ident, $field:ident, $fty:ty) => {
        $crate::accessor::setter(|entity: &mut $name, value| {
            entity.$field = <$fty as $crate::metadata::Reflected>::from_value(value)?;
            Ok(())
        })
    };

    // ------------------------------------------------------------------
    // Enum form
    // ------------------------------------------------------------------
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $first:ident = $first_value:expr
            $(, $variant:ident = $value:expr)* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $first = $first_value,
            $($variant = $value,)*
        }

        impl ::core::default::Default for $name {
            fn default() -> Self {
                $name::$first
            }
        }

        impl $crate::metadata::Reflected for $name {
            fn shape() -> $crate::metadata::TypeShape {
                $crate::metadata::TypeShape::builder(stringify!($name))
                    .traits($crate::metadata::ShapeTraits::ENUM)
                    .cell_kind($crate::convert::CellKind::I32)
                    .constructor($crate::accessor::constructor::<$name>())
                    .finish()
            }

            fn cell_kind() -> $crate::convert::CellKind {
                $crate::convert::CellKind::I32
            }

            fn from_value(value: $crate::convert::CellValue) -> $crate::Result<Self> {
                let raw = match value.kind() {
                    $crate::convert::CellKind::I8
                    | $crate::convert::CellKind::I16
                    | $crate::convert::CellKind::I32
                    | $crate::convert::CellKind::I64
                    | $crate::convert::CellKind::U8
                    | $crate::convert::CellKind::U16
                    | $crate::convert::CellKind::U32
                    | $crate::convert::CellKind::U64 => value.as_i64(),
                    _ => None,
                };
                let raw = raw.ok_or($crate::Error::ConversionInvalid {
                    from: value.kind(),
                    to: $crate::convert::CellKind::I32,
                })?;
                if raw == ($first_value as i64) {
                    return Ok($name::$first);
                }
                $(
                    if raw == ($value as i64) {
                        return Ok($name::$variant);
                    }
                )*
                Err($crate::Error::Error(format!(
                    "{raw} is not a declared value of `{}`",
                    stringify!($name)
                )))
            }

            fn to_value(&self) -> $crate::convert::CellValue {
                $crate::convert::CellValue::I32(*self as i32)
            }
        }
    };
}
