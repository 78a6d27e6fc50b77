//! Type metadata: shapes, cached descriptions and the process-wide registry.
//!
//! This module is the cache layer of the crate. A type declares itself once
//! through [`Reflected::shape`]; the [`TypeRegistry`] turns that blueprint
//! into a [`TypeDescription`] on first demand and every later access is a
//! lock-free read of the same instance. Descriptions carry the classification
//! tag, structural flags, generated accessor thunks and scope-keyed member
//! passes that materialization consumes.
//!
//! # Key Components
//!
//! - [`TypeRegistry`]: identity-keyed cache, at most one construction per type
//! - [`TypeDescription`]: per-type metadata with lazy member passes
//! - [`Reflected`]: the compile-time reflection seam types implement
//! - [`TypeShape`] / [`TypeShapeBuilder`]: hand-registration of shapes the
//!   [`entity!`] macro cannot express
//! - [`classify`] / [`CommonUseType`]: the ordered classification algorithm
//!
//! # Examples
//!
//! ```rust
//! use rowcast::metadata::{BindingScope, CommonUseType, TypeRegistry};
//!
//! let registry = TypeRegistry::new();
//! let description = registry.describe::<Vec<i32>>();
//! assert_eq!(description.classification, CommonUseType::List);
//! assert_eq!(description.properties(BindingScope::public()).count(), 0);
//! ```
//!
//! [`entity!`]: crate::entity

mod classify;
mod description;
mod member;
mod reflect;
mod registry;
mod shape;

pub use classify::{classify, CommonUseType, ShapeTraits, TypeFlags};
pub use description::{FieldList, MethodList, PropertyList, TypeDescription};
pub use member::{FieldDescription, MethodDescription, PropertyDescription};
pub use reflect::Reflected;
pub use registry::TypeRegistry;
pub use shape::{
    ArrayShape, BindingScope, CollectionShape, DescribeFn, DictionaryShape, FieldBlueprint,
    MethodBlueprint, ParamBlueprint, ParamMode, PropertyBlueprint, TypeShape, TypeShapeBuilder,
    Visibility,
};
