//! Type classification for the metadata model.
//!
//! Every [`crate::metadata::TypeDescription`] carries exactly one
//! [`CommonUseType`] tag, assigned at construction and never changed. The tag
//! is computed from a type's declared [`ShapeTraits`] by an ordered,
//! first-match-wins algorithm; the ordering is part of the contract because a
//! type can plausibly carry several capabilities at once (a dictionary is
//! also enumerable, a custom collection may expose both list and map access).
//!
//! # Classification order
//!
//! primitive / string / nullable set membership, then array, delegate,
//! dictionary-like, list-like, enumerable-only, enum, nullable-of-enum, and
//! finally the unspecified complex bucket. Dictionary capability wins over
//! list capability: key/value semantics are more specific than positional
//! semantics.

use bitflags::bitflags;
use strum::Display;

bitflags! {
    /// Capability traits a type shape declares about itself.
    ///
    /// Traits are inputs to classification, not the classification itself:
    /// several traits may be set at once and [`classify`] arbitrates.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ShapeTraits: u16 {
        /// Member of the primitive set (numerics, bool, guid, date/time)
        const PRIMITIVE  = 1 << 0;
        /// The string type
        const TEXT       = 1 << 1;
        /// A nullable wrapper around another shape
        const NULLABLE   = 1 << 2;
        /// A fixed-length array
        const ARRAY      = 1 << 3;
        /// A callable value (function pointer, delegate)
        const DELEGATE   = 1 << 4;
        /// Keyed dictionary access
        const DICTIONARY = 1 << 5;
        /// Positional list access with append capability
        const LIST       = 1 << 6;
        /// Forward enumeration only
        const ENUMERABLE = 1 << 7;
        /// A closed set of named integer values
        const ENUM       = 1 << 8;
    }
}

bitflags! {
    /// Structural flags computed for every description regardless of its
    /// classification.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeFlags: u8 {
        /// The type cannot be subtyped
        const SEALED   = 1 << 0;
        /// The type cannot be instantiated directly
        const ABSTRACT = 1 << 1;
        /// The type is an instantiation of a generic definition
        const GENERIC  = 1 << 2;
    }
}

/// The classification tag assigned to a [`crate::metadata::TypeDescription`]
/// at construction.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommonUseType {
    /// A primitive scalar (numerics, bool, guid, date/time)
    Primitive,
    /// A nullable wrapper around a primitive scalar
    NullablePrimitive,
    /// The string type
    Text,
    /// A closed set of named integer values
    Enum,
    /// A nullable wrapper around an enum
    NullableEnum,
    /// A fixed-length array
    Array,
    /// A positional collection with append capability
    List,
    /// A keyed dictionary
    Dictionary,
    /// A forward-only enumerable without positional or keyed access
    Enumerable,
    /// A callable value
    Delegate,
    /// Any other shape; materialization treats it as an entity
    Complex,
}

/// Compute the classification tag for a set of declared traits.
///
/// Ordered, first match wins; see the module documentation for the order and
/// for why dictionary capability beats list capability.
#[must_use]
pub fn classify(traits: ShapeTraits) -> CommonUseType {
    if traits.contains(ShapeTraits::PRIMITIVE) {
        return if traits.contains(ShapeTraits::NULLABLE) {
            CommonUseType::NullablePrimitive
        } else {
            CommonUseType::Primitive
        };
    }
    if traits.contains(ShapeTraits::TEXT) {
        return CommonUseType::Text;
    }
    if traits.contains(ShapeTraits::ARRAY) {
        return CommonUseType::Array;
    }
    if traits.contains(ShapeTraits::DELEGATE) {
        return CommonUseType::Delegate;
    }
    if traits.contains(ShapeTraits::DICTIONARY) {
        return CommonUseType::Dictionary;
    }
    if traits.contains(ShapeTraits::LIST) {
        return CommonUseType::List;
    }
    if traits.contains(ShapeTraits::ENUMERABLE) {
        return CommonUseType::Enumerable;
    }
    if traits.contains(ShapeTraits::ENUM) {
        return if traits.contains(ShapeTraits::NULLABLE) {
            CommonUseType::NullableEnum
        } else {
            CommonUseType::Enum
        };
    }
    CommonUseType::Complex
}
