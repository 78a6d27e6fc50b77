//! The compile-time reflection seam: the [`Reflected`] trait.
//!
//! Runtime type discovery is replaced by a trait every describable type
//! implements: `shape()` hands the registry a complete blueprint, and the
//! value-conversion pair `from_value` / `to_value` moves instances across the
//! type-erased cell boundary. Entity types get their implementation from the
//! [`entity!`] macro; this module supplies the implementations for the
//! built-in shapes (primitives, strings, nullable wrappers, vectors, maps,
//! fixed arrays, shared slices and function pointers).
//!
//! # Strict value conversion
//!
//! `from_value` never coerces: it accepts exactly the cell variant the type
//! surfaces as and fails with [`crate::Error::ConversionInvalid`] otherwise.
//! Kind adaptation is the conversion matrix's job and happens before a value
//! reaches `from_value` or a generated setter.
//!
//! [`entity!`]: crate::entity

use std::{any::type_name, collections::HashMap, hash::Hash, sync::Arc};

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use rust_decimal::Decimal;
use uguid::Guid;

use crate::{
    accessor::{self, AddFn, ArrayGetFn, ArraySetFn, CtorFn, LenFn},
    convert::{CellKind, CellValue},
    metadata::{ArrayShape, CollectionShape, DictionaryShape, ShapeTraits, TypeShape},
    Result,
};

/// Implemented by every type the metadata cache can describe.
///
/// The four operations split cleanly: [`Reflected::shape`] runs once per type
/// (under the registry's build lock) and bakes all accessor thunks;
/// [`Reflected::cell_kind`] is the kind instances surface as on the erased
/// boundary; [`Reflected::from_value`] and [`Reflected::to_value`] move one
/// instance across that boundary.
pub trait Reflected: Sized + Send + Sync + 'static {
    /// The complete shape blueprint for this type.
    fn shape() -> TypeShape;

    /// The cell kind instances of this type surface as.
    fn cell_kind() -> CellKind;

    /// Recover an instance from a cell, accepting exactly [`Self::cell_kind`].
    ///
    /// # Errors
    /// Returns [`crate::Error::ConversionInvalid`] for any other kind. Run the
    /// value through the conversion matrix first when kinds may differ.
    fn from_value(value: CellValue) -> Result<Self>;

    /// Surface this instance as a cell.
    fn to_value(&self) -> CellValue;
}

fn kind_mismatch<T: Reflected>(value: &CellValue) -> crate::Error {
    crate::Error::ConversionInvalid {
        from: value.kind(),
        to: T::cell_kind(),
    }
}

macro_rules! reflect_primitive {
    ($ty:ty, $name:literal, $variant:ident, ctor) => {
        impl Reflected for $ty {
            fn shape() -> TypeShape {
                TypeShape::builder($name)
                    .traits(ShapeTraits::PRIMITIVE)
                    .cell_kind(CellKind::$variant)
                    .constructor(accessor::constructor::<$ty>())
                    .finish()
            }

            fn cell_kind() -> CellKind {
                CellKind::$variant
            }

            fn from_value(value: CellValue) -> Result<Self> {
                match value {
                    CellValue::$variant(inner) => Ok(inner),
                    other => Err(kind_mismatch::<Self>(&other)),
                }
            }

            fn to_value(&self) -> CellValue {
                CellValue::$variant(*self)
            }
        }
    };
    ($ty:ty, $name:literal, $variant:ident) => {
        impl Reflected for $ty {
            fn shape() -> TypeShape {
                TypeShape::builder($name)
                    .traits(ShapeTraits::PRIMITIVE)
                    .cell_kind(CellKind::$variant)
                    .finish()
            }

            fn cell_kind() -> CellKind {
                CellKind::$variant
            }

            fn from_value(value: CellValue) -> Result<Self> {
                match value {
                    CellValue::$variant(inner) => Ok(inner),
                    other => Err(kind_mismatch::<Self>(&other)),
                }
            }

            fn to_value(&self) -> CellValue {
                CellValue::$variant(*self)
            }
        }
    };
}

reflect_primitive!(bool, "bool", Bool, ctor);
reflect_primitive!(i8, "i8", I8, ctor);
reflect_primitive!(i16, "i16", I16, ctor);
reflect_primitive!(i32, "i32", I32, ctor);
reflect_primitive!(i64, "i64", I64, ctor);
reflect_primitive!(u8, "u8", U8, ctor);
reflect_primitive!(u16, "u16", U16, ctor);
reflect_primitive!(u32, "u32", U32, ctor);
reflect_primitive!(u64, "u64", U64, ctor);
reflect_primitive!(f32, "f32", F32, ctor);
reflect_primitive!(f64, "f64", F64, ctor);
reflect_primitive!(Decimal, "Decimal", Decimal, ctor);
reflect_primitive!(Guid, "Guid", Guid);
reflect_primitive!(NaiveDateTime, "NaiveDateTime", DateTime);
reflect_primitive!(DateTime<FixedOffset>, "DateTime<FixedOffset>", DateTimeOffset);

impl Reflected for String {
    fn shape() -> TypeShape {
        TypeShape::builder("String")
            .traits(ShapeTraits::TEXT)
            .cell_kind(CellKind::String)
            .constructor(accessor::constructor::<String>())
            .finish()
    }

    fn cell_kind() -> CellKind {
        CellKind::String
    }

    fn from_value(value: CellValue) -> Result<Self> {
        match value {
            CellValue::String(inner) => Ok(inner),
            other => Err(kind_mismatch::<Self>(&other)),
        }
    }

    fn to_value(&self) -> CellValue {
        CellValue::String(self.clone())
    }
}

/// Binary column payloads surface as owned boxed slices; `Vec<u8>` is taken
/// by the list implementation below.
impl Reflected for Box<[u8]> {
    fn shape() -> TypeShape {
        TypeShape::builder("Box<[u8]>")
            .traits(ShapeTraits::PRIMITIVE)
            .cell_kind(CellKind::Bytes)
            .constructor(accessor::constructor::<Box<[u8]>>())
            .finish()
    }

    fn cell_kind() -> CellKind {
        CellKind::Bytes
    }

    fn from_value(value: CellValue) -> Result<Self> {
        match value {
            CellValue::Bytes(inner) => Ok(inner.into_boxed_slice()),
            other => Err(kind_mismatch::<Self>(&other)),
        }
    }

    fn to_value(&self) -> CellValue {
        CellValue::Bytes(self.to_vec())
    }
}

/// Nullable wrapper: the inner type's traits plus the nullable bit.
///
/// `CellValue::Null` maps to `None` in both directions; non-null values defer
/// to the inner type's strict conversion.
impl<T: Reflected> Reflected for Option<T> {
    fn shape() -> TypeShape {
        let inner = T::shape();
        TypeShape::builder(type_name::<Self>())
            .traits(inner.traits | ShapeTraits::NULLABLE)
            .cell_kind(T::cell_kind())
            .constructor(accessor::constructor::<Option<T>>())
            .finish()
    }

    fn cell_kind() -> CellKind {
        T::cell_kind()
    }

    fn from_value(value: CellValue) -> Result<Self> {
        match value {
            CellValue::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }

    fn to_value(&self) -> CellValue {
        match self {
            Some(inner) => inner.to_value(),
            None => CellValue::Null,
        }
    }
}

fn collection_mismatch<T>() -> crate::Error {
    crate::Error::Error(format!("instance is not a `{}`", type_name::<T>()))
}

/// Growable list: list-classified, appendable through the resolved `add`.
///
/// The typed `add` accepts cells of the item kind; the erased fallback
/// accepts an object payload carrying the item type.
impl<T: Reflected + Clone> Reflected for Vec<T> {
    fn shape() -> TypeShape {
        let typed_add: AddFn = Arc::new(|instance, item| {
            let list = instance
                .downcast_mut::<Vec<T>>()
                .ok_or_else(collection_mismatch::<Vec<T>>)?;
            list.push(T::from_value(item)?);
            Ok(())
        });
        let erased_add: AddFn = Arc::new(|instance, item| {
            let list = instance
                .downcast_mut::<Vec<T>>()
                .ok_or_else(collection_mismatch::<Vec<T>>)?;
            let item = item
                .downcast_ref::<T>()
                .cloned()
                .ok_or_else(|| crate::Error::ConversionInvalid {
                    from: CellKind::Object,
                    to: T::cell_kind(),
                })?;
            list.push(item);
            Ok(())
        });

        TypeShape::builder(type_name::<Self>())
            .traits(ShapeTraits::LIST | ShapeTraits::ENUMERABLE)
            .constructor(accessor::constructor::<Vec<T>>())
            .collection(CollectionShape::resolve(
                T::cell_kind(),
                |registry| registry.describe::<T>(),
                Some(typed_add),
                Some(erased_add),
                false,
            ))
            .finish()
    }

    fn cell_kind() -> CellKind {
        CellKind::Object
    }

    fn from_value(value: CellValue) -> Result<Self> {
        value
            .downcast_ref::<Vec<T>>()
            .cloned()
            .ok_or_else(|| kind_mismatch::<Self>(&value))
    }

    fn to_value(&self) -> CellValue {
        CellValue::object(self.clone())
    }
}

/// Shared immutable slice: enumerable-classified, refuses appends.
impl<T: Reflected + Clone> Reflected for Arc<[T]> {
    fn shape() -> TypeShape {
        TypeShape::builder(type_name::<Self>())
            .traits(ShapeTraits::ENUMERABLE)
            .collection(CollectionShape::resolve(
                T::cell_kind(),
                |registry| registry.describe::<T>(),
                None,
                None,
                true,
            ))
            .finish()
    }

    fn cell_kind() -> CellKind {
        CellKind::Object
    }

    fn from_value(value: CellValue) -> Result<Self> {
        value
            .downcast_ref::<Arc<[T]>>()
            .cloned()
            .ok_or_else(|| kind_mismatch::<Self>(&value))
    }

    fn to_value(&self) -> CellValue {
        CellValue::object(self.clone())
    }
}

/// Keyed map: dictionary-classified even though it is also enumerable.
impl<K, V> Reflected for HashMap<K, V>
where
    K: Reflected + Eq + Hash + Clone,
    V: Reflected + Clone,
{
    fn shape() -> TypeShape {
        TypeShape::builder(type_name::<Self>())
            .traits(ShapeTraits::DICTIONARY | ShapeTraits::ENUMERABLE)
            .constructor(accessor::constructor::<HashMap<K, V>>())
            .dictionary(DictionaryShape {
                key_kind: K::cell_kind(),
                key_describe: |registry| registry.describe::<K>(),
                value_kind: V::cell_kind(),
                value_describe: |registry| registry.describe::<V>(),
            })
            .finish()
    }

    fn cell_kind() -> CellKind {
        CellKind::Object
    }

    fn from_value(value: CellValue) -> Result<Self> {
        value
            .downcast_ref::<HashMap<K, V>>()
            .cloned()
            .ok_or_else(|| kind_mismatch::<Self>(&value))
    }

    fn to_value(&self) -> CellValue {
        CellValue::object(self.clone())
    }
}

/// Fixed-length array: array-classified with full element access.
impl<T, const N: usize> Reflected for [T; N]
where
    T: Reflected + Default + Clone,
{
    fn shape() -> TypeShape {
        let create: CtorFn = Arc::new(|| {
            Box::new(core::array::from_fn::<T, N, _>(|_| T::default()))
                as Box<dyn std::any::Any + Send + Sync>
        });
        let get: ArrayGetFn = Arc::new(|instance, index| {
            let array = instance
                .downcast_ref::<[T; N]>()
                .ok_or_else(collection_mismatch::<[T; N]>)?;
            match array.get(index) {
                Some(element) => Ok(element.to_value()),
                None => Err(crate::Error::Error(format!(
                    "index {index} out of bounds for length {N}"
                ))),
            }
        });
        let set: ArraySetFn = Arc::new(|instance, index, value| {
            let array = instance
                .downcast_mut::<[T; N]>()
                .ok_or_else(collection_mismatch::<[T; N]>)?;
            match array.get_mut(index) {
                Some(slot) => {
                    *slot = T::from_value(value)?;
                    Ok(())
                }
                None => Err(crate::Error::Error(format!(
                    "index {index} out of bounds for length {N}"
                ))),
            }
        });
        let len: LenFn = Arc::new(|_| Ok(N));

        TypeShape::builder(type_name::<Self>())
            .traits(ShapeTraits::ARRAY | ShapeTraits::ENUMERABLE)
            .array(ArrayShape {
                element_kind: T::cell_kind(),
                element_describe: |registry| registry.describe::<T>(),
                create,
                get,
                set,
                len,
            })
            .finish()
    }

    fn cell_kind() -> CellKind {
        CellKind::Object
    }

    fn from_value(value: CellValue) -> Result<Self> {
        value
            .downcast_ref::<[T; N]>()
            .cloned()
            .ok_or_else(|| kind_mismatch::<Self>(&value))
    }

    fn to_value(&self) -> CellValue {
        CellValue::object(self.clone())
    }
}

macro_rules! reflect_delegate {
    ($($arg:ident),*) => {
        impl<R: Reflected, $($arg: Reflected),*> Reflected for fn($($arg),*) -> R {
            fn shape() -> TypeShape {
                TypeShape::builder(type_name::<Self>())
                    .traits(ShapeTraits::DELEGATE)
                    .finish()
            }

            fn cell_kind() -> CellKind {
                CellKind::Object
            }

            fn from_value(value: CellValue) -> Result<Self> {
                value
                    .downcast_ref::<Self>()
                    .copied()
                    .ok_or_else(|| kind_mismatch::<Self>(&value))
            }

            fn to_value(&self) -> CellValue {
                CellValue::object(*self)
            }
        }
    };
}

reflect_delegate!();
reflect_delegate!(A1);
reflect_delegate!(A1, A2);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{CommonUseType, TypeRegistry};

    #[test]
    fn test_strict_from_value() {
        assert_eq!(i32::from_value(CellValue::I32(7)).unwrap(), 7);

        let failure = i32::from_value(CellValue::String("7".into()));
        assert!(matches!(
            failure,
            Err(crate::Error::ConversionInvalid {
                from: CellKind::String,
                to: CellKind::I32,
            })
        ));
    }

    #[test]
    fn test_nullable_wrapper() {
        assert_eq!(Option::<i64>::from_value(CellValue::Null).unwrap(), None);
        assert_eq!(
            Option::<i64>::from_value(CellValue::I64(3)).unwrap(),
            Some(3)
        );
        assert_eq!(Some(3i64).to_value(), CellValue::I64(3));
        assert_eq!(Option::<i64>::None.to_value(), CellValue::Null);

        let registry = TypeRegistry::new();
        let description = registry.describe::<Option<i64>>();
        assert_eq!(description.classification, CommonUseType::NullablePrimitive);
    }

    #[test]
    fn test_vec_resolves_typed_add() {
        let registry = TypeRegistry::new();
        let description = registry.describe::<Vec<i32>>();
        assert_eq!(description.classification, CommonUseType::List);

        let collection = description.collection().expect("list carries collection shape");
        assert!(!collection.read_only);
        let add = collection.add.as_ref().expect("writable list resolves add");

        let mut instance = description.construct().unwrap();
        add(instance.as_mut(), CellValue::I32(4)).unwrap();
        add(instance.as_mut(), CellValue::I32(5)).unwrap();
        assert_eq!(instance.downcast_ref::<Vec<i32>>().unwrap(), &vec![4, 5]);
    }

    #[test]
    fn test_shared_slice_is_read_only() {
        let registry = TypeRegistry::new();
        let description = registry.describe::<Arc<[i32]>>();
        assert_eq!(description.classification, CommonUseType::Enumerable);

        let collection = description.collection().unwrap();
        assert!(collection.read_only);
        assert!(collection.add.is_none());
    }

    #[test]
    fn test_fixed_array_element_access() {
        let registry = TypeRegistry::new();
        let description = registry.describe::<[i32; 3]>();
        assert_eq!(description.classification, CommonUseType::Array);

        let array = description.array().unwrap();
        let mut instance = (array.create)();
        assert_eq!((array.len)(instance.as_ref()).unwrap(), 3);

        (array.set)(instance.as_mut(), 1, CellValue::I32(9)).unwrap();
        assert_eq!((array.get)(instance.as_ref(), 1).unwrap(), CellValue::I32(9));
        assert!((array.set)(instance.as_mut(), 3, CellValue::I32(0)).is_err());
    }

    #[test]
    fn test_map_classified_as_dictionary() {
        let registry = TypeRegistry::new();
        let description = registry.describe::<HashMap<String, i64>>();
        assert_eq!(description.classification, CommonUseType::Dictionary);

        let dictionary = description.dictionary().unwrap();
        assert_eq!(dictionary.key_kind, CellKind::String);
        assert_eq!(dictionary.value_kind, CellKind::I64);
    }

    #[test]
    fn test_delegate_classification() {
        let registry = TypeRegistry::new();
        let description = registry.describe::<fn() -> i32>();
        assert_eq!(description.classification, CommonUseType::Delegate);
    }
}
