//! Uniform-call-convention accessor thunks.
//!
//! Every member operation in the metadata model is exposed through a small
//! set of type-erased function shapes: getters take `&dyn Any`, setters take
//! `&mut dyn Any` plus a [`CellValue`], constructors produce a boxed erased
//! instance, and method thunks take an argument slice. The narrowly-typed
//! body behind each thunk is generated at compile time (by the [`entity!`]
//! macro or by hand through [`crate::metadata::TypeShapeBuilder`]) and wrapped
//! here exactly once; the wrapper performs one downcast and no further
//! per-call validation.
//!
//! # Key Components
//!
//! - [`GetterFn`] / [`SetterFn`]: plain property and field access
//! - [`IndexedGetterFn`] / [`IndexedSetterFn`]: indexed property access
//! - [`CtorFn`]: default construction of an erased instance
//! - [`InvokeFn`]: method invocation over an argument slice
//! - [`AddFn`]: the resolved "add" operation of a collection type
//!
//! # Value-type semantics
//!
//! A setter mutates the erased instance the caller passed in, never a copy:
//! the `&mut dyn Any` is downcast in place, so the caller observes the
//! mutation on the same logical instance it holds. This mirrors
//! unbox-before-mutate semantics for value types.
//!
//! # Thread Safety
//!
//! Thunks are pure, stateless `Send + Sync` values. Once generated and
//! published in a type description they are reused for the life of the
//! process and are safe for unrestricted concurrent calls.
//!
//! [`entity!`]: crate::entity

use std::{
    any::{type_name, Any},
    sync::Arc,
};

use crate::{convert::CellValue, Result};

/// Read one member of an erased instance.
pub type GetterFn = Arc<dyn Fn(&dyn Any) -> Result<CellValue> + Send + Sync>;

/// Write one member of an erased instance.
pub type SetterFn = Arc<dyn Fn(&mut dyn Any, CellValue) -> Result<()> + Send + Sync>;

/// Read one member of an erased instance at an index.
pub type IndexedGetterFn = Arc<dyn Fn(&dyn Any, &[CellValue]) -> Result<CellValue> + Send + Sync>;

/// Write one member of an erased instance at an index.
pub type IndexedSetterFn =
    Arc<dyn Fn(&mut dyn Any, &[CellValue], CellValue) -> Result<()> + Send + Sync>;

/// Construct a fresh, default-initialized erased instance.
pub type CtorFn = Arc<dyn Fn() -> Box<dyn Any + Send + Sync> + Send + Sync>;

/// Invoke a method on an erased instance with an argument slice.
pub type InvokeFn = Arc<dyn Fn(&mut dyn Any, &mut [CellValue]) -> Result<CellValue> + Send + Sync>;

/// Append one item to an erased collection instance.
pub type AddFn = Arc<dyn Fn(&mut dyn Any, CellValue) -> Result<()> + Send + Sync>;

/// Read one element of an erased array instance.
pub type ArrayGetFn = Arc<dyn Fn(&dyn Any, usize) -> Result<CellValue> + Send + Sync>;

/// Write one element of an erased array instance.
pub type ArraySetFn = Arc<dyn Fn(&mut dyn Any, usize, CellValue) -> Result<()> + Send + Sync>;

/// Report the element count of an erased array or collection instance.
pub type LenFn = Arc<dyn Fn(&dyn Any) -> Result<usize> + Send + Sync>;

fn mismatch<T>() -> crate::Error {
    crate::Error::Error(format!("instance is not a `{}`", type_name::<T>()))
}

/// Wrap a typed read as a [`GetterFn`].
pub fn getter<T, F>(read: F) -> GetterFn
where
    T: Any,
    F: Fn(&T) -> CellValue + Send + Sync + 'static,
{
    Arc::new(move |instance| {
        let typed = instance.downcast_ref::<T>().ok_or_else(mismatch::<T>)?;
        Ok(read(typed))
    })
}

/// Wrap a typed write as a [`SetterFn`].
///
/// The typed body receives the same instance the caller holds; mutation is
/// in place.
pub fn setter<T, F>(write: F) -> SetterFn
where
    T: Any,
    F: Fn(&mut T, CellValue) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(move |instance, value| {
        let typed = instance.downcast_mut::<T>().ok_or_else(mismatch::<T>)?;
        write(typed, value)
    })
}

/// Wrap a typed indexed read as an [`IndexedGetterFn`].
pub fn indexed_getter<T, F>(read: F) -> IndexedGetterFn
where
    T: Any,
    F: Fn(&T, &[CellValue]) -> Result<CellValue> + Send + Sync + 'static,
{
    Arc::new(move |instance, index| {
        let typed = instance.downcast_ref::<T>().ok_or_else(mismatch::<T>)?;
        read(typed, index)
    })
}

/// Wrap a typed indexed write as an [`IndexedSetterFn`].
pub fn indexed_setter<T, F>(write: F) -> IndexedSetterFn
where
    T: Any,
    F: Fn(&mut T, &[CellValue], CellValue) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(move |instance, index, value| {
        let typed = instance.downcast_mut::<T>().ok_or_else(mismatch::<T>)?;
        write(typed, index, value)
    })
}

/// A [`CtorFn`] producing `T::default()` behind the erased box.
pub fn constructor<T>() -> CtorFn
where
    T: Any + Default + Send + Sync,
{
    Arc::new(|| Box::new(T::default()) as Box<dyn Any + Send + Sync>)
}

/// Wrap a typed method body as an [`InvokeFn`].
pub fn method<T, F>(call: F) -> InvokeFn
where
    T: Any,
    F: Fn(&mut T, &mut [CellValue]) -> Result<CellValue> + Send + Sync + 'static,
{
    Arc::new(move |instance, args| {
        let typed = instance.downcast_mut::<T>().ok_or_else(mismatch::<T>)?;
        call(typed, args)
    })
}

/// Wrap a typed append operation as an [`AddFn`].
pub fn adder<T, F>(add: F) -> AddFn
where
    T: Any,
    F: Fn(&mut T, CellValue) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(move |instance, item| {
        let typed = instance.downcast_mut::<T>().ok_or_else(mismatch::<T>)?;
        add(typed, item)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Sample {
        count: i32,
    }

    #[test]
    fn test_getter_setter_roundtrip_same_instance() {
        let get = getter(|sample: &Sample| CellValue::I32(sample.count));
        let set = setter(|sample: &mut Sample, value| {
            sample.count = value.as_i32().ok_or(crate::Error::Error("not an int".into()))?;
            Ok(())
        });

        let mut instance = Sample::default();
        let erased: &mut dyn Any = &mut instance;
        set(erased, CellValue::I32(41)).unwrap();
        assert_eq!(get(erased).unwrap(), CellValue::I32(41));
        // The caller's instance observed the mutation
        assert_eq!(instance.count, 41);
    }

    #[test]
    fn test_wrong_instance_type_is_reported() {
        let get = getter(|sample: &Sample| CellValue::I32(sample.count));
        let wrong: &dyn Any = &7u8;
        assert!(get(wrong).is_err());
    }

    #[test]
    fn test_constructor_produces_fresh_instances() {
        let construct = constructor::<Sample>();
        let boxed = construct();
        assert_eq!(boxed.downcast_ref::<Sample>().unwrap().count, 0);
    }
}
