//! Cached per-type metadata: the `TypeDescription`.
//!
//! One `TypeDescription` exists per runtime type for the life of the process
//! (see [`crate::metadata::TypeRegistry`]). The description owns the type's
//! classification, structural flags, constructor thunk, specialization data
//! and its member passes. Member passes are keyed by [`BindingScope`] and are
//! lazy and independent: the first query for a scope reflects and caches that
//! scope's members, re-querying the same scope is a lock-free read, and a new
//! scope triggers a new pass cached alongside the prior ones.
//!
//! # Thread Safety
//!
//! The classification, flags and shape data are immutable after
//! construction. Member passes use the same double-checked pattern as the
//! registry itself: a lock-free read over a concurrent map, falling back to a
//! single pass lock for construction.

use std::{
    any::{Any, TypeId},
    sync::{Arc, Mutex, PoisonError},
};

use dashmap::DashMap;

use crate::{
    accessor::CtorFn,
    convert::CellKind,
    metadata::{
        classify, ArrayShape, BindingScope, CollectionShape, CommonUseType, DictionaryShape,
        FieldDescription, MethodDescription, PropertyDescription, TypeFlags, TypeShape,
    },
    Result,
};

/// A list that holds the property descriptions of one scope pass
pub type PropertyList = Arc<boxcar::Vec<Arc<PropertyDescription>>>;
/// A list that holds the field descriptions of one scope pass
pub type FieldList = Arc<boxcar::Vec<Arc<FieldDescription>>>;
/// A list that holds the method descriptions of one scope pass
pub type MethodList = Arc<boxcar::Vec<Arc<MethodDescription>>>;

/// Cached metadata and generated accessors for one runtime type.
pub struct TypeDescription {
    /// The runtime type identity this description was built for
    pub type_id: TypeId,
    /// Type name, used for diagnostics and name lookup
    pub name: &'static str,
    /// Classification tag, fixed at construction
    pub classification: CommonUseType,
    /// Structural flags, computed for every description
    pub flags: TypeFlags,
    /// The cell kind instances of this type surface as
    pub cell_kind: CellKind,
    shape: TypeShape,
    properties: DashMap<BindingScope, PropertyList>,
    fields: DashMap<BindingScope, FieldList>,
    methods: DashMap<BindingScope, MethodList>,
    pass_lock: Mutex<()>,
}

impl TypeDescription {
    /// Build a description from a shape blueprint.
    ///
    /// Classification happens here, exactly once; member passes stay lazy.
    pub(crate) fn from_shape(type_id: TypeId, shape: TypeShape) -> Self {
        TypeDescription {
            type_id,
            name: shape.name,
            classification: classify(shape.traits),
            flags: shape.flags,
            cell_kind: shape.cell_kind,
            shape,
            properties: DashMap::new(),
            fields: DashMap::new(),
            methods: DashMap::new(),
            pass_lock: Mutex::new(()),
        }
    }

    /// Run the blueprint consistency check (see eager description).
    ///
    /// # Errors
    /// Returns [`crate::Error::Shape`] for duplicate members or capability
    /// traits without their specialization data.
    pub fn validate(&self) -> Result<()> {
        self.shape.validate()
    }

    /// The default-constructor thunk, when the type has one.
    #[must_use]
    pub fn constructor(&self) -> Option<&CtorFn> {
        self.shape.constructor.as_ref()
    }

    /// Construct a fresh, default-initialized erased instance.
    ///
    /// # Errors
    /// Returns [`crate::Error::MissingConstructor`] when no constructor thunk
    /// was registered for this type.
    pub fn construct(&self) -> Result<Box<dyn Any + Send + Sync>> {
        match &self.shape.constructor {
            Some(construct) => Ok(construct()),
            None => Err(crate::Error::MissingConstructor(self.name)),
        }
    }

    /// The property descriptions for one binding scope.
    ///
    /// First call for a scope runs the reflection pass; later calls are
    /// lock-free reads of the cached list.
    pub fn properties(&self, scope: BindingScope) -> PropertyList {
        if let Some(list) = self.properties.get(&scope) {
            return list.clone();
        }

        let _guard = self.pass_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = self.properties.get(&scope) {
            return list.clone();
        }

        let list: PropertyList = Arc::new(boxcar::Vec::new());
        for blueprint in &self.shape.properties {
            if scope.admits(blueprint.visibility) {
                list.push(PropertyDescription::from_blueprint(
                    blueprint.clone(),
                    self.name,
                    scope,
                ));
            }
        }
        self.properties.insert(scope, list.clone());
        list
    }

    /// Look up one property by name under a binding scope.
    #[must_use]
    pub fn property(&self, scope: BindingScope, name: &str) -> Option<Arc<PropertyDescription>> {
        self.properties(scope)
            .iter()
            .map(|(_, property)| property)
            .find(|property| property.name == name)
            .cloned()
    }

    /// The field descriptions for one binding scope.
    pub fn fields(&self, scope: BindingScope) -> FieldList {
        if let Some(list) = self.fields.get(&scope) {
            return list.clone();
        }

        let _guard = self.pass_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = self.fields.get(&scope) {
            return list.clone();
        }

        let list: FieldList = Arc::new(boxcar::Vec::new());
        for blueprint in &self.shape.fields {
            if scope.admits(blueprint.visibility) {
                list.push(FieldDescription::from_blueprint(blueprint.clone(), self.name));
            }
        }
        self.fields.insert(scope, list.clone());
        list
    }

    /// Look up one field by name under a binding scope.
    #[must_use]
    pub fn field(&self, scope: BindingScope, name: &str) -> Option<Arc<FieldDescription>> {
        self.fields(scope)
            .iter()
            .map(|(_, field)| field)
            .find(|field| field.name == name)
            .cloned()
    }

    /// The method descriptions for one binding scope.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnsupportedMember`] when a method in scope
    /// declares a shape the thunk convention cannot express (an `out`
    /// parameter). The failing pass is not cached, so the error is raised
    /// again on every attempt.
    pub fn methods(&self, scope: BindingScope) -> Result<MethodList> {
        if let Some(list) = self.methods.get(&scope) {
            return Ok(list.clone());
        }

        let _guard = self.pass_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = self.methods.get(&scope) {
            return Ok(list.clone());
        }

        let list: MethodList = Arc::new(boxcar::Vec::new());
        for blueprint in &self.shape.methods {
            if scope.admits(blueprint.visibility) {
                list.push(MethodDescription::from_blueprint(blueprint.clone(), self.name)?);
            }
        }
        self.methods.insert(scope, list.clone());
        Ok(list)
    }

    /// Look up one method by name under a binding scope.
    ///
    /// # Errors
    /// Same failure modes as [`Self::methods`].
    pub fn method(&self, scope: BindingScope, name: &str) -> Result<Option<Arc<MethodDescription>>> {
        Ok(self
            .methods(scope)?
            .iter()
            .map(|(_, method)| method)
            .find(|method| method.name == name)
            .cloned())
    }

    /// Array specialization data, when this type is array-classified.
    #[must_use]
    pub fn array(&self) -> Option<&ArrayShape> {
        self.shape.array.as_ref()
    }

    /// Collection specialization data, when this type is list-classified.
    #[must_use]
    pub fn collection(&self) -> Option<&CollectionShape> {
        self.shape.collection.as_ref()
    }

    /// Dictionary specialization data, when this type is
    /// dictionary-classified.
    #[must_use]
    pub fn dictionary(&self) -> Option<&DictionaryShape> {
        self.shape.dictionary.as_ref()
    }

    /// `true` if the type cannot be subtyped.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.flags.contains(TypeFlags::SEALED)
    }

    /// `true` if the type cannot be instantiated directly.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(TypeFlags::ABSTRACT)
    }

    /// `true` if the type is an instantiation of a generic definition.
    #[must_use]
    pub fn is_generic(&self) -> bool {
        self.flags.contains(TypeFlags::GENERIC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        accessor,
        convert::CellValue,
        metadata::{PropertyBlueprint, ShapeTraits, Visibility},
    };

    #[derive(Default, Clone)]
    struct Sample {
        public_value: i32,
        hidden_value: i32,
    }

    fn sample_description() -> TypeDescription {
        let shape = TypeShape::builder("Sample")
            .constructor(accessor::constructor::<Sample>())
            .property(
                PropertyBlueprint::new(
                    "public_value",
                    Visibility::Public,
                    CellKind::I32,
                    |registry| registry.describe::<i32>(),
                    accessor::getter(|sample: &Sample| CellValue::I32(sample.public_value)),
                )
                .with_setter(
                    Visibility::Public,
                    accessor::setter(|sample: &mut Sample, value| {
                        sample.public_value =
                            value.as_i32().ok_or(crate::Error::Error("not an int".into()))?;
                        Ok(())
                    }),
                ),
            )
            .property(
                PropertyBlueprint::new(
                    "hidden_value",
                    Visibility::Private,
                    CellKind::I32,
                    |registry| registry.describe::<i32>(),
                    accessor::getter(|sample: &Sample| CellValue::I32(sample.hidden_value)),
                )
                .with_setter(
                    Visibility::Private,
                    accessor::setter(|sample: &mut Sample, value| {
                        sample.hidden_value =
                            value.as_i32().ok_or(crate::Error::Error("not an int".into()))?;
                        Ok(())
                    }),
                ),
            )
            .finish();
        TypeDescription::from_shape(TypeId::of::<Sample>(), shape)
    }

    #[test]
    fn test_scope_passes_are_independent() {
        let description = sample_description();

        let public = description.properties(BindingScope::public());
        assert_eq!(public.count(), 1);

        let all = description.properties(BindingScope::all());
        assert_eq!(all.count(), 2);

        // Re-querying a known scope returns the cached list
        let public_again = description.properties(BindingScope::public());
        assert!(Arc::ptr_eq(&public, &public_again));
    }

    #[test]
    fn test_classification_is_complex_without_traits() {
        let description = sample_description();
        assert_eq!(description.classification, CommonUseType::Complex);
        assert!(description.is_sealed());
        assert!(!description.is_generic());
    }

    #[test]
    fn test_construct_uses_registered_thunk() {
        let description = sample_description();
        let instance = description.construct().unwrap();
        assert_eq!(instance.downcast_ref::<Sample>().unwrap().public_value, 0);
    }

    #[test]
    fn test_missing_constructor_is_reported() {
        let shape = TypeShape::builder("NoCtor").traits(ShapeTraits::empty()).finish();
        let description = TypeDescription::from_shape(TypeId::of::<Sample>(), shape);
        assert!(matches!(
            description.construct(),
            Err(crate::Error::MissingConstructor("NoCtor"))
        ));
    }
}
