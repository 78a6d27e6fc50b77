//! Member descriptions: properties, fields and methods of a described type.
//!
//! A member description pairs the member's metadata (name, declaring type,
//! visibility, value kind) with its generated accessor thunks. Descriptions
//! are created during a scope-keyed member pass on a
//! [`crate::metadata::TypeDescription`] and live as long as the description
//! itself; a thunk generated here is never regenerated.
//!
//! # Late-bound setters
//!
//! A property reflected under a scope that does not admit its setter (the
//! classic case: a public getter with a private setter, populated only
//! during materialization) starts without an installed setter.
//! [`PropertyDescription::ensure_setter`] resolves the setter lazily under a
//! wider scope and fails with [`crate::Error::SetterUnavailable`] when none
//! exists at the requested visibility.

use std::{any::Any, sync::Arc, sync::OnceLock};

use crate::{
    accessor::{GetterFn, IndexedGetterFn, IndexedSetterFn, InvokeFn, SetterFn},
    convert::{CellKind, CellValue},
    metadata::{
        BindingScope, DescribeFn, FieldBlueprint, MethodBlueprint, ParamBlueprint, ParamMode,
        PropertyBlueprint, TypeDescription, TypeRegistry, Visibility,
    },
    Result,
};

/// Description of one property: metadata plus generated accessors.
pub struct PropertyDescription {
    /// Member name
    pub name: &'static str,
    /// Name of the declaring type
    pub declaring_type: &'static str,
    /// Visibility of the property itself
    pub visibility: Visibility,
    /// The cell kind the setter expects and the getter produces
    pub value_kind: CellKind,
    value_describe: DescribeFn,
    value_desc: OnceLock<Arc<TypeDescription>>,
    getter: GetterFn,
    setter_slot: OnceLock<SetterFn>,
    setter_blueprint: Option<(Visibility, SetterFn)>,
    /// Index parameter kinds; empty for plain properties
    pub index_params: Vec<CellKind>,
    indexed_getter: Option<IndexedGetterFn>,
    indexed_setter: Option<IndexedSetterFn>,
    attributes: Vec<&'static str>,
}

impl PropertyDescription {
    pub(crate) fn from_blueprint(
        blueprint: PropertyBlueprint,
        declaring_type: &'static str,
        scope: BindingScope,
    ) -> Arc<Self> {
        let description = PropertyDescription {
            name: blueprint.name,
            declaring_type,
            visibility: blueprint.visibility,
            value_kind: blueprint.value_kind,
            value_describe: blueprint.value_describe,
            value_desc: OnceLock::new(),
            getter: blueprint.getter,
            setter_slot: OnceLock::new(),
            setter_blueprint: blueprint.setter,
            index_params: blueprint.index_params,
            indexed_getter: blueprint.indexed_getter,
            indexed_setter: blueprint.indexed_setter,
            attributes: blueprint.attributes,
        };
        if let Some((visibility, setter)) = &description.setter_blueprint {
            if scope.admits(*visibility) {
                let _ = description.setter_slot.set(setter.clone());
            }
        }
        Arc::new(description)
    }

    /// `true` if the property has no setter at any visibility.
    #[must_use]
    pub fn read_only(&self) -> bool {
        self.setter_blueprint.is_none()
    }

    /// `true` if the property takes index parameters.
    #[must_use]
    pub fn is_indexed(&self) -> bool {
        !self.index_params.is_empty()
    }

    /// `true` if a setter is currently installed for this property.
    #[must_use]
    pub fn has_setter(&self) -> bool {
        self.setter_slot.get().is_some()
    }

    /// Read the property from an erased instance.
    ///
    /// # Errors
    /// Propagates the thunk's failure when the instance is of the wrong type.
    pub fn get(&self, instance: &dyn Any) -> Result<CellValue> {
        (self.getter)(instance)
    }

    /// Write the property on an erased instance.
    ///
    /// # Errors
    /// Returns [`crate::Error::SetterUnavailable`] when no setter was
    /// installed by the reflecting scope or by [`Self::ensure_setter`].
    pub fn set(&self, instance: &mut dyn Any, value: CellValue) -> Result<()> {
        match self.setter_slot.get() {
            Some(setter) => setter(instance, value),
            None => Err(crate::Error::SetterUnavailable {
                type_name: self.declaring_type,
                property: self.name.to_string(),
            }),
        }
    }

    /// Read the property at an index.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnsupportedMember`] for non-indexed properties.
    pub fn get_at(&self, instance: &dyn Any, index: &[CellValue]) -> Result<CellValue> {
        match &self.indexed_getter {
            Some(getter) => getter(instance, index),
            None => Err(crate::Error::UnsupportedMember {
                member: format!("{}.{}", self.declaring_type, self.name),
                reason: "property is not indexed".to_string(),
            }),
        }
    }

    /// Write the property at an index.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnsupportedMember`] for non-indexed properties
    /// and for indexed properties without an index setter.
    pub fn set_at(&self, instance: &mut dyn Any, index: &[CellValue], value: CellValue) -> Result<()> {
        match &self.indexed_setter {
            Some(setter) => setter(instance, index, value),
            None => Err(crate::Error::UnsupportedMember {
                member: format!("{}.{}", self.declaring_type, self.name),
                reason: "property has no indexed setter".to_string(),
            }),
        }
    }

    /// Lazily resolve (and then install) the setter under a wider scope.
    ///
    /// Idempotent: once a setter is installed, every later call returns it
    /// regardless of the requested scope.
    ///
    /// # Errors
    /// Returns [`crate::Error::SetterUnavailable`] when no setter exists at
    /// the requested visibility.
    pub fn ensure_setter(&self, scope: BindingScope) -> Result<SetterFn> {
        if let Some(setter) = self.setter_slot.get() {
            return Ok(setter.clone());
        }
        match &self.setter_blueprint {
            Some((visibility, setter)) if scope.admits(*visibility) => {
                let _ = self.setter_slot.set(setter.clone());
                Ok(self.setter_slot.get().unwrap_or(setter).clone())
            }
            _ => Err(crate::Error::SetterUnavailable {
                type_name: self.declaring_type,
                property: self.name.to_string(),
            }),
        }
    }

    /// The description of this property's value type, resolved through the
    /// registry on first use.
    pub fn value_description(&self, registry: &TypeRegistry) -> Arc<TypeDescription> {
        self.value_desc
            .get_or_init(|| (self.value_describe)(registry))
            .clone()
    }

    /// Cheap presence check for a custom attribute by type name.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|attribute| *attribute == name)
    }
}

/// Description of one plain field: metadata plus generated accessors.
pub struct FieldDescription {
    /// Member name
    pub name: &'static str,
    /// Name of the declaring type
    pub declaring_type: &'static str,
    /// Visibility of the field
    pub visibility: Visibility,
    /// The cell kind the field stores
    pub value_kind: CellKind,
    value_describe: DescribeFn,
    value_desc: OnceLock<Arc<TypeDescription>>,
    getter: GetterFn,
    setter: Option<SetterFn>,
    attributes: Vec<&'static str>,
}

impl FieldDescription {
    pub(crate) fn from_blueprint(blueprint: FieldBlueprint, declaring_type: &'static str) -> Arc<Self> {
        Arc::new(FieldDescription {
            name: blueprint.name,
            declaring_type,
            visibility: blueprint.visibility,
            value_kind: blueprint.value_kind,
            value_describe: blueprint.value_describe,
            value_desc: OnceLock::new(),
            getter: blueprint.getter,
            setter: blueprint.setter,
            attributes: blueprint.attributes,
        })
    }

    /// Read the field from an erased instance.
    ///
    /// # Errors
    /// Propagates the thunk's failure when the instance is of the wrong type.
    pub fn get(&self, instance: &dyn Any) -> Result<CellValue> {
        (self.getter)(instance)
    }

    /// Write the field on an erased instance.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnsupportedMember`] for immutable fields.
    pub fn set(&self, instance: &mut dyn Any, value: CellValue) -> Result<()> {
        match &self.setter {
            Some(setter) => setter(instance, value),
            None => Err(crate::Error::UnsupportedMember {
                member: format!("{}.{}", self.declaring_type, self.name),
                reason: "field is immutable".to_string(),
            }),
        }
    }

    /// The description of this field's value type, resolved through the
    /// registry on first use.
    pub fn value_description(&self, registry: &TypeRegistry) -> Arc<TypeDescription> {
        self.value_desc
            .get_or_init(|| (self.value_describe)(registry))
            .clone()
    }

    /// Cheap presence check for a custom attribute by type name.
    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|attribute| *attribute == name)
    }
}

/// Description of one method: declared parameters plus the invocation thunk.
pub struct MethodDescription {
    /// Member name
    pub name: &'static str,
    /// Name of the declaring type
    pub declaring_type: &'static str,
    /// Visibility of the method
    pub visibility: Visibility,
    /// Declared parameters in call order
    pub params: Vec<ParamBlueprint>,
    invoke: InvokeFn,
}

impl MethodDescription {
    /// Build a method description, validating the parameter shapes.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnsupportedMember`] naming the offending
    /// parameter when the method declares an `out` parameter; the thunk
    /// convention cannot express write-back arguments.
    pub(crate) fn from_blueprint(
        blueprint: MethodBlueprint,
        declaring_type: &'static str,
    ) -> Result<Arc<Self>> {
        if let Some(param) = blueprint
            .params
            .iter()
            .find(|param| param.mode == ParamMode::Out)
        {
            return Err(crate::Error::UnsupportedMember {
                member: format!("{}.{}", declaring_type, blueprint.name),
                reason: format!("`out` parameter `{}` is not supported", param.name),
            });
        }
        Ok(Arc::new(MethodDescription {
            name: blueprint.name,
            declaring_type,
            visibility: blueprint.visibility,
            params: blueprint.params,
            invoke: blueprint.invoke,
        }))
    }

    /// Invoke the method on an erased instance.
    ///
    /// # Errors
    /// Propagates the thunk's failure.
    pub fn invoke(&self, instance: &mut dyn Any, args: &mut [CellValue]) -> Result<CellValue> {
        (self.invoke)(instance, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accessor;

    #[derive(Default, Clone)]
    struct Counter {
        total: i32,
    }

    fn total_property(scope: BindingScope) -> Arc<PropertyDescription> {
        let blueprint = PropertyBlueprint::new(
            "total",
            Visibility::Public,
            CellKind::I32,
            |registry| registry.describe::<i32>(),
            accessor::getter(|counter: &Counter| CellValue::I32(counter.total)),
        )
        .with_setter(
            Visibility::Private,
            accessor::setter(|counter: &mut Counter, value| {
                counter.total = value.as_i32().ok_or(crate::Error::Error("not an int".into()))?;
                Ok(())
            }),
        );
        PropertyDescription::from_blueprint(blueprint, "Counter", scope)
    }

    #[test]
    fn test_private_setter_hidden_from_public_scope() {
        let property = total_property(BindingScope::public());
        assert!(!property.has_setter());

        let mut counter = Counter::default();
        let failure = property.set(&mut counter, CellValue::I32(3));
        assert!(matches!(failure, Err(crate::Error::SetterUnavailable { .. })));
    }

    #[test]
    fn test_ensure_setter_resolves_under_wider_scope() {
        let property = total_property(BindingScope::public());
        assert!(property.ensure_setter(BindingScope::public()).is_err());

        let setter = property.ensure_setter(BindingScope::all()).unwrap();
        let mut counter = Counter::default();
        setter(&mut counter, CellValue::I32(9)).unwrap();
        assert_eq!(counter.total, 9);

        // Installed once; later narrow-scope calls now succeed
        assert!(property.ensure_setter(BindingScope::public()).is_ok());
        assert!(property.has_setter());
    }

    #[test]
    fn test_out_parameter_is_rejected_at_build_time() {
        let blueprint = MethodBlueprint {
            name: "try_take",
            visibility: Visibility::Public,
            params: vec![
                ParamBlueprint {
                    name: "count",
                    kind: CellKind::I32,
                    mode: ParamMode::In,
                },
                ParamBlueprint {
                    name: "taken",
                    kind: CellKind::I32,
                    mode: ParamMode::Out,
                },
            ],
            invoke: accessor::method(|_: &mut Counter, _| Ok(CellValue::Null)),
        };

        let failure = MethodDescription::from_blueprint(blueprint, "Counter");
        match failure {
            Err(crate::Error::UnsupportedMember { member, reason }) => {
                assert_eq!(member, "Counter.try_take");
                assert!(reason.contains("taken"));
            }
            _ => panic!("expected UnsupportedMember"),
        }
    }
}
