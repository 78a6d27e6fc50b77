//! Shape blueprints: the compile-time description a type supplies once.
//!
//! A [`TypeShape`] is the raw material a [`crate::metadata::TypeRegistry`]
//! turns into a cached [`crate::metadata::TypeDescription`]. Shapes are
//! produced either by the [`entity!`] macro or by hand through
//! [`TypeShapeBuilder`]; both paths bake the narrowly-typed accessor bodies
//! into thunks at this point, so no further code generation happens after a
//! shape leaves its builder.
//!
//! # Key Components
//!
//! - [`TypeShape`] / [`TypeShapeBuilder`]: the blueprint and its fluent
//!   constructor
//! - [`PropertyBlueprint`] / [`FieldBlueprint`] / [`MethodBlueprint`]: member
//!   blueprints, including visibility and setter placement
//! - [`ArrayShape`] / [`CollectionShape`] / [`DictionaryShape`]: extra shape
//!   data carried by specialized classifications
//! - [`BindingScope`] / [`Visibility`]: the scope model for member passes
//!
//! [`entity!`]: crate::entity

use bitflags::bitflags;

use crate::{
    accessor::{
        AddFn, ArrayGetFn, ArraySetFn, CtorFn, GetterFn, IndexedGetterFn, IndexedSetterFn,
        InvokeFn, LenFn, SetterFn,
    },
    convert::CellKind,
    metadata::{ShapeTraits, TypeFlags},
};

/// Visibility of a member, as declared at its definition site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Reachable from outside the declaring module
    Public,
    /// Reachable only within the declaring module
    Private,
}

bitflags! {
    /// The binding scope of one member-reflection pass.
    ///
    /// Member passes inside a description are keyed by scope: re-querying an
    /// already-computed scope is a no-op, a new scope triggers a new pass
    /// whose results are cached alongside the prior ones.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BindingScope: u8 {
        /// Public members
        const PUBLIC     = 1 << 0;
        /// Non-public members
        const NON_PUBLIC = 1 << 1;
    }
}

impl BindingScope {
    /// The common case: public members only.
    ///
    /// The widest scope is the `bitflags`-generated [`BindingScope::all`],
    /// which covers every member regardless of visibility.
    #[must_use]
    pub fn public() -> Self {
        BindingScope::PUBLIC
    }

    /// `true` if a member with the given visibility belongs to this scope.
    #[must_use]
    pub fn admits(&self, visibility: Visibility) -> bool {
        match visibility {
            Visibility::Public => self.contains(BindingScope::PUBLIC),
            Visibility::Private => self.contains(BindingScope::NON_PUBLIC),
        }
    }
}

/// Resolve the value-type description of a member through the registry.
///
/// Member blueprints store this as a plain function pointer so shapes stay
/// cheap to clone and self-referential entity graphs resolve lazily instead
/// of recursing at shape-construction time.
pub type DescribeFn =
    fn(&crate::metadata::TypeRegistry) -> std::sync::Arc<crate::metadata::TypeDescription>;

/// Blueprint for one property: accessors, visibility, optional setter and
/// optional indexer.
#[derive(Clone)]
pub struct PropertyBlueprint {
    /// Member name
    pub name: &'static str,
    /// Visibility of the property itself
    pub visibility: Visibility,
    /// The cell kind the setter expects and the getter produces
    pub value_kind: CellKind,
    /// Lazy resolver for the property's value-type description
    pub value_describe: DescribeFn,
    /// Generated read thunk
    pub getter: GetterFn,
    pub(crate) setter: Option<(Visibility, SetterFn)>,
    /// Index parameter kinds; empty for plain properties
    pub index_params: Vec<CellKind>,
    pub(crate) indexed_getter: Option<IndexedGetterFn>,
    pub(crate) indexed_setter: Option<IndexedSetterFn>,
    pub(crate) attributes: Vec<&'static str>,
}

impl PropertyBlueprint {
    /// A read-only plain property; add writability with [`Self::with_setter`].
    pub fn new(
        name: &'static str,
        visibility: Visibility,
        value_kind: CellKind,
        value_describe: DescribeFn,
        getter: GetterFn,
    ) -> Self {
        PropertyBlueprint {
            name,
            visibility,
            value_kind,
            value_describe,
            getter,
            setter: None,
            index_params: Vec::new(),
            indexed_getter: None,
            indexed_setter: None,
            attributes: Vec::new(),
        }
    }

    /// Attach a setter with its own visibility (a private setter on a public
    /// property is the deserialization-population case).
    #[must_use]
    pub fn with_setter(mut self, visibility: Visibility, setter: SetterFn) -> Self {
        self.setter = Some((visibility, setter));
        self
    }

    /// Turn this into an indexed property.
    #[must_use]
    pub fn with_index(
        mut self,
        params: Vec<CellKind>,
        getter: IndexedGetterFn,
        setter: Option<IndexedSetterFn>,
    ) -> Self {
        self.index_params = params;
        self.indexed_getter = Some(getter);
        self.indexed_setter = setter;
        self
    }

    /// Record the presence of a custom attribute by type name.
    #[must_use]
    pub fn with_attribute(mut self, name: &'static str) -> Self {
        self.attributes.push(name);
        self
    }
}

/// Blueprint for one plain field: like a property, but with no indexer and no
/// late-bound setter resolution.
#[derive(Clone)]
pub struct FieldBlueprint {
    /// Member name
    pub name: &'static str,
    /// Visibility of the field
    pub visibility: Visibility,
    /// The cell kind the field stores
    pub value_kind: CellKind,
    /// Lazy resolver for the field's value-type description
    pub value_describe: DescribeFn,
    /// Generated read thunk
    pub getter: GetterFn,
    /// Generated write thunk; `None` for immutable fields
    pub setter: Option<SetterFn>,
    pub(crate) attributes: Vec<&'static str>,
}

impl FieldBlueprint {
    /// A mutable field blueprint.
    pub fn new(
        name: &'static str,
        visibility: Visibility,
        value_kind: CellKind,
        value_describe: DescribeFn,
        getter: GetterFn,
        setter: Option<SetterFn>,
    ) -> Self {
        FieldBlueprint {
            name,
            visibility,
            value_kind,
            value_describe,
            getter,
            setter,
            attributes: Vec::new(),
        }
    }

    /// Record the presence of a custom attribute by type name.
    #[must_use]
    pub fn with_attribute(mut self, name: &'static str) -> Self {
        self.attributes.push(name);
        self
    }
}

/// Direction of one method parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamMode {
    /// Passed into the method
    In,
    /// Written by the method; unsupported by the thunk convention
    Out,
}

/// Blueprint for one method parameter.
#[derive(Debug, Clone)]
pub struct ParamBlueprint {
    /// Parameter name, used in diagnostics
    pub name: &'static str,
    /// The cell kind the parameter expects
    pub kind: CellKind,
    /// Parameter direction
    pub mode: ParamMode,
}

/// Blueprint for one method.
#[derive(Clone)]
pub struct MethodBlueprint {
    /// Member name
    pub name: &'static str,
    /// Visibility of the method
    pub visibility: Visibility,
    /// Declared parameters in call order
    pub params: Vec<ParamBlueprint>,
    /// Generated invocation thunk
    pub invoke: InvokeFn,
}

/// Extra shape data for array-classified types.
#[derive(Clone)]
pub struct ArrayShape {
    /// The cell kind of one element
    pub element_kind: CellKind,
    /// Lazy resolver for the element type's description
    pub element_describe: DescribeFn,
    /// Create a fresh, default-filled array instance
    pub create: CtorFn,
    /// Read the element at an index
    pub get: ArrayGetFn,
    /// Write the element at an index
    pub set: ArraySetFn,
    /// The fixed element count
    pub len: LenFn,
}

/// Extra shape data for collection-classified types.
#[derive(Clone)]
pub struct CollectionShape {
    /// The cell kind of one item
    pub item_kind: CellKind,
    /// Lazy resolver for the item type's description
    pub item_describe: DescribeFn,
    /// The resolved append operation; `None` when the collection refused one
    pub add: Option<AddFn>,
    /// `true` for collections that cannot accept appends
    pub read_only: bool,
}

impl CollectionShape {
    /// Resolve the append capability for a collection.
    ///
    /// Probing order: a typed `add` compatible with the item type wins, an
    /// erased-payload `add` is the fallback, and read-only collections refuse
    /// to resolve any append capability at all.
    pub fn resolve(
        item_kind: CellKind,
        item_describe: DescribeFn,
        typed_add: Option<AddFn>,
        erased_add: Option<AddFn>,
        read_only: bool,
    ) -> Self {
        let add = if read_only {
            None
        } else {
            typed_add.or(erased_add)
        };
        CollectionShape {
            item_kind,
            item_describe,
            add,
            read_only,
        }
    }
}

/// Extra shape data for dictionary-classified types.
#[derive(Clone)]
pub struct DictionaryShape {
    /// The cell kind of one key
    pub key_kind: CellKind,
    /// Lazy resolver for the key type's description
    pub key_describe: DescribeFn,
    /// The cell kind of one value
    pub value_kind: CellKind,
    /// Lazy resolver for the value type's description
    pub value_describe: DescribeFn,
}

/// The complete blueprint for one type, ready to become a cached description.
#[derive(Clone)]
pub struct TypeShape {
    /// Type name, used for diagnostics and name lookup
    pub name: &'static str,
    /// Capability traits feeding classification
    pub traits: ShapeTraits,
    /// Structural flags
    pub flags: TypeFlags,
    /// The cell kind instances of this type surface as
    pub cell_kind: CellKind,
    /// Default-constructor thunk, when the type has one
    pub constructor: Option<CtorFn>,
    /// Property blueprints in declaration order
    pub properties: Vec<PropertyBlueprint>,
    /// Field blueprints in declaration order
    pub fields: Vec<FieldBlueprint>,
    /// Method blueprints in declaration order
    pub methods: Vec<MethodBlueprint>,
    /// Array specialization data
    pub array: Option<ArrayShape>,
    /// Collection specialization data
    pub collection: Option<CollectionShape>,
    /// Dictionary specialization data
    pub dictionary: Option<DictionaryShape>,
}

impl TypeShape {
    /// Consistency check over the blueprint, run by eager description.
    ///
    /// Lazy description never calls this; a shape that only ever feeds the
    /// lazy path is taken at face value.
    pub(crate) fn validate(&self) -> crate::Result<()> {
        for (index, property) in self.properties.iter().enumerate() {
            if self.properties[..index].iter().any(|prior| prior.name == property.name) {
                return Err(shape_error!(
                    "duplicate property `{}` on `{}`",
                    property.name,
                    self.name
                ));
            }
        }
        for (index, field) in self.fields.iter().enumerate() {
            if self.fields[..index].iter().any(|prior| prior.name == field.name) {
                return Err(shape_error!("duplicate field `{}` on `{}`", field.name, self.name));
            }
        }
        if self.traits.contains(ShapeTraits::ARRAY) && self.array.is_none() {
            return Err(shape_error!(
                "`{}` declares array capability without array data",
                self.name
            ));
        }
        if self.traits.contains(ShapeTraits::DICTIONARY) && self.dictionary.is_none() {
            return Err(shape_error!(
                "`{}` declares dictionary capability without dictionary data",
                self.name
            ));
        }
        Ok(())
    }

    /// Start building a shape.
    #[must_use]
    pub fn builder(name: &'static str) -> TypeShapeBuilder {
        TypeShapeBuilder {
            shape: TypeShape {
                name,
                traits: ShapeTraits::empty(),
                flags: TypeFlags::SEALED,
                cell_kind: CellKind::Object,
                constructor: None,
                properties: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
                array: None,
                collection: None,
                dictionary: None,
            },
        }
    }
}

/// Fluent construction of a [`TypeShape`].
///
/// The builder is the hand-registration path for shapes the [`entity!`] macro
/// cannot express: indexed properties, methods, custom collection
/// capabilities, or types without a default constructor.
///
/// [`entity!`]: crate::entity
pub struct TypeShapeBuilder {
    shape: TypeShape,
}

impl TypeShapeBuilder {
    /// Set the capability traits.
    #[must_use]
    pub fn traits(mut self, traits: ShapeTraits) -> Self {
        self.shape.traits = traits;
        self
    }

    /// Set the structural flags.
    #[must_use]
    pub fn flags(mut self, flags: TypeFlags) -> Self {
        self.shape.flags = flags;
        self
    }

    /// Set the cell kind instances of this type surface as.
    #[must_use]
    pub fn cell_kind(mut self, kind: CellKind) -> Self {
        self.shape.cell_kind = kind;
        self
    }

    /// Install the default-constructor thunk.
    #[must_use]
    pub fn constructor(mut self, constructor: CtorFn) -> Self {
        self.shape.constructor = Some(constructor);
        self
    }

    /// Add a property blueprint.
    #[must_use]
    pub fn property(mut self, property: PropertyBlueprint) -> Self {
        self.shape.properties.push(property);
        self
    }

    /// Add a field blueprint.
    #[must_use]
    pub fn field(mut self, field: FieldBlueprint) -> Self {
        self.shape.fields.push(field);
        self
    }

    /// Add a method blueprint.
    #[must_use]
    pub fn method(mut self, method: MethodBlueprint) -> Self {
        self.shape.methods.push(method);
        self
    }

    /// Attach array specialization data.
    #[must_use]
    pub fn array(mut self, array: ArrayShape) -> Self {
        self.shape.array = Some(array);
        self
    }

    /// Attach collection specialization data.
    #[must_use]
    pub fn collection(mut self, collection: CollectionShape) -> Self {
        self.shape.collection = Some(collection);
        self
    }

    /// Attach dictionary specialization data.
    #[must_use]
    pub fn dictionary(mut self, dictionary: DictionaryShape) -> Self {
        self.shape.dictionary = Some(dictionary);
        self
    }

    /// Finish the blueprint.
    #[must_use]
    pub fn finish(self) -> TypeShape {
        self.shape
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_admission() {
        assert!(BindingScope::public().admits(Visibility::Public));
        assert!(!BindingScope::public().admits(Visibility::Private));
        // The widest scope covers both declared flags and admits everything
        assert_eq!(
            BindingScope::all(),
            BindingScope::PUBLIC | BindingScope::NON_PUBLIC
        );
        assert!(BindingScope::all().admits(Visibility::Public));
        assert!(BindingScope::all().admits(Visibility::Private));
    }

    #[test]
    fn test_collection_probe_prefers_typed_add() {
        let typed: AddFn = std::sync::Arc::new(|_, _| Ok(()));
        let erased: AddFn = std::sync::Arc::new(|_, _| Err(crate::Error::Error("erased".into())));

        let shape = CollectionShape::resolve(
            CellKind::I32,
            |reg| reg.describe::<i32>(),
            Some(typed),
            Some(erased),
            false,
        );
        assert!(!shape.read_only);
        let add = shape.add.expect("writable collection resolves an add");
        let mut target: Vec<i32> = Vec::new();
        assert!(add(&mut target, crate::convert::CellValue::I32(1)).is_ok());
    }

    #[test]
    fn test_validate_rejects_duplicates_and_missing_data() {
        let property = || {
            PropertyBlueprint::new(
                "total",
                Visibility::Public,
                CellKind::I32,
                |reg| reg.describe::<i32>(),
                crate::accessor::getter(|value: &i32| crate::convert::CellValue::I32(*value)),
            )
        };
        let duplicated = TypeShape::builder("Dup")
            .property(property())
            .property(property())
            .finish();
        assert!(matches!(duplicated.validate(), Err(crate::Error::Shape { .. })));

        let missing_data = TypeShape::builder("Arrayless")
            .traits(ShapeTraits::ARRAY)
            .finish();
        assert!(missing_data.validate().is_err());

        let sound = TypeShape::builder("Sound").property(property()).finish();
        assert!(sound.validate().is_ok());
    }

    #[test]
    fn test_read_only_collection_refuses_add() {
        let typed: AddFn = std::sync::Arc::new(|_, _| Ok(()));
        let shape = CollectionShape::resolve(
            CellKind::I32,
            |reg| reg.describe::<i32>(),
            Some(typed),
            None,
            true,
        );
        assert!(shape.add.is_none());
        assert!(shape.read_only);
    }
}
