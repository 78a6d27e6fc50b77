//! The population plan: schema-to-property binding computed once per stream.
//!
//! Before the first row is read, the plan walks the cursor schema and binds
//! each column to a settable property of the target description, resolving
//! the conversion path per column from the declared kinds. Per-row work is
//! then a straight walk over pre-bound slots: no name lookups, no kind
//! dispatch, no converter search.
//!
//! Columns with no matching property bind to an empty slot and are skipped
//! silently; a kind mismatch with no registered converter stays unconverted
//! so the strict setter reports it as an assignment failure naming the
//! column, entity and property.

use std::{any::Any, sync::Arc};

use crate::{
    convert::{CellValue, ConversionMatrix, ConvertFn},
    materialize::{EntityConfig, RowCursor},
    metadata::{BindingScope, PropertyDescription, TypeDescription},
    Result,
};

struct BoundColumn {
    name: String,
    property: Arc<PropertyDescription>,
    converter: Option<ConvertFn>,
}

/// One column-to-property binding pass, reused for every row of a stream.
pub(crate) struct PopulationPlan {
    description: Arc<TypeDescription>,
    slots: Vec<Option<BoundColumn>>,
}

impl PopulationPlan {
    /// Bind the cursor schema to the target description.
    ///
    /// Property resolution order per column: an explicit mapping from the
    /// entity configuration, then the column name itself. Setters resolve
    /// under the widest scope, so private setters participate in population.
    pub(crate) fn build(
        cursor: &dyn RowCursor,
        description: Arc<TypeDescription>,
        matrix: &ConversionMatrix,
        config: Option<&dyn EntityConfig>,
    ) -> Result<Self> {
        let mut slots = Vec::with_capacity(cursor.field_count());
        for ordinal in 0..cursor.field_count() {
            let column = cursor.field_name(ordinal);
            let target = config
                .and_then(|config| config.column_to_property(description.name, column))
                .unwrap_or_else(|| column.to_string());

            let Some(property) = description.property(BindingScope::all(), &target) else {
                slots.push(None);
                continue;
            };
            if property.ensure_setter(BindingScope::all()).is_err() {
                // Read-only property; the column has nowhere to land
                slots.push(None);
                continue;
            }

            let converter = if cursor.field_kind(ordinal) == property.value_kind {
                None
            } else {
                matrix.resolve(cursor.field_kind(ordinal), property.value_kind)
            };
            slots.push(Some(BoundColumn {
                name: column.to_string(),
                property,
                converter,
            }));
        }
        Ok(PopulationPlan { description, slots })
    }

    /// Construct and populate one instance from a bulk-read row.
    ///
    /// Null cells leave the constructed default in place regardless of slot
    /// binding; conversion and assignment failures are reported as
    /// [`crate::Error::Assignment`] naming the column, entity and property.
    pub(crate) fn materialize(&self, row: &[CellValue]) -> Result<Box<dyn Any + Send + Sync>> {
        let mut instance = self.description.construct()?;
        for (slot, cell) in self.slots.iter().zip(row) {
            let Some(bound) = slot else { continue };
            if cell.is_null() {
                continue;
            }

            let value = match &bound.converter {
                Some(convert) => convert(cell.clone())
                    .map_err(|error| self.assignment_failure(bound, &error))?,
                None => cell.clone(),
            };
            bound
                .property
                .set(instance.as_mut(), value)
                .map_err(|error| self.assignment_failure(bound, &error))?;
        }
        Ok(instance)
    }

    fn assignment_failure(&self, bound: &BoundColumn, error: &crate::Error) -> crate::Error {
        crate::Error::Assignment {
            column: bound.name.clone(),
            entity: self.description.name,
            property: bound.property.name.to_string(),
            reason: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        accessor,
        convert::CellKind,
        materialize::MemoryCursor,
        metadata::{PropertyBlueprint, TypeRegistry, TypeShape, Visibility},
        Reflected,
    };

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Row {
        id: i32,
        label: String,
    }

    impl Reflected for Row {
        fn shape() -> TypeShape {
            TypeShape::builder("Row")
                .constructor(accessor::constructor::<Row>())
                .property(
                    PropertyBlueprint::new(
                        "id",
                        Visibility::Public,
                        CellKind::I32,
                        |registry| registry.describe::<i32>(),
                        accessor::getter(|row: &Row| CellValue::I32(row.id)),
                    )
                    .with_setter(
                        Visibility::Public,
                        accessor::setter(|row: &mut Row, value| {
                            row.id = i32::from_value(value)?;
                            Ok(())
                        }),
                    ),
                )
                .property(
                    PropertyBlueprint::new(
                        "label",
                        Visibility::Public,
                        CellKind::String,
                        |registry| registry.describe::<String>(),
                        accessor::getter(|row: &Row| CellValue::String(row.label.clone())),
                    )
                    .with_setter(
                        Visibility::Public,
                        accessor::setter(|row: &mut Row, value| {
                            row.label = String::from_value(value)?;
                            Ok(())
                        }),
                    ),
                )
                .finish()
        }

        fn cell_kind() -> CellKind {
            CellKind::Object
        }

        fn from_value(value: CellValue) -> Result<Self> {
            value.downcast_ref::<Row>().cloned().ok_or_else(|| {
                crate::Error::ConversionInvalid {
                    from: value.kind(),
                    to: CellKind::Object,
                }
            })
        }

        fn to_value(&self) -> CellValue {
            CellValue::object(self.clone())
        }
    }

    fn plan_for(cursor: &MemoryCursor) -> PopulationPlan {
        let registry = TypeRegistry::new();
        let matrix = ConversionMatrix::new();
        PopulationPlan::build(cursor, registry.describe::<Row>(), &matrix, None).unwrap()
    }

    #[test]
    fn test_unmapped_columns_are_skipped() {
        let cursor = MemoryCursor::new(vec![
            ("id".to_string(), CellKind::I32),
            ("Mystery".to_string(), CellKind::String),
        ]);
        let plan = plan_for(&cursor);

        let row = [CellValue::I32(7), CellValue::String("ignored".into())];
        let instance = plan.materialize(&row).unwrap();
        let materialized = instance.downcast_ref::<Row>().unwrap();
        assert_eq!(materialized.id, 7);
        assert_eq!(materialized.label, "");
    }

    #[test]
    fn test_registered_conversion_applies() {
        // The column is wider than the property; the registered narrowing wins
        let cursor = MemoryCursor::new(vec![("id".to_string(), CellKind::I64)]);
        let plan = plan_for(&cursor);

        let instance = plan.materialize(&[CellValue::I64(41)]).unwrap();
        assert_eq!(instance.downcast_ref::<Row>().unwrap().id, 41);
    }

    #[test]
    fn test_unregistered_mismatch_names_the_target() {
        // No String -> I32 converter is registered; the strict setter reports
        let cursor = MemoryCursor::new(vec![("id".to_string(), CellKind::String)]);
        let plan = plan_for(&cursor);

        let failure = plan.materialize(&[CellValue::String("41".into())]);
        match failure {
            Err(crate::Error::Assignment {
                column,
                entity,
                property,
                ..
            }) => {
                assert_eq!(column, "id");
                assert_eq!(entity, "Row");
                assert_eq!(property, "id");
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected assignment failure"),
        }
    }

    #[test]
    fn test_null_cells_leave_defaults() {
        let cursor = MemoryCursor::new(vec![
            ("id".to_string(), CellKind::I32),
            ("label".to_string(), CellKind::String),
        ]);
        let plan = plan_for(&cursor);

        let instance = plan
            .materialize(&[CellValue::Null, CellValue::String("kept".into())])
            .unwrap();
        let materialized = instance.downcast_ref::<Row>().unwrap();
        assert_eq!(materialized.id, 0);
        assert_eq!(materialized.label, "kept");
    }
}
