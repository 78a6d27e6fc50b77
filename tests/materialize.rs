//! End-to-end materialization over an in-memory cursor.
//!
//! These tests drive the public surface the way a data-access layer would:
//! entities declared with `entity!`, a cursor with a database-flavored
//! schema, and a `Materializer` doing the population.

use std::sync::Arc;

use rowcast::{entity, prelude::*};

entity! {
    pub struct Customer {
        customer_id: i32,
        customer_name: String,
        credit_limit: Option<i64>,
        standing: Standing,
        #[set(private)]
        row_version: i64,
    }
}

entity! {
    pub enum Standing {
        Good = 1,
        Delinquent = 2,
    }
}

/// Maps database-style PascalCase columns onto the entity's field names.
struct PascalColumns;

impl EntityConfig for PascalColumns {
    fn column_to_property(&self, entity: &str, column: &str) -> Option<String> {
        if entity != "Customer" {
            return None;
        }
        match column {
            "CustomerId" => Some("customer_id".to_string()),
            "CustomerName" => Some("customer_name".to_string()),
            "CreditLimit" => Some("credit_limit".to_string()),
            "Standing" => Some("standing".to_string()),
            "RowVersion" => Some("row_version".to_string()),
            _ => None,
        }
    }
}

fn customer_schema() -> Vec<(String, CellKind)> {
    vec![
        ("CustomerId".to_string(), CellKind::I32),
        ("CustomerName".to_string(), CellKind::String),
        ("CreditLimit".to_string(), CellKind::I64),
        ("Standing".to_string(), CellKind::I32),
        ("RowVersion".to_string(), CellKind::I64),
    ]
}

fn customer_cursor(rows: usize) -> MemoryCursor {
    let mut cursor = MemoryCursor::new(customer_schema());
    for index in 0..rows {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let id = index as i32;
        let credit = if index % 3 == 0 {
            CellValue::Null
        } else {
            CellValue::I64(1_000 * index as i64)
        };
        let standing = if index % 2 == 0 { 1 } else { 2 };
        cursor = cursor.with_row(vec![
            CellValue::I32(id),
            CellValue::String(format!("customer-{index}")),
            credit,
            CellValue::I32(standing),
            CellValue::I64(index as i64 + 7),
        ]);
    }
    cursor
}

fn engine() -> Materializer {
    Materializer::new().with_config(Arc::new(PascalColumns))
}

#[test]
fn test_fetch_all_populates_every_mapped_column() -> Result<()> {
    let mut cursor = customer_cursor(100);
    let customers: Vec<Customer> = engine().fetch_all(&mut cursor, 100)?;

    assert_eq!(customers.len(), 100);
    for (index, customer) in customers.iter().enumerate() {
        assert_eq!(customer.customer_id as usize, index);
        assert_eq!(customer.customer_name, format!("customer-{index}"));
        if index % 3 == 0 {
            assert_eq!(customer.credit_limit, None);
        } else {
            assert_eq!(customer.credit_limit, Some(1_000 * index as i64));
        }
        let expected = if index % 2 == 0 {
            Standing::Good
        } else {
            Standing::Delinquent
        };
        assert_eq!(customer.standing, expected);
        // Populated through the private setter
        assert_eq!(customer.row_version, index as i64 + 7);
    }
    Ok(())
}

#[test]
fn test_registered_widening_applies_per_column() -> Result<()> {
    // RowVersion arrives as I32 instead of the declared I64; the registered
    // widening conversion bridges the gap
    let mut cursor = MemoryCursor::new(vec![
        ("CustomerId".to_string(), CellKind::I32),
        ("RowVersion".to_string(), CellKind::I32),
    ])
    .with_row(vec![CellValue::I32(5), CellValue::I32(12)]);

    let customers: Vec<Customer> = engine().fetch_all(&mut cursor, 1)?;
    assert_eq!(customers[0].row_version, 12);
    Ok(())
}

#[test]
fn test_assignment_failure_names_column_entity_and_property() {
    // Text arriving in an integer column has no registered conversion path
    let mut cursor = MemoryCursor::new(vec![("CustomerId".to_string(), CellKind::String)])
        .with_row(vec![CellValue::String("not-a-number".to_string())]);

    let outcome: Result<Vec<Customer>> = engine().fetch_all(&mut cursor, 1);
    match outcome {
        Err(Error::Assignment {
            column,
            entity,
            property,
            ..
        }) => {
            assert_eq!(column, "CustomerId");
            assert_eq!(entity, "Customer");
            assert_eq!(property, "customer_id");
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected an assignment failure"),
    }
}

#[test]
fn test_assignment_failure_ends_the_stream() -> Result<()> {
    // Row 1 cannot assign; row 2 would populate fine but must never be reached
    let mut cursor = MemoryCursor::new(vec![("CustomerId".to_string(), CellKind::String)])
        .with_row(vec![CellValue::String("not-a-number".to_string())])
        .with_row(vec![CellValue::I32(7)]);

    let engine = engine();
    let mut stream = engine.stream::<Customer>(&mut cursor)?;
    assert!(matches!(
        stream.next(),
        Some(Err(Error::Assignment { .. }))
    ));
    assert!(stream.next().is_none());
    assert!(stream.next().is_none());
    Ok(())
}

#[test]
fn test_unmapped_columns_are_ignored() -> Result<()> {
    let mut cursor = MemoryCursor::new(vec![
        ("CustomerId".to_string(), CellKind::I32),
        ("AuditTrail".to_string(), CellKind::String),
    ])
    .with_row(vec![CellValue::I32(9), CellValue::String("ignored".to_string())]);

    let customers: Vec<Customer> = engine().fetch_all(&mut cursor, 1)?;
    assert_eq!(customers[0].customer_id, 9);
    assert_eq!(customers[0].customer_name, "");
    Ok(())
}

#[test]
fn test_scalar_null_policies() -> Result<()> {
    let rows = vec![
        vec![CellValue::I32(1)],
        vec![CellValue::Null],
        vec![CellValue::I32(3)],
    ];

    let mut cursor = MemoryCursor::new(vec![("Value".to_string(), CellKind::I32)])
        .with_rows(rows.clone());
    let included: Vec<i32> = engine().scalars(&mut cursor, NullPolicy::IncludeAsDefault)?;
    assert_eq!(included, vec![1, 0, 3]);

    let mut cursor =
        MemoryCursor::new(vec![("Value".to_string(), CellKind::I32)]).with_rows(rows);
    let omitted: Vec<i32> = engine().scalars(&mut cursor, NullPolicy::Omit)?;
    assert_eq!(omitted, vec![1, 3]);
    Ok(())
}

#[test]
fn test_scalar_conversion_follows_actual_payload() -> Result<()> {
    // Declared I32, payloads are I64; the converter keys off the first value
    let mut cursor = MemoryCursor::new(vec![("Value".to_string(), CellKind::I32)])
        .with_rows(vec![vec![CellValue::I64(10)], vec![CellValue::I64(20)]]);

    let values: Vec<i32> = engine().scalars(&mut cursor, NullPolicy::Omit)?;
    assert_eq!(values, vec![10, 20]);
    Ok(())
}

#[test]
fn test_direct_column_name_match_without_config() -> Result<()> {
    // Without mapping configuration, columns match property names directly
    let mut cursor = MemoryCursor::new(vec![
        ("customer_id".to_string(), CellKind::I32),
        ("customer_name".to_string(), CellKind::String),
    ])
    .with_row(vec![CellValue::I32(2), CellValue::String("direct".to_string())]);

    let plain = Materializer::new();
    let customers: Vec<Customer> = plain.fetch_all(&mut cursor, 1)?;
    assert_eq!(customers[0].customer_id, 2);
    assert_eq!(customers[0].customer_name, "direct");
    Ok(())
}

#[test]
fn test_registry_is_shared_across_fetches() -> Result<()> {
    let engine = engine();
    let before = engine.registry().constructions();

    let mut first = customer_cursor(3);
    let _: Vec<Customer> = engine.fetch_all(&mut first, 3)?;
    let after_first = engine.registry().constructions();

    let mut second = customer_cursor(3);
    let _: Vec<Customer> = engine.fetch_all(&mut second, 3)?;

    // The second fetch reuses every cached description
    assert_eq!(engine.registry().constructions(), after_first);
    assert!(after_first > before);
    Ok(())
}
