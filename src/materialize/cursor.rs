//! The row-cursor boundary between a result source and materialization.
//!
//! A [`RowCursor`] is a forward-only view over a tabular result: a fixed
//! schema (column names and kinds) plus an advance/read protocol. The engine
//! never seeks backwards and never touches a row after advancing past it, so
//! sources can stream without buffering.
//!
//! [`MemoryCursor`] is the in-process implementation used by tests and
//! benchmarks; production sources implement [`RowCursor`] over their own wire
//! format.

use crate::{
    convert::{CellKind, CellValue},
    Result,
};

/// Forward-only access to one tabular result set.
///
/// The schema accessors are valid before the first [`RowCursor::advance`];
/// the cell accessors are valid only while positioned on a row.
pub trait RowCursor {
    /// Number of columns in the result schema.
    fn field_count(&self) -> usize;

    /// Name of one column.
    fn field_name(&self, ordinal: usize) -> &str;

    /// Declared kind of one column.
    fn field_kind(&self, ordinal: usize) -> CellKind;

    /// Move to the next row.
    ///
    /// Returns `Ok(false)` once the result set is exhausted; every later call
    /// keeps returning `Ok(false)`.
    ///
    /// # Errors
    /// Source-specific read failures.
    fn advance(&mut self) -> Result<bool>;

    /// Read one cell of the current row.
    ///
    /// # Errors
    /// Fails when the cursor is not positioned on a row.
    fn value(&self, ordinal: usize) -> Result<CellValue>;

    /// `true` if one cell of the current row is a database null.
    fn is_null(&self, ordinal: usize) -> bool {
        matches!(self.value(ordinal), Ok(CellValue::Null))
    }

    /// Bulk-read the current row into a caller-owned buffer.
    ///
    /// Reads `min(field_count, buffer.len())` cells and returns how many were
    /// written. One bulk read per row replaces per-cell calls on the hot
    /// path.
    ///
    /// # Errors
    /// Fails when the cursor is not positioned on a row.
    fn values(&self, buffer: &mut [CellValue]) -> Result<usize> {
        let count = self.field_count().min(buffer.len());
        for (ordinal, slot) in buffer.iter_mut().enumerate().take(count) {
            *slot = self.value(ordinal)?;
        }
        Ok(count)
    }
}

/// An in-memory [`RowCursor`] over pre-built rows.
pub struct MemoryCursor {
    columns: Vec<(String, CellKind)>,
    rows: Vec<Vec<CellValue>>,
    // 0 = before the first row, rows.len() + 1 = exhausted
    position: usize,
}

impl MemoryCursor {
    /// A cursor with the given schema and no rows yet.
    #[must_use]
    pub fn new(columns: Vec<(String, CellKind)>) -> Self {
        MemoryCursor {
            columns,
            rows: Vec::new(),
            position: 0,
        }
    }

    /// Append one row; short rows are padded with nulls.
    #[must_use]
    pub fn with_row(mut self, mut row: Vec<CellValue>) -> Self {
        row.resize(self.columns.len(), CellValue::Null);
        self.rows.push(row);
        self
    }

    /// Append many rows at once.
    #[must_use]
    pub fn with_rows<I: IntoIterator<Item = Vec<CellValue>>>(mut self, rows: I) -> Self {
        for row in rows {
            self = self.with_row(row);
        }
        self
    }

    /// Number of rows held by this cursor.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn current(&self) -> Result<&Vec<CellValue>> {
        if self.position == 0 || self.position > self.rows.len() {
            return Err(crate::Error::Error("cursor is not positioned on a row".to_string()));
        }
        Ok(&self.rows[self.position - 1])
    }
}

impl RowCursor for MemoryCursor {
    fn field_count(&self) -> usize {
        self.columns.len()
    }

    fn field_name(&self, ordinal: usize) -> &str {
        &self.columns[ordinal].0
    }

    fn field_kind(&self, ordinal: usize) -> CellKind {
        self.columns[ordinal].1
    }

    fn advance(&mut self) -> Result<bool> {
        if self.position > self.rows.len() {
            return Ok(false);
        }
        self.position += 1;
        Ok(self.position <= self.rows.len())
    }

    fn value(&self, ordinal: usize) -> Result<CellValue> {
        let row = self.current()?;
        row.get(ordinal)
            .cloned()
            .ok_or_else(|| crate::Error::Error(format!("no column at ordinal {ordinal}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_column_cursor() -> MemoryCursor {
        MemoryCursor::new(vec![
            ("Id".to_string(), CellKind::I32),
            ("Name".to_string(), CellKind::String),
        ])
        .with_row(vec![CellValue::I32(1), CellValue::String("first".into())])
        .with_row(vec![CellValue::I32(2)])
    }

    #[test]
    fn test_forward_only_protocol() {
        let mut cursor = two_column_cursor();
        assert_eq!(cursor.field_count(), 2);
        assert_eq!(cursor.field_name(1), "Name");

        // Before the first advance there is no current row
        assert!(cursor.value(0).is_err());

        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.value(0).unwrap(), CellValue::I32(1));

        assert!(cursor.advance().unwrap());
        // The short row was padded with a null
        assert!(cursor.is_null(1));

        assert!(!cursor.advance().unwrap());
        assert!(!cursor.advance().unwrap());
        assert!(cursor.value(0).is_err());
    }

    #[test]
    fn test_bulk_read() {
        let mut cursor = two_column_cursor();
        assert!(cursor.advance().unwrap());

        let mut buffer = vec![CellValue::Null; 2];
        assert_eq!(cursor.values(&mut buffer).unwrap(), 2);
        assert_eq!(buffer[0], CellValue::I32(1));
        assert_eq!(buffer[1], CellValue::String("first".into()));

        // A shorter buffer reads a prefix
        let mut short = vec![CellValue::Null; 1];
        assert_eq!(cursor.values(&mut short).unwrap(), 1);
    }
}
