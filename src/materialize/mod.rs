//! Forward-only materialization of cursor rows into typed entities.
//!
//! This module is the consumer-facing surface of the crate: a
//! [`Materializer`] pairs a type registry with a conversion matrix and turns
//! any [`RowCursor`] into typed results. Entity population is driven by a
//! plan computed once per stream (see [`plan`]); per-row cost is one bulk
//! read, one construction and a walk over pre-bound column slots.
//!
//! # Key Components
//!
//! - [`Materializer`]: entry points for entity, scalar and handler streaming
//! - [`RowCursor`] / [`MemoryCursor`]: the result-source boundary
//! - [`EntityStream`] / [`ScalarStream`] / [`HandlerStream`]: the forward-only
//!   iterators
//! - [`EntityConfig`]: optional column-to-property mapping overrides
//!
//! # Examples
//!
//! ```rust
//! use rowcast::{
//!     convert::{CellKind, CellValue},
//!     materialize::{Materializer, MemoryCursor, NullPolicy},
//! };
//!
//! let mut cursor = MemoryCursor::new(vec![("Total".to_string(), CellKind::I64)])
//!     .with_row(vec![CellValue::I64(40)])
//!     .with_row(vec![CellValue::I64(2)]);
//!
//! let engine = Materializer::new();
//! let totals: Vec<i64> = engine.scalars(&mut cursor, NullPolicy::Omit).unwrap();
//! assert_eq!(totals, vec![40, 2]);
//! ```

mod cursor;
mod plan;
mod stream;

pub use cursor::{MemoryCursor, RowCursor};
pub use stream::{EntityStream, HandlerStream, NullPolicy, RowHandler, ScalarStream};

use std::sync::Arc;

use crate::{
    convert::ConversionMatrix,
    metadata::{Reflected, TypeRegistry},
    Result,
};

use plan::PopulationPlan;

/// Overrides the column-to-property name mapping for chosen entities.
///
/// Consulted per column while a population plan is built; returning `None`
/// falls back to matching the column name against property names directly.
pub trait EntityConfig: Send + Sync {
    /// The property a column of an entity should populate, if overridden.
    fn column_to_property(&self, entity: &str, column: &str) -> Option<String>;
}

/// The materialization engine: a registry, a conversion matrix and optional
/// mapping configuration.
///
/// Cheap to clone; all components are shared.
#[derive(Clone)]
pub struct Materializer {
    registry: Arc<TypeRegistry>,
    matrix: Arc<ConversionMatrix>,
    config: Option<Arc<dyn EntityConfig>>,
}

impl Default for Materializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Materializer {
    /// An engine with a fresh registry and the default conversion matrix.
    #[must_use]
    pub fn new() -> Self {
        Materializer {
            registry: Arc::new(TypeRegistry::new()),
            matrix: Arc::new(ConversionMatrix::new()),
            config: None,
        }
    }

    /// An engine over shared components, e.g. a process-wide registry.
    #[must_use]
    pub fn with_components(registry: Arc<TypeRegistry>, matrix: Arc<ConversionMatrix>) -> Self {
        Materializer {
            registry,
            matrix,
            config: None,
        }
    }

    /// Attach a column-to-property mapping override.
    #[must_use]
    pub fn with_config(mut self, config: Arc<dyn EntityConfig>) -> Self {
        self.config = Some(config);
        self
    }

    /// The registry backing this engine.
    #[must_use]
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// The conversion matrix backing this engine.
    #[must_use]
    pub fn matrix(&self) -> &Arc<ConversionMatrix> {
        &self.matrix
    }

    /// Stream one `T` per row.
    ///
    /// The population plan is computed here, before the first row.
    ///
    /// # Errors
    /// Fails when the target type cannot be planned against the cursor
    /// schema (e.g. no constructor).
    pub fn stream<'c, T: Reflected>(
        &self,
        cursor: &'c mut dyn RowCursor,
    ) -> Result<EntityStream<'c, T>> {
        let description = self.registry.describe::<T>();
        // Planning needs a constructible target; fail before the first row
        if description.constructor().is_none() {
            return Err(crate::Error::MissingConstructor(description.name));
        }
        let plan = PopulationPlan::build(
            cursor,
            description,
            &self.matrix,
            self.config.as_deref(),
        )?;
        Ok(EntityStream::new(cursor, plan))
    }

    /// Materialize every row into a `Vec<T>`.
    ///
    /// `capacity_hint` pre-sizes the result when the caller knows the row
    /// count; pass `0` when unknown.
    ///
    /// # Errors
    /// Fails on planning failure or on the first row-level failure.
    pub fn fetch_all<T: Reflected>(
        &self,
        cursor: &mut dyn RowCursor,
        capacity_hint: usize,
    ) -> Result<Vec<T>> {
        let mut results = Vec::with_capacity(capacity_hint);
        for entity in self.stream::<T>(cursor)? {
            results.push(entity?);
        }
        Ok(results)
    }

    /// Stream the first column of each row as a typed scalar.
    #[must_use]
    pub fn scalar_stream<'c, T: Reflected + Default>(
        &self,
        cursor: &'c mut dyn RowCursor,
        policy: NullPolicy,
    ) -> ScalarStream<'c, T> {
        ScalarStream::new(cursor, self.matrix.clone(), policy)
    }

    /// Collect the first column of each row into a `Vec<T>`.
    ///
    /// # Errors
    /// Fails on the first cell that cannot convert to `T`.
    pub fn scalars<T: Reflected + Default>(
        &self,
        cursor: &mut dyn RowCursor,
        policy: NullPolicy,
    ) -> Result<Vec<T>> {
        self.scalar_stream(cursor, policy).collect()
    }

    /// Stream rows through a caller-supplied handler, bypassing the cache.
    pub fn stream_with<'c, H: RowHandler>(
        &self,
        cursor: &'c mut dyn RowCursor,
        handler: H,
    ) -> HandlerStream<'c, H> {
        HandlerStream::new(cursor, handler)
    }

    /// Collect every handler output into a `Vec`.
    ///
    /// # Errors
    /// Fails on the first row the handler rejects.
    pub fn fetch_with<H: RowHandler>(
        &self,
        cursor: &mut dyn RowCursor,
        handler: H,
    ) -> Result<Vec<H::Output>> {
        self.stream_with(cursor, handler).collect()
    }
}
