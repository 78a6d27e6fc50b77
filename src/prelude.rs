//! # rowcast Prelude
//!
//! This module provides a convenient prelude for the most commonly used types
//! and traits from the rowcast library. Import this module to get quick
//! access to the essential types for entity materialization.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all rowcast operations
pub use crate::Error;

/// The result type used throughout rowcast
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// The materialization engine pairing a registry with a conversion matrix
pub use crate::materialize::Materializer;

/// The process-wide type metadata cache
pub use crate::metadata::TypeRegistry;

/// The compile-time reflection seam, usually derived with [`entity!`](crate::entity)
pub use crate::metadata::Reflected;

// ================================================================================================
// Value Model and Conversion
// ================================================================================================

/// One cell of a row and its fieldless kind tag
pub use crate::convert::{CellKind, CellValue};

/// Directional kind-pair conversion with a runtime-driven fallback
pub use crate::convert::{coerce, ConversionMatrix, ConvertFn};

/// Parsed XML column payloads
pub use crate::convert::{XmlDocument, XmlElement};

// ================================================================================================
// Metadata System
// ================================================================================================

/// Cached per-type metadata and its member descriptions
pub use crate::metadata::{
    FieldDescription, MethodDescription, PropertyDescription, TypeDescription,
};

/// Classification tags and structural flags
pub use crate::metadata::{classify, CommonUseType, ShapeTraits, TypeFlags};

/// The scope model for member-reflection passes
pub use crate::metadata::{BindingScope, Visibility};

/// Hand-registration of shapes the `entity!` macro cannot express
pub use crate::metadata::{TypeShape, TypeShapeBuilder};

// ================================================================================================
// Materialization
// ================================================================================================

/// The result-source boundary and its in-memory implementation
pub use crate::materialize::{MemoryCursor, RowCursor};

/// Forward-only streams over cursor rows
pub use crate::materialize::{EntityStream, HandlerStream, RowHandler, ScalarStream};

/// Null handling and mapping configuration
pub use crate::materialize::{EntityConfig, NullPolicy};
