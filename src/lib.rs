// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # rowcast
//!
//! [![Crates.io](https://img.shields.io/crates/v/rowcast.svg)](https://crates.io/crates/rowcast)
//! [![Documentation](https://docs.rs/rowcast/badge.svg)](https://docs.rs/rowcast)
//! [![License](https://img.shields.io/badge/license-Apache--2.0-blue.svg)](https://github.com/BinFlip/rowcast/blob/main/LICENSE-APACHE)
//!
//! A fast entity materialization engine for tabular data sources. `rowcast`
//! turns forward-only row cursors into typed Rust values through a
//! process-wide type metadata cache: each type is described exactly once, its
//! accessors are baked into uniform-call-convention thunks at compile time,
//! and every later row costs one construction plus a walk over pre-bound
//! column slots.
//!
//! ## Features
//!
//! - **🗄️ Type metadata cache** - one description per type for the life of the
//!   process, lock-free reads after first access
//! - **⚡ Accessor thunks** - getters, setters, constructors and method
//!   invokers behind one type-erased call convention, no per-call reflection
//! - **🔀 Conversion matrix** - directional kind-pair converters with a
//!   runtime-driven fallback, including vendor money and XML wrappers
//! - **🚿 Forward-only streams** - entity, scalar and handler iterators with
//!   strict lifecycle semantics and exactly-once completion hooks
//! - **🛡️ Memory safe** - pure Rust, no `unsafe`, explicit error handling on
//!   every fallible path
//!
//! ## Quick Start
//!
//! Add `rowcast` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! rowcast = "0.2"
//! ```
//!
//! Declare an entity and materialize rows into it:
//!
//! ```rust
//! use rowcast::{
//!     convert::{CellKind, CellValue},
//!     entity,
//!     materialize::{Materializer, MemoryCursor},
//! };
//!
//! entity! {
//!     pub struct Customer {
//!         customer_id: i32,
//!         customer_name: String,
//!     }
//! }
//!
//! let mut cursor = MemoryCursor::new(vec![
//!     ("customer_id".to_string(), CellKind::I32),
//!     ("customer_name".to_string(), CellKind::String),
//! ])
//! .with_row(vec![CellValue::I32(1), CellValue::String("Acme".into())]);
//!
//! let engine = Materializer::new();
//! let customers: Vec<Customer> = engine.fetch_all(&mut cursor, 1)?;
//! assert_eq!(customers[0].customer_name, "Acme");
//! # Ok::<(), rowcast::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `rowcast` is organized into four modules, layered bottom-up:
//!
//! - [`convert`] - the [`CellValue`](convert::CellValue) tagged union and the
//!   conversion matrix
//! - [`accessor`] - type-erased accessor thunk shapes and their generators
//! - [`metadata`] - shapes, cached type descriptions and the
//!   [`TypeRegistry`](metadata::TypeRegistry)
//! - [`materialize`] - row cursors, population planning and the forward-only
//!   streams
//! - [`prelude`] - convenient re-exports of the most commonly used types
//!
//! ### The metadata cache
//!
//! The [`metadata::TypeRegistry`] guarantees at most one description
//! construction per type, even under concurrent first access. Member
//! reflection is lazy and keyed by [`metadata::BindingScope`], so public and
//! all-members views of the same type coexist without recomputation.
//!
//! ### Materialization
//!
//! The [`materialize::Materializer`] binds a cursor schema to a target type
//! once, before the first row: column names resolve to properties, kind
//! mismatches resolve to registered converters, and the resulting plan is
//! reused for every row of the stream.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result) with specific failure
//! variants:
//!
//! ```rust
//! use rowcast::{metadata::TypeRegistry, Error};
//!
//! let registry = TypeRegistry::new();
//! match registry.get_by_name("Missing") {
//!     Ok(description) => println!("found `{}`", description.name),
//!     Err(Error::TypeNotFound(name)) => println!("`{name}` was never described"),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Testing
//!
//! The test suite runs entirely in memory through
//! [`materialize::MemoryCursor`]:
//!
//! ```bash
//! cargo test
//! cargo bench  # materialization throughput
//! ```

#[macro_use]
pub(crate) mod error;

pub(crate) mod macros;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use rowcast::prelude::*;
///
/// let registry = TypeRegistry::new();
/// let description = registry.describe::<i32>();
/// assert_eq!(description.classification, CommonUseType::Primitive);
/// ```
pub mod prelude;

/// Type-erased accessor thunks and their compile-time generators.
///
/// Every member operation flows through the function shapes defined here:
/// one downcast per call, no further validation. See [`accessor::getter`],
/// [`accessor::setter`] and [`accessor::constructor`].
pub mod accessor;

/// The tagged cell value, the conversion matrix and XML column parsing.
///
/// [`convert::CellValue`] carries one cell of a row; the
/// [`convert::ConversionMatrix`] adapts kinds between column and property
/// declarations.
pub mod convert;

/// Row cursors, population planning and forward-only materialization streams.
///
/// [`materialize::Materializer`] is the main entry point for turning a
/// [`materialize::RowCursor`] into typed results.
pub mod materialize;

/// Shapes, cached type descriptions and the process-wide registry.
///
/// [`metadata::TypeRegistry`] caches one [`metadata::TypeDescription`] per
/// type; [`metadata::Reflected`] is the trait types implement (usually via
/// the [`entity!`] macro) to participate.
pub mod metadata;

/// `rowcast` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is
/// always [`Error`]. This is used consistently throughout the crate for all
/// fallible operations.
///
/// # Examples
///
/// ```rust
/// use rowcast::{metadata::TypeRegistry, Result};
///
/// fn require_named(registry: &TypeRegistry, name: &str) -> Result<&'static str> {
///     Ok(registry.get_by_name(name)?.name)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `rowcast` Error type
///
/// The main error type for all operations in this crate. Provides detailed
/// error information for shape registration, accessor generation, value
/// conversion and row materialization.
///
/// # Examples
///
/// ```rust
/// use rowcast::{metadata::TypeRegistry, Error};
///
/// let registry = TypeRegistry::new();
/// match registry.get_by_name("Nope") {
///     Ok(_) => println!("described"),
///     Err(Error::TypeNotFound(name)) => println!("`{name}` is unknown"),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
pub use error::Error;

/// The compile-time reflection seam implemented by every describable type.
///
/// Usually derived through the [`entity!`] macro; implemented by hand (with
/// [`metadata::TypeShapeBuilder`]) for shapes the macro cannot express.
///
/// # Example
///
/// ```rust
/// use rowcast::{convert::CellValue, Reflected};
///
/// let cell = 42i64.to_value();
/// assert_eq!(i64::from_value(cell).unwrap(), 42);
/// ```
pub use metadata::Reflected;
