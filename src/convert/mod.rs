//! Value representation and type conversion for row materialization.
//!
//! This module owns everything that happens to a raw column value between the
//! row cursor and an entity property: the tagged [`CellValue`] carrier, the
//! [`CellKind`] kind space, the pairwise [`ConversionMatrix`], and the parsed
//! XML payload types produced by string-to-XML conversions.
//!
//! # Key Components
//!
//! - [`CellValue`] / [`CellKind`]: the value carrier and its kind tags
//! - [`ConversionMatrix`] / [`ConvertFn`]: explicit conversions plus fallback
//! - [`XmlElement`] / [`XmlDocument`]: parsed XML targets
//!
//! # Examples
//!
//! ```rust
//! use rowcast::convert::{CellKind, CellValue, ConversionMatrix};
//!
//! let matrix = ConversionMatrix::new();
//! let convert = matrix.converter(CellKind::I32, CellKind::I64);
//! assert_eq!(convert(CellValue::I32(7))?, CellValue::I64(7));
//! # Ok::<(), rowcast::Error>(())
//! ```

mod matrix;
mod value;
mod xml;

pub use matrix::{coerce, ConversionMatrix, ConvertFn};
pub use value::{CellKind, CellValue};
pub use xml::{parse_document, parse_element, XmlDocument, XmlElement};
