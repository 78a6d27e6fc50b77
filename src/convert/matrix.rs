//! Pairwise value-conversion matrix.
//!
//! The matrix maps a directional `(source, target)` pair of [`CellKind`]s to
//! a conversion function. Hot-path conversions (numeric widening and
//! narrowing, temporal with/without offset, vendor wrapper unwrapping,
//! string-to-XML parsing) are registered explicitly at construction; any
//! unregistered pair falls back to a generic, runtime-kind-driven coercion
//! that exists for completeness rather than speed.
//!
//! # Key Components
//!
//! - [`ConversionMatrix`]: the registry of conversion functions
//! - [`ConvertFn`]: the uniform conversion signature
//! - [`coerce`]: the generic fallback coercion
//!
//! # Conversion semantics
//!
//! Narrowing conversions are *unchecked* by contract: an `i64` that does not
//! fit an `i32` wraps instead of raising an overflow error, and decimals
//! truncate toward zero before narrowing. Directionality matters: `(A, B)`
//! and `(B, A)` are distinct entries, each registered on its own.
//!
//! # Thread Safety
//!
//! Conversion functions are pure `Send + Sync` values; once published in the
//! matrix they are safe for unrestricted concurrent reuse. Registration uses
//! a concurrent map and may race only with itself, last write wins.

use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::{prelude::ToPrimitive, Decimal};
use uguid::Guid;

use crate::{
    convert::{
        xml::{parse_document, parse_element},
        CellKind, CellValue,
    },
    Error::ConversionInvalid,
    Result,
};

/// The uniform conversion signature: consume a raw cell, produce the
/// converted cell.
pub type ConvertFn = Arc<dyn Fn(CellValue) -> Result<CellValue> + Send + Sync>;

/// Registry of explicit `(source, target)` conversion functions with a
/// generic fallback for unregistered pairs.
pub struct ConversionMatrix {
    /// Directional conversion entries
    entries: DashMap<(CellKind, CellKind), ConvertFn>,
}

impl Default for ConversionMatrix {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionMatrix {
    /// Create a matrix populated with the built-in conversion families.
    #[must_use]
    pub fn new() -> Self {
        let matrix = Self::empty();
        matrix.register_numeric();
        matrix.register_temporal();
        matrix.register_wrappers();
        matrix
    }

    /// Create a matrix with no registered entries; every request uses the
    /// generic fallback until entries are registered.
    #[must_use]
    pub fn empty() -> Self {
        ConversionMatrix {
            entries: DashMap::new(),
        }
    }

    /// Register (or replace) the conversion for one directional pair.
    pub fn register(
        &self,
        from: CellKind,
        to: CellKind,
        convert: impl Fn(CellValue) -> Result<CellValue> + Send + Sync + 'static,
    ) {
        self.entries.insert((from, to), Arc::new(convert));
    }

    /// Look up the registered conversion for a directional pair, if any.
    #[must_use]
    pub fn resolve(&self, from: CellKind, to: CellKind) -> Option<ConvertFn> {
        self.entries.get(&(from, to)).map(|entry| entry.clone())
    }

    /// The conversion for a directional pair: the registered entry when one
    /// exists, otherwise a function applying the generic [`coerce`] fallback.
    #[must_use]
    pub fn converter(&self, from: CellKind, to: CellKind) -> ConvertFn {
        match self.resolve(from, to) {
            Some(convert) => convert,
            None => Arc::new(move |value| coerce(value, to)),
        }
    }

    /// Number of registered directional entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if no entries are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn register_numeric(&self) {
        use CellKind as K;

        // Widenings within the signed family
        self.register(K::I8, K::I16, |v| Ok(CellValue::I16(expect_i64(&v)? as i16)));
        self.register(K::I8, K::I32, |v| Ok(CellValue::I32(expect_i64(&v)? as i32)));
        self.register(K::I8, K::I64, |v| Ok(CellValue::I64(expect_i64(&v)?)));
        self.register(K::I16, K::I32, |v| Ok(CellValue::I32(expect_i64(&v)? as i32)));
        self.register(K::I16, K::I64, |v| Ok(CellValue::I64(expect_i64(&v)?)));
        self.register(K::I32, K::I64, |v| Ok(CellValue::I64(expect_i64(&v)?)));

        // Widenings from the unsigned family
        self.register(K::U8, K::I16, |v| Ok(CellValue::I16(expect_i64(&v)? as i16)));
        self.register(K::U8, K::I32, |v| Ok(CellValue::I32(expect_i64(&v)? as i32)));
        self.register(K::U8, K::I64, |v| Ok(CellValue::I64(expect_i64(&v)?)));
        self.register(K::U16, K::I32, |v| Ok(CellValue::I32(expect_i64(&v)? as i32)));
        self.register(K::U16, K::I64, |v| Ok(CellValue::I64(expect_i64(&v)?)));
        self.register(K::U32, K::I64, |v| Ok(CellValue::I64(expect_i64(&v)?)));

        // Into floating point
        self.register(K::I32, K::F64, |v| {
            #[allow(clippy::cast_precision_loss)]
            Ok(CellValue::F64(expect_i64(&v)? as f64))
        });
        self.register(K::I64, K::F64, |v| {
            #[allow(clippy::cast_precision_loss)]
            Ok(CellValue::F64(expect_i64(&v)? as f64))
        });
        self.register(K::F32, K::F64, |v| match v {
            CellValue::F32(value) => Ok(CellValue::F64(f64::from(value))),
            other => coerce(other, K::F64),
        });

        // Into decimal
        self.register(K::I8, K::Decimal, |v| Ok(CellValue::Decimal(Decimal::from(expect_i64(&v)?))));
        self.register(K::I16, K::Decimal, |v| Ok(CellValue::Decimal(Decimal::from(expect_i64(&v)?))));
        self.register(K::I32, K::Decimal, |v| Ok(CellValue::Decimal(Decimal::from(expect_i64(&v)?))));
        self.register(K::I64, K::Decimal, |v| Ok(CellValue::Decimal(Decimal::from(expect_i64(&v)?))));
        self.register(K::U8, K::Decimal, |v| Ok(CellValue::Decimal(Decimal::from(expect_i64(&v)?))));

        // Unchecked narrowings: truncate toward zero, then wrap
        self.register(K::I64, K::I32, |v| Ok(CellValue::I32(expect_i64(&v)? as i32)));
        self.register(K::I64, K::I16, |v| Ok(CellValue::I16(expect_i64(&v)? as i16)));
        self.register(K::I32, K::I16, |v| Ok(CellValue::I16(expect_i64(&v)? as i16)));
        self.register(K::I32, K::I8, |v| Ok(CellValue::I8(expect_i64(&v)? as i8)));
        self.register(K::I32, K::U8, |v| Ok(CellValue::U8(expect_i64(&v)? as u8)));
        self.register(K::Decimal, K::I32, |v| {
            Ok(CellValue::I32(expect_decimal(&v)?.trunc().to_i64().unwrap_or_default() as i32))
        });
        self.register(K::Decimal, K::I64, |v| {
            Ok(CellValue::I64(expect_decimal(&v)?.trunc().to_i64().unwrap_or_default()))
        });
        self.register(K::F64, K::I32, |v| match v {
            CellValue::F64(value) => {
                #[allow(clippy::cast_possible_truncation)]
                Ok(CellValue::I32(value as i32))
            }
            other => coerce(other, K::I32),
        });
        self.register(K::F64, K::F32, |v| match v {
            CellValue::F64(value) => {
                #[allow(clippy::cast_possible_truncation)]
                Ok(CellValue::F32(value as f32))
            }
            other => coerce(other, K::F32),
        });
    }

    fn register_temporal(&self) {
        use CellKind as K;

        self.register(K::DateTime, K::DateTimeOffset, |v| {
            v.as_datetime_offset()
                .map(CellValue::DateTimeOffset)
                .ok_or(ConversionInvalid {
                    from: v.kind(),
                    to: K::DateTimeOffset,
                })
        });
        self.register(K::DateTimeOffset, K::DateTime, |v| {
            v.as_datetime()
                .map(CellValue::DateTime)
                .ok_or(ConversionInvalid {
                    from: v.kind(),
                    to: K::DateTime,
                })
        });
        self.register(K::String, K::DateTime, |v| coerce(v, K::DateTime));
        self.register(K::String, K::DateTimeOffset, |v| coerce(v, K::DateTimeOffset));
    }

    fn register_wrappers(&self) {
        use CellKind as K;

        // Vendor money wrapper unwraps into native numerics
        self.register(K::Money, K::Decimal, |v| {
            Ok(CellValue::Decimal(expect_decimal(&v)?))
        });
        self.register(K::Money, K::F64, |v| {
            let value = expect_decimal(&v)?;
            value.to_f64().map(CellValue::F64).ok_or(ConversionInvalid {
                from: K::Money,
                to: K::F64,
            })
        });
        self.register(K::Money, K::I64, |v| {
            Ok(CellValue::I64(expect_decimal(&v)?.trunc().to_i64().unwrap_or_default()))
        });
        self.register(K::Decimal, K::Money, |v| Ok(CellValue::Money(expect_decimal(&v)?)));

        // Guid and string
        self.register(K::Guid, K::String, |v| match v {
            CellValue::Guid(value) => Ok(CellValue::String(value.to_string())),
            other => coerce(other, K::String),
        });
        self.register(K::String, K::Guid, |v| coerce(v, K::Guid));

        // XML wrapper: unwrap to text, or parse into tree shapes
        self.register(K::Xml, K::String, |v| match v {
            CellValue::Xml(text) => Ok(CellValue::String(text)),
            other => coerce(other, K::String),
        });
        self.register(K::String, K::Xml, |v| match v {
            CellValue::String(text) => Ok(CellValue::Xml(text)),
            other => coerce(other, K::Xml),
        });
        self.register(K::Xml, K::XmlElement, |v| parse_xml_cell(v, false));
        self.register(K::Xml, K::XmlDocument, |v| parse_xml_cell(v, true));
        self.register(K::String, K::XmlElement, |v| parse_xml_cell(v, false));
        self.register(K::String, K::XmlDocument, |v| parse_xml_cell(v, true));
    }
}

/// Parse an XML-bearing cell into a tree payload.
///
/// Malformed XML propagates the parse failure unmodified.
fn parse_xml_cell(value: CellValue, document: bool) -> Result<CellValue> {
    let kind = value.kind();
    let text = match value {
        CellValue::Xml(text) | CellValue::String(text) => text,
        _ => {
            return Err(ConversionInvalid {
                from: kind,
                to: if document {
                    CellKind::XmlDocument
                } else {
                    CellKind::XmlElement
                },
            })
        }
    };
    if document {
        Ok(CellValue::object(parse_document(&text)?))
    } else {
        Ok(CellValue::object(parse_element(&text)?))
    }
}

fn expect_i64(value: &CellValue) -> Result<i64> {
    value.as_i64().ok_or(ConversionInvalid {
        from: value.kind(),
        to: CellKind::I64,
    })
}

fn expect_decimal(value: &CellValue) -> Result<Decimal> {
    value.as_decimal().ok_or(ConversionInvalid {
        from: value.kind(),
        to: CellKind::Decimal,
    })
}

/// Generic, runtime-kind-driven coercion used when no explicit entry exists
/// for a `(source, target)` pair.
///
/// This path exists for completeness, not speed: it re-inspects the value's
/// runtime kind on every call. Null passes through unchanged so the null
/// policy upstream stays authoritative.
///
/// # Errors
/// Returns [`ConversionInvalid`] when the value cannot be represented in the
/// target kind; XML targets propagate parse failures.
pub fn coerce(value: CellValue, target: CellKind) -> Result<CellValue> {
    if value.is_null() {
        return Ok(CellValue::Null);
    }

    let invalid = ConversionInvalid {
        from: value.kind(),
        to: target,
    };

    match target {
        CellKind::Null => Ok(CellValue::Null),
        CellKind::Bool => value.as_bool().map(CellValue::Bool).ok_or(invalid),
        CellKind::I8 => value.as_i64().map(|v| CellValue::I8(v as i8)).ok_or(invalid),
        CellKind::I16 => value.as_i64().map(|v| CellValue::I16(v as i16)).ok_or(invalid),
        CellKind::I32 => value
            .as_i64()
            .map(|v| CellValue::I32(v as i32))
            .ok_or(invalid),
        CellKind::I64 => value.as_i64().map(CellValue::I64).ok_or(invalid),
        CellKind::U8 => value.as_i64().map(|v| CellValue::U8(v as u8)).ok_or(invalid),
        CellKind::U16 => value.as_i64().map(|v| CellValue::U16(v as u16)).ok_or(invalid),
        CellKind::U32 => value.as_i64().map(|v| CellValue::U32(v as u32)).ok_or(invalid),
        CellKind::U64 => value.as_i64().map(|v| CellValue::U64(v as u64)).ok_or(invalid),
        CellKind::F32 => {
            #[allow(clippy::cast_possible_truncation)]
            value
                .as_f64()
                .map(|v| CellValue::F32(v as f32))
                .ok_or(invalid)
        }
        CellKind::F64 => value.as_f64().map(CellValue::F64).ok_or(invalid),
        CellKind::Decimal => value.as_decimal().map(CellValue::Decimal).ok_or(invalid),
        CellKind::Money => value.as_decimal().map(CellValue::Money).ok_or(invalid),
        CellKind::String => value.as_string().map(CellValue::String).ok_or(invalid),
        CellKind::Bytes => match value {
            CellValue::Bytes(bytes) => Ok(CellValue::Bytes(bytes)),
            CellValue::String(text) => Ok(CellValue::Bytes(text.into_bytes())),
            _ => Err(invalid),
        },
        CellKind::Guid => match &value {
            CellValue::Guid(guid) => Ok(CellValue::Guid(*guid)),
            CellValue::String(text) => {
                text.trim().parse::<Guid>().map(CellValue::Guid).map_err(|_| invalid)
            }
            _ => Err(invalid),
        },
        CellKind::DateTime => value.as_datetime().map(CellValue::DateTime).ok_or(invalid),
        CellKind::DateTimeOffset => value
            .as_datetime_offset()
            .map(CellValue::DateTimeOffset)
            .ok_or(invalid),
        CellKind::Xml => value.as_string().map(CellValue::Xml).ok_or(invalid),
        CellKind::XmlElement => parse_xml_cell(value, false),
        CellKind::XmlDocument => parse_xml_cell(value, true),
        CellKind::Object => match value {
            CellValue::Object(payload) => Ok(CellValue::Object(payload)),
            _ => Err(invalid),
        },
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;
    use crate::convert::XmlDocument;

    #[test]
    fn test_widening_int_to_decimal() {
        let matrix = ConversionMatrix::new();
        let convert = matrix.resolve(CellKind::I32, CellKind::Decimal).unwrap();
        assert_eq!(
            convert(CellValue::I32(5)).unwrap(),
            CellValue::Decimal(Decimal::from(5))
        );
    }

    #[test]
    fn test_narrowing_is_unchecked() {
        let matrix = ConversionMatrix::new();
        let convert = matrix.resolve(CellKind::I64, CellKind::I32).unwrap();
        // 4294967300 wraps, it does not raise an overflow error
        assert_eq!(
            convert(CellValue::I64(4_294_967_300)).unwrap(),
            CellValue::I32(4)
        );

        let convert = matrix.resolve(CellKind::Decimal, CellKind::I32).unwrap();
        assert_eq!(
            convert(CellValue::Decimal(Decimal::new(79, 1))).unwrap(),
            CellValue::I32(7)
        );
    }

    #[test]
    fn test_temporal_preserves_instant() {
        let matrix = ConversionMatrix::new();
        let naive =
            NaiveDateTime::parse_from_str("2024-05-01 12:30:00", "%Y-%m-%d %H:%M:%S").unwrap();

        let forward = matrix
            .resolve(CellKind::DateTime, CellKind::DateTimeOffset)
            .unwrap();
        let with_offset = match forward(CellValue::DateTime(naive)).unwrap() {
            CellValue::DateTimeOffset(value) => value,
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(with_offset.naive_utc(), naive);

        let backward = matrix
            .resolve(CellKind::DateTimeOffset, CellKind::DateTime)
            .unwrap();
        assert_eq!(
            backward(CellValue::DateTimeOffset(with_offset)).unwrap(),
            CellValue::DateTime(naive)
        );
    }

    #[test]
    fn test_unregistered_pair_falls_back() {
        let matrix = ConversionMatrix::new();
        assert!(matrix.resolve(CellKind::U16, CellKind::U64).is_none());

        let convert = matrix.converter(CellKind::U16, CellKind::U64);
        assert_eq!(convert(CellValue::U16(9)).unwrap(), CellValue::U64(9));
    }

    #[test]
    fn test_money_unwraps() {
        let matrix = ConversionMatrix::new();
        let convert = matrix.resolve(CellKind::Money, CellKind::Decimal).unwrap();
        assert_eq!(
            convert(CellValue::Money(Decimal::new(1999, 2))).unwrap(),
            CellValue::Decimal(Decimal::new(1999, 2))
        );
    }

    #[test]
    fn test_string_to_xml_document() {
        let matrix = ConversionMatrix::new();
        let convert = matrix
            .resolve(CellKind::String, CellKind::XmlDocument)
            .unwrap();
        let cell = convert(CellValue::String("<root><leaf/></root>".into())).unwrap();
        let document = cell.downcast_ref::<XmlDocument>().unwrap();
        assert!(document.get("leaf").is_some());

        let failure = convert(CellValue::String("<root>".into()));
        assert!(failure.is_err());
    }

    #[test]
    fn test_fallback_rejects_impossible_pairs() {
        let failure = coerce(CellValue::Bytes(vec![1, 2]), CellKind::I32);
        assert!(matches!(failure, Err(ConversionInvalid { .. })));
    }

    #[test]
    fn test_null_passes_through_fallback() {
        assert_eq!(coerce(CellValue::Null, CellKind::I32).unwrap(), CellValue::Null);
    }
}
