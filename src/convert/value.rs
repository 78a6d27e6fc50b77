//! The tagged value carrier for one cell of a result-set row.
//!
//! Every value travelling between a row cursor and an entity property is
//! represented as a [`CellValue`]. The enum replaces a boxed object-typed
//! calling convention with a move-friendly tagged union: primitive payloads
//! are carried inline, only genuinely complex payloads ride behind an
//! [`Arc`]. The parallel fieldless [`CellKind`] enum identifies a value's
//! runtime kind and is the key space of the conversion matrix.
//!
//! # Key Components
//!
//! - [`CellValue`]: one cell's payload, including database null
//! - [`CellKind`]: the fieldless kind tag used for conversion lookup
//!
//! # Vendor wrapper kinds
//!
//! [`CellValue::Money`] and [`CellValue::Xml`] model vendor scalar wrappers
//! (currency-scaled decimals and XML-typed columns). The conversion matrix
//! registers unwrapping entries for both so they never reach an entity
//! property in wrapped form unless the property asks for it.

use std::{any::Any, fmt, sync::Arc};

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use rust_decimal::{prelude::ToPrimitive, Decimal};
use strum::Display;
use uguid::Guid;

/// Identifies the runtime kind of a [`CellValue`] without its payload.
///
/// This is the key space of the conversion matrix: converters are registered
/// per directional `(source, target)` kind pair. The enum intentionally has
/// no nullable variants; null is structural ([`CellValue::Null`]) and is
/// handled by the null policy before any converter runs.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellKind {
    /// Database null / absent value
    Null,
    /// Boolean value
    Bool,
    /// 8-bit signed integer
    I8,
    /// 16-bit signed integer
    I16,
    /// 32-bit signed integer
    I32,
    /// 64-bit signed integer
    I64,
    /// 8-bit unsigned integer
    U8,
    /// 16-bit unsigned integer
    U16,
    /// 32-bit unsigned integer
    U32,
    /// 64-bit unsigned integer
    U64,
    /// 32-bit floating point
    F32,
    /// 64-bit floating point
    F64,
    /// Exact decimal value
    Decimal,
    /// Vendor currency wrapper (decimal payload, money scale)
    Money,
    /// UTF-8 string value
    String,
    /// Raw binary value
    Bytes,
    /// Globally unique identifier
    Guid,
    /// Date and time without an offset
    DateTime,
    /// Date and time with an explicit offset
    DateTimeOffset,
    /// Vendor XML wrapper (unparsed XML text payload)
    Xml,
    /// Parsed XML element tree
    XmlElement,
    /// Parsed, name-indexable XML document
    XmlDocument,
    /// Type-erased complex payload
    Object,
}

/// One cell of a result-set row, or a value flowing into an entity property.
///
/// `CellValue` is cheap to move and cheap to clone: every payload is either
/// inline or reference counted. [`CellValue::Object`] carries arbitrary
/// entity-typed payloads (nested reference types, parsed XML trees) behind an
/// `Arc<dyn Any>`; accessor thunks downcast it to the concrete type they were
/// generated for.
#[derive(Default)]
pub enum CellValue {
    /// Database null / absent value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// 8-bit signed integer
    I8(i8),
    /// 16-bit signed integer
    I16(i16),
    /// 32-bit signed integer
    I32(i32),
    /// 64-bit signed integer
    I64(i64),
    /// 8-bit unsigned integer
    U8(u8),
    /// 16-bit unsigned integer
    U16(u16),
    /// 32-bit unsigned integer
    U32(u32),
    /// 64-bit unsigned integer
    U64(u64),
    /// 32-bit floating point
    F32(f32),
    /// 64-bit floating point
    F64(f64),
    /// Exact decimal value
    Decimal(Decimal),
    /// Vendor currency wrapper
    Money(Decimal),
    /// UTF-8 string value
    String(String),
    /// Raw binary value
    Bytes(Vec<u8>),
    /// Globally unique identifier
    Guid(Guid),
    /// Date and time without an offset
    DateTime(NaiveDateTime),
    /// Date and time with an explicit offset
    DateTimeOffset(DateTime<FixedOffset>),
    /// Vendor XML wrapper, carrying the unparsed XML text
    Xml(String),
    /// Type-erased complex payload
    Object(Arc<dyn Any + Send + Sync>),
}

impl CellValue {
    /// Wrap an arbitrary value as a type-erased [`CellValue::Object`] payload.
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        CellValue::Object(Arc::new(value))
    }

    /// The runtime kind of this value.
    #[must_use]
    pub fn kind(&self) -> CellKind {
        match self {
            CellValue::Null => CellKind::Null,
            CellValue::Bool(_) => CellKind::Bool,
            CellValue::I8(_) => CellKind::I8,
            CellValue::I16(_) => CellKind::I16,
            CellValue::I32(_) => CellKind::I32,
            CellValue::I64(_) => CellKind::I64,
            CellValue::U8(_) => CellKind::U8,
            CellValue::U16(_) => CellKind::U16,
            CellValue::U32(_) => CellKind::U32,
            CellValue::U64(_) => CellKind::U64,
            CellValue::F32(_) => CellKind::F32,
            CellValue::F64(_) => CellKind::F64,
            CellValue::Decimal(_) => CellKind::Decimal,
            CellValue::Money(_) => CellKind::Money,
            CellValue::String(_) => CellKind::String,
            CellValue::Bytes(_) => CellKind::Bytes,
            CellValue::Guid(_) => CellKind::Guid,
            CellValue::DateTime(_) => CellKind::DateTime,
            CellValue::DateTimeOffset(_) => CellKind::DateTimeOffset,
            CellValue::Xml(_) => CellKind::Xml,
            CellValue::Object(_) => CellKind::Object,
        }
    }

    /// `true` if this cell carries a database null.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Try to view an [`CellValue::Object`] payload as a concrete type.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            CellValue::Object(payload) => payload.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Try to coerce to a boolean value.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Bool(value) => Some(*value),
            CellValue::I8(value) => Some(*value != 0),
            CellValue::I16(value) => Some(*value != 0),
            CellValue::I32(value) => Some(*value != 0),
            CellValue::I64(value) => Some(*value != 0),
            CellValue::U8(value) => Some(*value != 0),
            CellValue::U16(value) => Some(*value != 0),
            CellValue::U32(value) => Some(*value != 0),
            CellValue::U64(value) => Some(*value != 0),
            _ => None,
        }
    }

    /// Try to coerce to a 32-bit integer value.
    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            CellValue::Bool(value) => Some(i32::from(*value)),
            CellValue::I8(value) => Some(i32::from(*value)),
            CellValue::I16(value) => Some(i32::from(*value)),
            CellValue::I32(value) => Some(*value),
            CellValue::I64(value) => i32::try_from(*value).ok(),
            CellValue::U8(value) => Some(i32::from(*value)),
            CellValue::U16(value) => Some(i32::from(*value)),
            CellValue::U32(value) => i32::try_from(*value).ok(),
            CellValue::U64(value) => i32::try_from(*value).ok(),
            CellValue::F32(value) => {
                #[allow(clippy::cast_precision_loss)]
                if value.is_finite() && *value >= i32::MIN as f32 && *value <= i32::MAX as f32 {
                    #[allow(clippy::cast_possible_truncation)]
                    Some(*value as i32)
                } else {
                    None
                }
            }
            CellValue::F64(value) => {
                if value.is_finite()
                    && *value >= f64::from(i32::MIN)
                    && *value <= f64::from(i32::MAX)
                {
                    #[allow(clippy::cast_possible_truncation)]
                    Some(*value as i32)
                } else {
                    None
                }
            }
            CellValue::Decimal(value) | CellValue::Money(value) => value.trunc().to_i32(),
            CellValue::String(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    /// Try to coerce to a 64-bit integer value.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Bool(value) => Some(i64::from(*value)),
            CellValue::I8(value) => Some(i64::from(*value)),
            CellValue::I16(value) => Some(i64::from(*value)),
            CellValue::I32(value) => Some(i64::from(*value)),
            CellValue::I64(value) => Some(*value),
            CellValue::U8(value) => Some(i64::from(*value)),
            CellValue::U16(value) => Some(i64::from(*value)),
            CellValue::U32(value) => Some(i64::from(*value)),
            CellValue::U64(value) => i64::try_from(*value).ok(),
            CellValue::F32(value) => {
                #[allow(clippy::cast_precision_loss)]
                if value.is_finite() && *value >= i64::MIN as f32 && *value <= i64::MAX as f32 {
                    #[allow(clippy::cast_possible_truncation)]
                    Some(*value as i64)
                } else {
                    None
                }
            }
            CellValue::F64(value) => {
                #[allow(clippy::cast_precision_loss)]
                if value.is_finite() && *value >= i64::MIN as f64 && *value <= i64::MAX as f64 {
                    #[allow(clippy::cast_possible_truncation)]
                    Some(*value as i64)
                } else {
                    None
                }
            }
            CellValue::Decimal(value) | CellValue::Money(value) => value.trunc().to_i64(),
            CellValue::String(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    /// Try to coerce to a floating point value.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Bool(value) => Some(f64::from(*value)),
            CellValue::I8(value) => Some(f64::from(*value)),
            CellValue::I16(value) => Some(f64::from(*value)),
            CellValue::I32(value) => Some(f64::from(*value)),
            #[allow(clippy::cast_precision_loss)]
            CellValue::I64(value) => Some(*value as f64),
            CellValue::U8(value) => Some(f64::from(*value)),
            CellValue::U16(value) => Some(f64::from(*value)),
            CellValue::U32(value) => Some(f64::from(*value)),
            #[allow(clippy::cast_precision_loss)]
            CellValue::U64(value) => Some(*value as f64),
            CellValue::F32(value) => Some(f64::from(*value)),
            CellValue::F64(value) => Some(*value),
            CellValue::Decimal(value) | CellValue::Money(value) => value.to_f64(),
            CellValue::String(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    /// Try to coerce to an exact decimal value.
    #[must_use]
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            CellValue::Bool(value) => Some(Decimal::from(u8::from(*value))),
            CellValue::I8(value) => Some(Decimal::from(*value)),
            CellValue::I16(value) => Some(Decimal::from(*value)),
            CellValue::I32(value) => Some(Decimal::from(*value)),
            CellValue::I64(value) => Some(Decimal::from(*value)),
            CellValue::U8(value) => Some(Decimal::from(*value)),
            CellValue::U16(value) => Some(Decimal::from(*value)),
            CellValue::U32(value) => Some(Decimal::from(*value)),
            CellValue::U64(value) => Some(Decimal::from(*value)),
            CellValue::F32(value) => Decimal::try_from(*value).ok(),
            CellValue::F64(value) => Decimal::try_from(*value).ok(),
            CellValue::Decimal(value) | CellValue::Money(value) => Some(*value),
            CellValue::String(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    /// Try to coerce to a string value.
    #[must_use]
    pub fn as_string(&self) -> Option<String> {
        match self {
            CellValue::Bool(value) => Some(value.to_string()),
            CellValue::I8(value) => Some(value.to_string()),
            CellValue::I16(value) => Some(value.to_string()),
            CellValue::I32(value) => Some(value.to_string()),
            CellValue::I64(value) => Some(value.to_string()),
            CellValue::U8(value) => Some(value.to_string()),
            CellValue::U16(value) => Some(value.to_string()),
            CellValue::U32(value) => Some(value.to_string()),
            CellValue::U64(value) => Some(value.to_string()),
            CellValue::F32(value) => Some(value.to_string()),
            CellValue::F64(value) => Some(value.to_string()),
            CellValue::Decimal(value) | CellValue::Money(value) => Some(value.to_string()),
            CellValue::String(value) | CellValue::Xml(value) => Some(value.clone()),
            CellValue::Guid(value) => Some(value.to_string()),
            CellValue::DateTime(value) => Some(value.to_string()),
            CellValue::DateTimeOffset(value) => Some(value.to_rfc3339()),
            _ => None,
        }
    }

    /// Try to coerce to a date/time without offset, preserving the instant.
    #[must_use]
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::DateTime(value) => Some(*value),
            CellValue::DateTimeOffset(value) => Some(value.naive_utc()),
            CellValue::String(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    /// Try to coerce to a date/time with offset, preserving the instant.
    ///
    /// Offset-free values are interpreted as UTC, which keeps the instant
    /// stable across a round trip through either representation.
    #[must_use]
    pub fn as_datetime_offset(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            CellValue::DateTimeOffset(value) => Some(*value),
            CellValue::DateTime(value) => Some(Utc.from_utc_datetime(value).fixed_offset()),
            CellValue::String(value) => DateTime::parse_from_rfc3339(value.trim()).ok(),
            _ => None,
        }
    }
}

impl Clone for CellValue {
    fn clone(&self) -> Self {
        match self {
            CellValue::Null => CellValue::Null,
            CellValue::Bool(value) => CellValue::Bool(*value),
            CellValue::I8(value) => CellValue::I8(*value),
            CellValue::I16(value) => CellValue::I16(*value),
            CellValue::I32(value) => CellValue::I32(*value),
            CellValue::I64(value) => CellValue::I64(*value),
            CellValue::U8(value) => CellValue::U8(*value),
            CellValue::U16(value) => CellValue::U16(*value),
            CellValue::U32(value) => CellValue::U32(*value),
            CellValue::U64(value) => CellValue::U64(*value),
            CellValue::F32(value) => CellValue::F32(*value),
            CellValue::F64(value) => CellValue::F64(*value),
            CellValue::Decimal(value) => CellValue::Decimal(*value),
            CellValue::Money(value) => CellValue::Money(*value),
            CellValue::String(value) => CellValue::String(value.clone()),
            CellValue::Bytes(value) => CellValue::Bytes(value.clone()),
            CellValue::Guid(value) => CellValue::Guid(*value),
            CellValue::DateTime(value) => CellValue::DateTime(*value),
            CellValue::DateTimeOffset(value) => CellValue::DateTimeOffset(*value),
            CellValue::Xml(value) => CellValue::Xml(value.clone()),
            CellValue::Object(payload) => CellValue::Object(Arc::clone(payload)),
        }
    }
}

impl fmt::Debug for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "Null"),
            CellValue::Bool(value) => write!(f, "Bool({value})"),
            CellValue::I8(value) => write!(f, "I8({value})"),
            CellValue::I16(value) => write!(f, "I16({value})"),
            CellValue::I32(value) => write!(f, "I32({value})"),
            CellValue::I64(value) => write!(f, "I64({value})"),
            CellValue::U8(value) => write!(f, "U8({value})"),
            CellValue::U16(value) => write!(f, "U16({value})"),
            CellValue::U32(value) => write!(f, "U32({value})"),
            CellValue::U64(value) => write!(f, "U64({value})"),
            CellValue::F32(value) => write!(f, "F32({value})"),
            CellValue::F64(value) => write!(f, "F64({value})"),
            CellValue::Decimal(value) => write!(f, "Decimal({value})"),
            CellValue::Money(value) => write!(f, "Money({value})"),
            CellValue::String(value) => write!(f, "String({value:?})"),
            CellValue::Bytes(value) => write!(f, "Bytes({} bytes)", value.len()),
            CellValue::Guid(value) => write!(f, "Guid({value})"),
            CellValue::DateTime(value) => write!(f, "DateTime({value})"),
            CellValue::DateTimeOffset(value) => write!(f, "DateTimeOffset({value})"),
            CellValue::Xml(value) => write!(f, "Xml({value:?})"),
            CellValue::Object(_) => write!(f, "Object(..)"),
        }
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Null, CellValue::Null) => true,
            (CellValue::Bool(a), CellValue::Bool(b)) => a == b,
            (CellValue::I8(a), CellValue::I8(b)) => a == b,
            (CellValue::I16(a), CellValue::I16(b)) => a == b,
            (CellValue::I32(a), CellValue::I32(b)) => a == b,
            (CellValue::I64(a), CellValue::I64(b)) => a == b,
            (CellValue::U8(a), CellValue::U8(b)) => a == b,
            (CellValue::U16(a), CellValue::U16(b)) => a == b,
            (CellValue::U32(a), CellValue::U32(b)) => a == b,
            (CellValue::U64(a), CellValue::U64(b)) => a == b,
            (CellValue::F32(a), CellValue::F32(b)) => a == b,
            (CellValue::F64(a), CellValue::F64(b)) => a == b,
            (CellValue::Decimal(a), CellValue::Decimal(b)) => a == b,
            (CellValue::Money(a), CellValue::Money(b)) => a == b,
            (CellValue::String(a), CellValue::String(b)) => a == b,
            (CellValue::Bytes(a), CellValue::Bytes(b)) => a == b,
            (CellValue::Guid(a), CellValue::Guid(b)) => a == b,
            (CellValue::DateTime(a), CellValue::DateTime(b)) => a == b,
            (CellValue::DateTimeOffset(a), CellValue::DateTimeOffset(b)) => a == b,
            (CellValue::Xml(a), CellValue::Xml(b)) => a == b,
            (CellValue::Object(a), CellValue::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        assert_eq!(CellValue::Null.kind(), CellKind::Null);
        assert_eq!(CellValue::I32(5).kind(), CellKind::I32);
        assert_eq!(CellValue::Money(Decimal::new(100, 2)).kind(), CellKind::Money);
        assert_eq!(CellValue::Xml("<a/>".into()).kind(), CellKind::Xml);
        assert_eq!(CellValue::object(vec![1u8]).kind(), CellKind::Object);
    }

    #[test]
    fn test_numeric_coercions() {
        assert_eq!(CellValue::I64(42).as_i32(), Some(42));
        assert_eq!(CellValue::I64(i64::from(i32::MAX) + 1).as_i32(), None);
        assert_eq!(CellValue::F64(3.9).as_i32(), Some(3));
        assert_eq!(CellValue::Decimal(Decimal::new(55, 1)).as_i64(), Some(5));
        assert_eq!(CellValue::String(" 17 ".into()).as_i32(), Some(17));
        assert_eq!(CellValue::Bool(true).as_i64(), Some(1));
        assert_eq!(CellValue::Bytes(vec![]).as_i32(), None);
    }

    #[test]
    fn test_datetime_coercions_preserve_instant() {
        let naive = NaiveDateTime::parse_from_str("2024-05-01 12:30:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        let with_offset = CellValue::DateTime(naive).as_datetime_offset().unwrap();
        assert_eq!(with_offset.naive_utc(), naive);

        let back = CellValue::DateTimeOffset(with_offset).as_datetime().unwrap();
        assert_eq!(back, naive);
    }

    #[test]
    fn test_object_downcast() {
        let value = CellValue::object(String::from("payload"));
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some("payload"));
        assert!(value.downcast_ref::<i32>().is_none());
    }
}
