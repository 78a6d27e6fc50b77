use thiserror::Error;

use crate::convert::CellKind;

macro_rules! shape_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Shape {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Shape {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers all possible error conditions that can occur during type description,
/// accessor thunk generation, value conversion, and row materialization. Each variant provides
/// specific context about the failure mode to enable appropriate error handling.
///
/// # Error Categories
///
/// ## Shape and Configuration Errors
/// - [`Error::Shape`] - A registered type shape is invalid or inconsistent
/// - [`Error::UnsupportedMember`] - A member cannot be expressed as an accessor thunk
/// - [`Error::MissingConstructor`] - No default constructor thunk is registered
/// - [`Error::SetterUnavailable`] - No setter exists under the requested binding scope
///
/// ## Materialization Errors
/// - [`Error::Assignment`] - A column value cannot be assigned to its target property
/// - [`Error::ResetUnsupported`] - Rewinding a forward-only stream was requested
///
/// ## Conversion Errors
/// - [`Error::ConversionInvalid`] - The requested value conversion is not possible
/// - [`Error::Xml`] - Malformed XML text in a column value
///
/// ## Type System Errors
/// - [`Error::TypeNotFound`] - Requested type not present in the registry
#[derive(Error, Debug)]
pub enum Error {
    /// A registered type shape is invalid or internally inconsistent.
    ///
    /// This error is raised while turning a shape blueprint into a
    /// [`crate::metadata::TypeDescription`], before any row is processed. The error
    /// includes the source location where the problem was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was wrong with the shape
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Shape - {file}:{line}: {message}")]
    Shape {
        /// The message to be printed for the Shape error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A member cannot be expressed as an accessor thunk.
    ///
    /// Raised at thunk-generation time, never deferred to first use. The primary
    /// case is a method declaring an `out` parameter; the message names the
    /// offending parameter.
    #[error("Unsupported member shape on `{member}`: {reason}")]
    UnsupportedMember {
        /// The member whose shape is unsupported
        member: String,
        /// Why the member cannot be turned into a thunk
        reason: String,
    },

    /// No default constructor thunk is registered for a type that requires one.
    ///
    /// Complex entity types must carry a constructor thunk before a population
    /// plan can be compiled for them. Shapes registered through the builder
    /// without a constructor trigger this error at plan-build time.
    #[error("Type `{0}` has no default constructor registered")]
    MissingConstructor(&'static str),

    /// No setter exists for a property under the requested binding scope.
    ///
    /// Raised by the late-bound "ensure setter" operation when a property that
    /// was reflected without a setter is asked to produce one and none exists
    /// at the requested visibility.
    #[error("No accessible setter for `{type_name}.{property}` under the requested scope")]
    SetterUnavailable {
        /// The declaring type of the property
        type_name: &'static str,
        /// The property missing a setter
        property: String,
    },

    /// A column value cannot be assigned to its target property.
    ///
    /// Carries enough context to diagnose a schema/model mismatch: the column
    /// name, the entity type and the property. The enclosing row and stream are
    /// aborted, never silently skipped.
    #[error("Cannot assign column `{column}` to `{entity}.{property}`: {reason}")]
    Assignment {
        /// The result-set column whose value failed to assign
        column: String,
        /// The entity type being populated
        entity: &'static str,
        /// The target property on the entity
        property: String,
        /// Why the assignment failed
        reason: String,
    },

    /// Rewinding a forward-only stream was requested.
    ///
    /// Streams are single-pass by contract. A reset request always fails fast
    /// rather than silently restarting.
    #[error("Rewinding a forward-only stream is not supported")]
    ResetUnsupported,

    /// The requested value conversion is not possible.
    ///
    /// Raised by the conversion fallback when no coercion between the two cell
    /// kinds exists, even under the generic runtime-driven path.
    #[error("Cannot convert a `{from}` cell into `{to}`")]
    ConversionInvalid {
        /// The kind of the source value
        from: CellKind,
        /// The kind requested by the target
        to: CellKind,
    },

    /// Malformed XML text in a column value.
    ///
    /// String-to-XML conversions parse the column text; parse failures from the
    /// XML layer propagate unmodified through this variant.
    #[error("{0}")]
    Xml(#[from] quick_xml::Error),

    /// Failed to find a type in the registry.
    ///
    /// This error occurs when looking up a type by name that has never been
    /// described in the registry.
    #[error("Failed to find type in registry - {0}")]
    TypeNotFound(String),

    /// Generic error for miscellaneous failures.
    ///
    /// Used for errors that don't fit into other categories or for wrapping
    /// external failures with additional context.
    #[error("{0}")]
    Error(String),
}
