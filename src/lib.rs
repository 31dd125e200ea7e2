//! # Linebind
//!
//! Bind flat, positional record sources (delimited text lines, spreadsheet
//! rows, line-oriented JSON) to typed values and back, and run the resulting
//! sequences through composable, re-traversable lazy pipelines with
//! file-backed memoization.
//!
//! ## Architecture
//!
//! One statically declared field table drives both directions:
//!
//! - [`FieldModel`] resolves a type's declared [`FieldSpec`]s against a
//!   [`BindingRegistry`] into an ordered set of bindings, once, eagerly.
//! - [`RecordConverter`] fills a fresh value from positional raw strings (or
//!   typed cells via [`RowConverter`]); [`RecordFormatter`] mirrors it back to
//!   positional strings. Both share the same model, so position `i` always
//!   means the same field in both directions.
//! - [`LazyStream`] is a deferred, re-derivable pipeline over record
//!   sequences with an explicit materialize-once operation.
//! - [`FileCache`] implementations short-circuit recomputation when a cached
//!   artifact already exists on disk.
//!
//! ## Example
//!
//! ```rust,ignore
//! use linebind::{bindable, BindingRegistry, RecordMapper};
//!
//! #[derive(Debug, Default, Clone)]
//! struct Person {
//!     name: Option<String>,
//!     age: Option<i32>,
//! }
//! bindable!(Person { name: String, age: i32 });
//!
//! let registry = BindingRegistry::new();
//! let mapper = RecordMapper::<Person>::new(&registry)?.with_sep(",");
//! let person = mapper.parse("ada,36")?;
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

use thiserror::Error as ThisError;

// Module declarations
pub mod cache;
pub mod convert;
pub mod line;
pub mod mapper;
pub mod model;
pub mod row;
pub mod stream;

// Re-exports for convenience
pub use cache::{CodecCache, CsvCache, FileCache};
pub use convert::{ColumnOrder, RecordConverter, RecordFormatter, RowConverter};
pub use line::{CsvReader, CsvWriter, JsonLineCodec, LineCodec, LineReader, LineWriter};
pub use mapper::{DEFAULT_SEPARATOR, RecordMapper};
pub use model::{
    AttributeBinding, Bindable, BindingRegistry, EnumLiteral, FieldModel, FieldSpec,
    SelectionPolicy,
};
pub use row::{CellValue, ValueRow};
pub use stream::LazyStream;

/// Error type for linebind operations.
///
/// Uses `thiserror` for automatic `Display` and `Error` trait implementations.
///
/// # Error Variant Triggers
///
/// | Variant | Raised When |
/// |---------|-------------|
/// | `Configuration` | A field kind has no resolvable parser at model construction |
/// | `Lookup` | A required header name or column code cannot be located |
/// | `Data` | A raw value fails to parse during record conversion |
/// | `Codec` | A line codec fails to encode or decode a record |
/// | `OperationFailed` | Filesystem I/O fails while reading or writing records |
#[derive(Debug, ThisError)]
pub enum Error {
    /// A binding could not resolve a parser or formatter.
    ///
    /// Raised once, at model-construction time, never lazily at the first
    /// record. No partially usable binding engine is ever exposed.
    #[error("field '{field}' of {owner}: no {role} for kind '{kind}'; register one on the binding registry")]
    Configuration {
        /// The type that owns the unresolvable field.
        owner: &'static str,
        /// The field whose binding failed to resolve.
        field: &'static str,
        /// The declared value kind with no resolution.
        kind: &'static str,
        /// Which function was missing (`parser` or `formatter`).
        role: &'static str,
    },

    /// A required name was absent during lookup.
    ///
    /// Raised when a header line does not contain a required binding name, or
    /// a column letter code is malformed. Aborts the read before any record
    /// is converted.
    #[error("name '{name}' not found in {context}")]
    Lookup {
        /// The name that could not be located.
        name: String,
        /// Where the lookup was attempted (header line, column codes).
        context: String,
    },

    /// A raw value failed to parse during per-record conversion.
    ///
    /// Propagates synchronously to whatever terminal drained the stream;
    /// there is no skip-and-continue mode.
    #[error("field '{field}' could not parse '{value}': {cause}")]
    Data {
        /// The field being filled when parsing failed.
        field: &'static str,
        /// The offending raw value.
        value: String,
        /// The underlying parse failure.
        cause: String,
    },

    /// A line codec failed to encode or decode a record.
    #[error("codec {operation} failed: {cause}")]
    Codec {
        /// The codec operation that failed (`encode` or `decode`).
        operation: &'static str,
        /// The underlying cause.
        cause: String,
    },

    /// A filesystem operation failed.
    #[error("operation '{operation}' failed: {cause}")]
    OperationFailed {
        /// The operation that failed.
        operation: &'static str,
        /// The underlying cause.
        cause: String,
    },
}

impl Error {
    /// Wraps an I/O error with the operation that triggered it.
    pub(crate) fn io(operation: &'static str, err: &std::io::Error) -> Self {
        Self::OperationFailed {
            operation,
            cause: err.to_string(),
        }
    }
}

/// Result type alias for linebind operations.
pub type Result<T> = std::result::Result<T, Error>;
