//! Positional conversion between raw value sequences and typed records.
//!
//! A converter/formatter pair derived from one shared
//! [`FieldModel`](crate::FieldModel) treats position `i` as the same field in
//! both directions. [`ColumnOrder`] overrides the source position of each
//! binding when the input's column layout differs from declaration order.

mod columns;
mod converter;
mod formatter;

pub use columns::ColumnOrder;
pub use converter::{RecordConverter, RowConverter};
pub use formatter::RecordFormatter;
