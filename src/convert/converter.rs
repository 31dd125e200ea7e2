//! Positional values → typed records.

use crate::convert::columns::ColumnOrder;
use crate::model::FieldModel;
use crate::row::ValueRow;
use crate::Result;
use std::sync::Arc;

/// Converts ordered raw string values into typed records, using a shared
/// [`FieldModel`].
///
/// The fill mapping is identity by default: raw value `i` feeds binding `i`.
/// Installing a [`ColumnOrder`] (explicitly or from a header line) swaps the
/// mapping for the converter's lifetime. Values beyond the available
/// bindings, or bindings beyond the available values, are simply left at
/// their defaults.
pub struct RecordConverter<T> {
    model: Arc<FieldModel<T>>,
    sep: String,
    order: Option<ColumnOrder>,
}

impl<T: Default + 'static> RecordConverter<T> {
    /// Creates a converter over the model with the given separator.
    pub fn new(model: Arc<FieldModel<T>>, sep: impl Into<String>) -> Self {
        Self {
            model,
            sep: sep.into(),
            order: None,
        }
    }

    /// Returns the shared field model.
    #[must_use]
    pub const fn model(&self) -> &Arc<FieldModel<T>> {
        &self.model
    }

    /// Returns the configured separator.
    #[must_use]
    pub fn sep(&self) -> &str {
        &self.sep
    }

    /// Replaces the active fill mapping.
    pub fn reorder(&mut self, order: ColumnOrder) {
        tracing::trace!(owner = self.model.owner(), slots = ?order.slots(), "column order installed");
        self.order = Some(order);
    }

    /// Resolves the model's binding names against a header line and installs
    /// the resulting fill mapping.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Lookup`](crate::Error::Lookup) carrying the first
    /// binding name absent from the header.
    pub fn reorder_by_header(&mut self, header: &str) -> Result<()> {
        let names = self.model.names();
        let order = ColumnOrder::from_header(header, &self.sep, &names)?;
        self.reorder(order);
        Ok(())
    }

    /// Converts one ordered value sequence into a fresh record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Data`](crate::Error::Data) for the first malformed
    /// value; the record is abandoned.
    pub fn convert(&self, values: &[&str]) -> Result<T> {
        let mut record = T::default();
        let bindings = self.model.bindings();
        match &self.order {
            None => {
                let max = bindings.len().min(values.len());
                for i in 0..max {
                    bindings[i].fill(&mut record, values[i])?;
                }
            }
            Some(order) => {
                let slots = order.slots();
                let max = bindings.len().min(slots.len()).min(values.len());
                for i in 0..max {
                    // A slot past the end of a short row leaves the field at
                    // its default.
                    if let Some(raw) = values.get(slots[i]) {
                        bindings[i].fill(&mut record, raw)?;
                    }
                }
            }
        }
        Ok(record)
    }

    /// Splits one line by the configured separator and converts it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Data`](crate::Error::Data) for the first malformed
    /// value in the line.
    pub fn parse_line(&self, line: &str) -> Result<T> {
        let values: Vec<&str> = line.split(self.sep.as_str()).collect();
        self.convert(&values)
    }
}

impl<T> Clone for RecordConverter<T> {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            sep: self.sep.clone(),
            order: self.order.clone(),
        }
    }
}

/// Converts typed-cell rows into records, the spreadsheet-facing variant of
/// [`RecordConverter`].
///
/// Typed extraction is attempted first, by declared field kind; cells the
/// extractor declines fall back to their formatted text run through the same
/// premap/parse pipeline. A missing cell assigns the absent value.
pub struct RowConverter<T> {
    model: Arc<FieldModel<T>>,
    order: Option<ColumnOrder>,
}

impl<T: Default + 'static> RowConverter<T> {
    /// Creates a row converter over the model.
    #[must_use]
    pub const fn new(model: Arc<FieldModel<T>>) -> Self {
        Self { model, order: None }
    }

    /// Replaces the active fill mapping.
    pub fn reorder(&mut self, order: ColumnOrder) {
        self.order = Some(order);
    }

    /// Converts one row into a fresh record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Data`](crate::Error::Data) for the first cell whose
    /// fallback text fails to parse.
    pub fn convert_row(&self, row: &dyn ValueRow) -> Result<T> {
        let mut record = T::default();
        let bindings = self.model.bindings();
        let limit = match &self.order {
            None => bindings.len().min(row.len()),
            Some(order) => bindings.len().min(order.len()).min(row.len()),
        };
        for i in 0..limit {
            let source = self
                .order
                .as_ref()
                .map_or(i, |order| order.slots()[i]);
            match row.cell(source) {
                Some(cell) => bindings[i].fill_cell(&mut record, &cell)?,
                None => bindings[i].fill_absent(&mut record)?,
            }
        }
        Ok(record)
    }
}

impl<T> Clone for RowConverter<T> {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            order: self.order.clone(),
        }
    }
}
