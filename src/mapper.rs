//! The record-mapper façade.

use crate::cache::{CodecCache, CsvCache};
use crate::convert::{RecordConverter, RecordFormatter};
use crate::line::{CsvReader, CsvWriter};
use crate::model::{Bindable, BindingRegistry, FieldModel, SelectionPolicy};
use crate::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// Default field separator: a caron-like spacing modifier letter highly
/// unlikely to collide with record data. Comma is the common public choice
/// for files meant to be read elsewhere.
pub const DEFAULT_SEPARATOR: &str = "\u{02CC}";

/// Bundles a resolved [`FieldModel`] with a separator and derives every
/// line-level collaborator from the pair.
///
/// The mapper is cheap to clone and to re-separate: the model is shared, so
/// converter and formatter stay column-order-consistent across all derived
/// readers, writers, and caches.
pub struct RecordMapper<T> {
    model: Arc<FieldModel<T>>,
    sep: String,
    converter: RecordConverter<T>,
    formatter: RecordFormatter<T>,
}

impl<T: Bindable + Clone> RecordMapper<T> {
    /// Resolves the model for `T` and bundles it with the default separator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`](crate::Error::Configuration) if any
    /// field kind has no resolvable parser.
    pub fn new(registry: &BindingRegistry) -> Result<Self> {
        Ok(Self::from_model(Arc::new(FieldModel::<T>::of(registry)?)))
    }

    /// Resolves the model with a selection policy applied.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`](crate::Error::Configuration) if any
    /// surviving field kind has no resolvable parser.
    pub fn with_policy(registry: &BindingRegistry, policy: &SelectionPolicy) -> Result<Self> {
        Ok(Self::from_model(Arc::new(FieldModel::<T>::with_policy(
            registry, policy,
        )?)))
    }
}

impl<T: Default + Clone + 'static> RecordMapper<T> {
    /// Bundles an already resolved model with the default separator.
    #[must_use]
    pub fn from_model(model: Arc<FieldModel<T>>) -> Self {
        Self::from_model_with_sep(model, DEFAULT_SEPARATOR)
    }

    /// Bundles an already resolved model with the given separator.
    #[must_use]
    pub fn from_model_with_sep(model: Arc<FieldModel<T>>, sep: impl Into<String>) -> Self {
        let sep = sep.into();
        Self {
            converter: RecordConverter::new(Arc::clone(&model), sep.clone()),
            formatter: RecordFormatter::new(Arc::clone(&model), sep.clone()),
            model,
            sep,
        }
    }

    /// Returns a sibling mapper over the same model with another separator.
    #[must_use]
    pub fn with_sep(&self, sep: impl Into<String>) -> Self {
        let sep = sep.into();
        if sep == self.sep {
            return self.clone();
        }
        Self::from_model_with_sep(Arc::clone(&self.model), sep)
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

    /// Derives a fresh converter.
    #[must_use]
    pub fn converter(&self) -> RecordConverter<T> {
        self.converter.clone()
    }

    /// Derives a fresh formatter.
    #[must_use]
    pub fn formatter(&self) -> RecordFormatter<T> {
        self.formatter.clone()
    }

    /// Derives a delimited-file reader.
    #[must_use]
    pub fn reader(&self) -> CsvReader<T> {
        CsvReader::from_converter(self.converter.clone())
    }

    /// Derives a delimited-file writer.
    #[must_use]
    pub fn writer(&self) -> CsvWriter<T> {
        CsvWriter::from_formatter(self.formatter.clone())
    }

    /// Derives a delimited-text cache at `path`.
    #[must_use]
    pub fn csv_cache(&self, path: impl Into<PathBuf>) -> CsvCache<T> {
        CsvCache::new(path, Arc::clone(&self.model), self.sep.clone())
    }

    /// Derives a JSON-lines cache at `path`.
    #[must_use]
    pub fn json_cache(&self, path: impl Into<PathBuf>) -> CodecCache<T>
    where
        T: serde::Serialize + serde::de::DeserializeOwned,
    {
        CodecCache::json(path)
    }

    /// Parses one line into a record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Data`](crate::Error::Data) for the first malformed
    /// value in the line.
    pub fn parse(&self, line: &str) -> Result<T> {
        self.converter.parse_line(line)
    }

    /// Formats one record as a line.
    #[must_use]
    pub fn format(&self, record: &T) -> String {
        self.formatter.format(record)
    }
}

impl<T> Clone for RecordMapper<T> {
    fn clone(&self) -> Self {
        Self {
            model: Arc::clone(&self.model),
            sep: self.sep.clone(),
            converter: self.converter.clone(),
            formatter: self.formatter.clone(),
        }
    }
}
