//! Path-keyed, read-through memoization of record sequences.
//!
//! A cache is consulted through
//! [`LazyStream::cache_by`](crate::LazyStream::cache_by): if the backing file
//! exists the upstream computation is bypassed entirely; otherwise the
//! computed list is written (only when non-empty) and handed back. Presence
//! of the file is the sole hit signal; content is never validated against
//! the current model or separator, and the core never deletes or rotates
//! cache files.

use crate::convert::{RecordConverter, RecordFormatter};
use crate::line::{CsvReader, CsvWriter, LineCodec, LineReader, LineWriter};
use crate::model::FieldModel;
use crate::stream::LazyStream;
use crate::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Read-through file memoization keyed by a filesystem path.
pub trait FileCache<T> {
    /// Returns whether the cache artifact exists.
    fn exists(&self) -> bool;

    /// Builds a stream reading the cached records back.
    ///
    /// # Errors
    ///
    /// Implementations may fail eagerly; read faults otherwise surface when
    /// the returned stream is drained.
    fn read(&self) -> Result<LazyStream<T>>;

    /// Persists the computed records.
    ///
    /// # Errors
    ///
    /// Returns a fault if the artifact cannot be written.
    fn write(&self, records: &[T]) -> Result<()>;
}

/// Delimited-text cache backend built from a converter/formatter pair.
///
/// The path gets a `.csv` suffix when it does not already carry one.
pub struct CsvCache<T> {
    path: PathBuf,
    converter: RecordConverter<T>,
    formatter: RecordFormatter<T>,
}

impl<T: Default + Clone + 'static> CsvCache<T> {
    /// Creates a cache at `path` over the model with the given separator.
    pub fn new(path: impl Into<PathBuf>, model: Arc<FieldModel<T>>, sep: impl Into<String>) -> Self {
        let sep = sep.into();
        Self {
            path: ensure_suffix(path.into(), "csv"),
            converter: RecordConverter::new(Arc::clone(&model), sep.clone()),
            formatter: RecordFormatter::new(model, sep),
        }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T: Default + Clone + 'static> FileCache<T> for CsvCache<T> {
    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn read(&self) -> Result<LazyStream<T>> {
        tracing::debug!(path = %self.path.display(), "reading csv cache");
        Ok(CsvReader::from_converter(self.converter.clone()).read_path(&self.path))
    }

    fn write(&self, records: &[T]) -> Result<()> {
        CsvWriter::from_formatter(self.formatter.clone())
            .session(&self.path)
            .write(records)
    }
}

/// Opaque line-codec cache backend for arbitrary structured encodings.
///
/// The path gets a `.txt` suffix when it does not already carry one.
pub struct CodecCache<T> {
    path: PathBuf,
    codec: Arc<dyn LineCodec<T>>,
}

impl<T: Clone + 'static> CodecCache<T> {
    /// Creates a cache at `path` encoding through the given codec.
    pub fn new(path: impl Into<PathBuf>, codec: Arc<dyn LineCodec<T>>) -> Self {
        Self {
            path: ensure_suffix(path.into(), "txt"),
            codec,
        }
    }

    /// Creates a JSON-lines cache at `path`.
    #[must_use]
    pub fn json(path: impl Into<PathBuf>) -> Self
    where
        T: serde::Serialize + serde::de::DeserializeOwned,
    {
        Self::new(path, Arc::new(crate::line::JsonLineCodec))
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T: Clone + 'static> FileCache<T> for CodecCache<T> {
    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn read(&self) -> Result<LazyStream<T>> {
        tracing::debug!(path = %self.path.display(), "reading codec cache");
        Ok(LineReader::with_codec(Arc::clone(&self.codec)).read_path(&self.path))
    }

    fn write(&self, records: &[T]) -> Result<()> {
        LineWriter::with_codec(Arc::clone(&self.codec))
            .session(&self.path)
            .write(records)
    }
}

fn ensure_suffix(path: PathBuf, suffix: &str) -> PathBuf {
    if path.extension().is_some_and(|ext| ext == suffix) {
        path
    } else {
        let mut name = path.into_os_string();
        name.push(".");
        name.push(suffix);
        PathBuf::from(name)
    }
}
