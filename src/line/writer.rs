//! Line-oriented record sinks.

use crate::convert::RecordFormatter;
use crate::line::codec::LineCodec;
use crate::model::FieldModel;
use crate::{Error, Result};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

type FormatLineFn<T> = dyn Fn(&T) -> Result<String> + Send + Sync;

/// Writes records by applying a format function per line.
pub struct LineWriter<T> {
    format: Arc<FormatLineFn<T>>,
}

impl<T> LineWriter<T> {
    /// Creates a writer from a per-record format function.
    pub fn new(format: impl Fn(&T) -> Result<String> + Send + Sync + 'static) -> Self {
        Self {
            format: Arc::new(format),
        }
    }

    /// Creates a writer that encodes each record through a codec.
    #[must_use]
    pub fn with_codec(codec: Arc<dyn LineCodec<T>>) -> Self
    where
        T: 'static,
    {
        Self::new(move |record| codec.encode(record))
    }

    /// Starts a write session for the given file.
    #[must_use]
    pub fn session(&self, path: impl Into<PathBuf>) -> WriteSession<T> {
        WriteSession::start(Arc::clone(&self.format), path.into())
    }
}

/// Writes delimited records through a [`RecordFormatter`].
pub struct CsvWriter<T> {
    formatter: RecordFormatter<T>,
}

impl<T: 'static> CsvWriter<T> {
    /// Creates a writer over the model with the given separator.
    pub fn new(model: Arc<FieldModel<T>>, sep: impl Into<String>) -> Self {
        Self {
            formatter: RecordFormatter::new(model, sep),
        }
    }

    /// Creates a writer around an existing formatter.
    #[must_use]
    pub const fn from_formatter(formatter: RecordFormatter<T>) -> Self {
        Self { formatter }
    }

    /// Starts a write session for the given file.
    #[must_use]
    pub fn session(&self, path: impl Into<PathBuf>) -> CsvWriteSession<T> {
        let formatter = self.formatter.clone();
        let header = self.formatter.header();
        CsvWriteSession {
            inner: WriteSession::start(
                Arc::new(move |record: &T| Ok(formatter.format(record))),
                path.into(),
            ),
            field_header: header,
        }
    }
}

/// Options for one write of a line-oriented file.
///
/// Headers and the UTF-8 marker apply only to fresh (non-append) files.
pub struct WriteSession<T> {
    format: Arc<FormatLineFn<T>>,
    path: PathBuf,
    headers: Vec<String>,
    append: bool,
    utf8_marker: bool,
}

impl<T> WriteSession<T> {
    fn start(format: Arc<FormatLineFn<T>>, path: PathBuf) -> Self {
        Self {
            format,
            path,
            headers: Vec::new(),
            append: false,
            utf8_marker: false,
        }
    }

    /// Appends to the file instead of truncating it.
    #[must_use]
    pub fn append(mut self) -> Self {
        self.append = true;
        self
    }

    /// Prefixes a fresh file with the UTF-8 marker sequence.
    #[must_use]
    pub fn utf8_marker(mut self) -> Self {
        self.utf8_marker = true;
        self
    }

    /// Adds a header line written once at the start of a fresh file.
    #[must_use]
    pub fn header(mut self, line: impl Into<String>) -> Self {
        self.headers.push(line.into());
        self
    }

    /// Writes all records, one line per record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`](crate::Error::OperationFailed) on
    /// I/O failure, or the format function's fault for an unencodable record.
    pub fn write(&self, records: &[T]) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(self.append)
            .write(true)
            .truncate(!self.append)
            .open(&self.path)
            .map_err(|e| Error::io("open_output", &e))?;
        let mut sink = BufWriter::new(file);
        if !self.append {
            if self.utf8_marker {
                sink.write_all("\u{feff}".as_bytes())
                    .map_err(|e| Error::io("write_marker", &e))?;
            }
            for header in &self.headers {
                writeln!(sink, "{header}").map_err(|e| Error::io("write_header", &e))?;
            }
        }
        for record in records {
            let line = (self.format)(record)?;
            writeln!(sink, "{line}").map_err(|e| Error::io("write_record", &e))?;
        }
        sink.flush().map_err(|e| Error::io("flush_output", &e))?;
        tracing::debug!(records = records.len(), path = %self.path.display(), "wrote records");
        Ok(())
    }

    /// Writes on a background thread, returning a handle whose join observes
    /// completion or failure.
    #[must_use = "dropping the handle makes the write unobservable"]
    pub fn write_async(self, records: Vec<T>) -> JoinHandle<Result<()>>
    where
        T: Send + 'static,
    {
        std::thread::spawn(move || self.write(&records))
    }
}

/// A [`WriteSession`] with delimited-format conveniences.
pub struct CsvWriteSession<T> {
    inner: WriteSession<T>,
    field_header: String,
}

impl<T> CsvWriteSession<T> {
    /// Appends to the file instead of truncating it.
    #[must_use]
    pub fn append(mut self) -> Self {
        self.inner = self.inner.append();
        self
    }

    /// Prefixes a fresh file with the UTF-8 marker sequence.
    #[must_use]
    pub fn utf8_marker(mut self) -> Self {
        self.inner = self.inner.utf8_marker();
        self
    }

    /// Adds an arbitrary header line.
    #[must_use]
    pub fn header(mut self, line: impl Into<String>) -> Self {
        self.inner = self.inner.header(line);
        self
    }

    /// Adds a header line naming each bound field, in binding order.
    #[must_use]
    pub fn with_field_header(mut self) -> Self {
        let line = self.field_header.clone();
        self.inner = self.inner.header(line);
        self
    }

    /// Writes all records, one line per record.
    ///
    /// # Errors
    ///
    /// See [`WriteSession::write`].
    pub fn write(&self, records: &[T]) -> Result<()> {
        self.inner.write(records)
    }

    /// Writes on a background thread, returning a handle whose join observes
    /// completion or failure.
    #[must_use = "dropping the handle makes the write unobservable"]
    pub fn write_async(self, records: Vec<T>) -> JoinHandle<Result<()>>
    where
        T: Send + 'static,
    {
        self.inner.write_async(records)
    }
}
