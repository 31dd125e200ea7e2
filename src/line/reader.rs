//! Line-oriented record sources.
//!
//! Readers turn a file of physical lines into a deferred
//! [`LazyStream`]; the producer re-opens the file on every traversal, so a
//! still-deferred stream can be drained more than once.

use crate::convert::{ColumnOrder, RecordConverter};
use crate::line::codec::LineCodec;
use crate::model::FieldModel;
use crate::stream::LazyStream;
use crate::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Reads records by applying a parse function to each line.
pub struct LineReader<T> {
    parse: Arc<dyn Fn(&str) -> Result<T> + Send + Sync>,
}

impl<T: Clone + 'static> LineReader<T> {
    /// Creates a reader from a per-line parse function.
    pub fn new(parse: impl Fn(&str) -> Result<T> + Send + Sync + 'static) -> Self {
        Self {
            parse: Arc::new(parse),
        }
    }

    /// Creates a reader that decodes each line through a codec.
    #[must_use]
    pub fn with_codec(codec: Arc<dyn LineCodec<T>>) -> Self {
        Self::new(move |line| codec.decode(line))
    }

    /// Builds a deferred stream over the file's lines.
    #[must_use]
    pub fn read_path(&self, path: impl Into<PathBuf>) -> LazyStream<T> {
        self.read_path_skipping(path, 0)
    }

    /// Builds a deferred stream over the file's lines, dropping the first
    /// `skip` lines on every traversal.
    #[must_use]
    pub fn read_path_skipping(&self, path: impl Into<PathBuf>, skip: usize) -> LazyStream<T> {
        let parse = Arc::clone(&self.parse);
        let path = path.into();
        LazyStream::new(move || -> Box<dyn Iterator<Item = Result<T>>> {
            let lines = match open_lines(&path, skip) {
                Ok(lines) => lines,
                Err(iter) => return iter,
            };
            let parse = Arc::clone(&parse);
            Box::new(lines.map(move |line| match line {
                Ok(line) => parse(&line),
                Err(e) => Err(Error::io("read_line", &e)),
            }))
        })
    }
}

/// Reads delimited records through a [`RecordConverter`].
pub struct CsvReader<T> {
    converter: RecordConverter<T>,
}

impl<T: Default + Clone + 'static> CsvReader<T> {
    /// Creates a reader over the model with the given separator.
    pub fn new(model: Arc<FieldModel<T>>, sep: impl Into<String>) -> Self {
        Self {
            converter: RecordConverter::new(model, sep),
        }
    }

    /// Creates a reader around an existing converter.
    #[must_use]
    pub const fn from_converter(converter: RecordConverter<T>) -> Self {
        Self { converter }
    }

    /// Starts a read session for the given file.
    #[must_use]
    pub fn session(&self, path: impl Into<PathBuf>) -> ReadSession<T> {
        ReadSession {
            converter: self.converter.clone(),
            path: path.into(),
            skip: 0,
            columns: None,
            use_header: false,
        }
    }

    /// Builds a deferred stream over the whole file with default options.
    #[must_use]
    pub fn read_path(&self, path: impl Into<PathBuf>) -> LazyStream<T> {
        self.session(path).stream()
    }
}

/// Options for one read of a delimited file.
///
/// Header resolution happens per traversal in a session-local converter, so
/// the reader itself stays reusable and order-free.
pub struct ReadSession<T> {
    converter: RecordConverter<T>,
    path: PathBuf,
    skip: usize,
    columns: Option<ColumnOrder>,
    use_header: bool,
}

impl<T: Default + Clone + 'static> ReadSession<T> {
    /// Drops the first `lines` lines on every traversal.
    #[must_use]
    pub const fn skip(mut self, lines: usize) -> Self {
        self.skip = lines;
        self
    }

    /// Installs an explicit column order for this session.
    #[must_use]
    pub fn columns(mut self, order: ColumnOrder) -> Self {
        self.columns = Some(order);
        self
    }

    /// Consumes the first post-skip line as a header and reorders columns by
    /// locating every binding name in it.
    ///
    /// A binding name absent from the header aborts the read with a lookup
    /// fault before any record is converted.
    #[must_use]
    pub const fn with_header(mut self) -> Self {
        self.use_header = true;
        self
    }

    /// Builds the deferred stream; the file is opened per traversal.
    #[must_use]
    pub fn stream(self) -> LazyStream<T> {
        let Self {
            converter,
            path,
            skip,
            columns,
            use_header,
        } = self;
        LazyStream::new(move || -> Box<dyn Iterator<Item = Result<T>>> {
            let mut lines = match open_lines(&path, skip) {
                Ok(lines) => lines,
                Err(iter) => return iter,
            };
            let mut converter = converter.clone();
            if let Some(order) = &columns {
                converter.reorder(order.clone());
            }
            if use_header {
                match lines.next() {
                    None => return Box::new(std::iter::empty()),
                    Some(Err(e)) => return Box::new(std::iter::once(Err(Error::io("read_header", &e)))),
                    Some(Ok(header)) => {
                        if let Err(e) = converter.reorder_by_header(&header) {
                            return Box::new(std::iter::once(Err(e)));
                        }
                        tracing::debug!(header = %header, "columns reordered from header line");
                    }
                }
            }
            Box::new(lines.map(move |line| match line {
                Ok(line) => converter.parse_line(&line),
                Err(e) => Err(Error::io("read_line", &e)),
            }))
        })
    }
}

type Lines = std::iter::Skip<std::io::Lines<BufReader<File>>>;

fn open_lines<T: 'static>(
    path: &Path,
    skip: usize,
) -> std::result::Result<Lines, Box<dyn Iterator<Item = Result<T>>>> {
    match File::open(path) {
        Ok(file) => Ok(BufReader::new(file).lines().skip(skip)),
        Err(e) => Err(Box::new(std::iter::once(Err(Error::io("open_input", &e))))),
    }
}
