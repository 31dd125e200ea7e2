//! Thin line-oriented file collaborators.
//!
//! The binding engine itself never touches the filesystem; these readers and
//! writers adapt files of physical lines to the interfaces the core expects:
//! an ordered value source per line going in, a formatted line sink going
//! out.

mod codec;
mod reader;
mod writer;

pub use codec::{JsonLineCodec, LineCodec};
pub use reader::{CsvReader, LineReader, ReadSession};
pub use writer::{CsvWriteSession, CsvWriter, LineWriter, WriteSession};
