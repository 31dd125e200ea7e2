//! Opaque line-oriented codecs.

use crate::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Encodes and decodes one record per line, opaquely to the binding engine.
///
/// Used by the codec-backed cache and reader/writer for structured encodings
/// the positional engine does not model.
pub trait LineCodec<T>: Send + Sync {
    /// Encodes one record as a single line (no trailing terminator).
    fn encode(&self, record: &T) -> Result<String>;

    /// Decodes one line into a record.
    fn decode(&self, line: &str) -> Result<T>;
}

/// Newline-delimited JSON codec: one JSON object per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonLineCodec;

impl<T> LineCodec<T> for JsonLineCodec
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, record: &T) -> Result<String> {
        serde_json::to_string(record).map_err(|e| Error::Codec {
            operation: "encode",
            cause: e.to_string(),
        })
    }

    fn decode(&self, line: &str) -> Result<T> {
        serde_json::from_str(line).map_err(|e| Error::Codec {
            operation: "decode",
            cause: e.to_string(),
        })
    }
}
