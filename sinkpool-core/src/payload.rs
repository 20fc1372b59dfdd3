//! Record payloads sent by the scenarios.
//!
//! Every record is a JSON object with a single fixed key whose value is the
//! stringified index of the record inside its batch. The connector under test
//! ingests the object as one row, so counting rows counts records.
//!
//! ```rust
//! use sinkpool_core::{encode_batch, PAYLOAD_FIELD};
//!
//! let batch = encode_batch(2).unwrap();
//! let first = String::from_utf8(batch[0].clone()).unwrap();
//! assert_eq!(first, format!("{{\"{}\":\"0\"}}", PAYLOAD_FIELD));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The single key of every record payload.
pub const PAYLOAD_FIELD: &str =
    "numbernumbernumbernumbernumbernumbernumbernumbernumbernumbernumbernumber";

/// Error type for payload encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Failed to encode a record to bytes.
    #[error("encode error: {0}")]
    Encode(String),
}

/// One record of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPayload {
    /// Stringified index of the record inside its batch.
    #[serde(rename = "numbernumbernumbernumbernumbernumbernumbernumbernumbernumbernumbernumber")]
    pub number: String,
}

impl RecordPayload {
    /// Payload for the record at `index`.
    pub fn new(index: u64) -> Self {
        Self {
            number: index.to_string(),
        }
    }

    /// Encode as UTF-8 JSON bytes.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(self).map_err(|e| CodecError::Encode(e.to_string()))
    }
}

/// Encode `count` records with indices `0..count`.
pub fn encode_batch(count: u64) -> Result<Vec<Vec<u8>>, CodecError> {
    (0..count).map(|i| RecordPayload::new(i).encode()).collect()
}
