//! Whole-batch encoding for byte-oriented destinations.
//!
//! A batch is encoded into one buffer before any byte is written, so a
//! write either hands over every encoded record or none of them.

use crate::error::DeliveryFailure;
use stream_schema::GeneratedRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Layout {
    /// One compact JSON document per line
    Lines,
    /// Pretty-printed documents separated by newlines
    Pretty,
}

pub(crate) struct EncodedBatch {
    pub bytes: Vec<u8>,
    /// Leading records fully present in `bytes`
    pub encoded: usize,
    error: Option<serde_json::Error>,
}

impl EncodedBatch {
    /// Outcome once `bytes` has been written successfully.
    pub fn into_result(self) -> Result<(), DeliveryFailure> {
        match self.error {
            Some(e) => Err(DeliveryFailure::new(self.encoded, e)),
            None => Ok(()),
        }
    }
}

/// Encode records until the first one that fails to serialize.
pub(crate) fn encode_batch(batch: &[GeneratedRecord], layout: Layout) -> EncodedBatch {
    let mut bytes = Vec::with_capacity(batch.len() * 128);
    for (i, record) in batch.iter().enumerate() {
        let start = bytes.len();
        let result = match layout {
            Layout::Lines => serde_json::to_writer(&mut bytes, record),
            Layout::Pretty => serde_json::to_writer_pretty(&mut bytes, record),
        };
        if let Err(e) = result {
            bytes.truncate(start);
            return EncodedBatch {
                bytes,
                encoded: i,
                error: Some(e),
            };
        }
        bytes.push(b'\n');
    }
    EncodedBatch {
        bytes,
        encoded: batch.len(),
        error: None,
    }
}
