use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{DecodeError, DecodeResult};
use crate::traits::Decoder;

/// Record header size: 8 bytes payload size + 8 bytes timestamp.
const HEADER_SIZE: usize = 16;

/// Bytes of the payload size that belong to the timestamp.
const TIMESTAMP_SIZE: i64 = 8;

/// One entry of a binary timeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineRecord {
    pub timestamp: i64,
    pub value: String,
}

/// In-process reader for the binary timeline encoding.
///
/// On-wire format, repeated until the buffer is exhausted:
/// ```text
/// [8 bytes: payload size (big-endian i64), covers timestamp + value]
/// [8 bytes: timestamp (big-endian i64)]
/// [payload size - 8 bytes: value]
/// ```
/// A truncated header ends the stream; a value shorter than declared takes
/// whatever bytes remain.
#[derive(Clone, Copy, Debug, Default)]
pub struct NativeDecoder;

impl NativeDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Read every complete record from `data`.
    pub fn read_records(data: &[u8]) -> Vec<TimelineRecord> {
        let mut records = Vec::new();
        let mut offset = 0usize;

        while offset < data.len() {
            let (Some(size), Some(timestamp)) = (read_i64(data, offset), read_i64(data, offset + 8)) else {
                warn!(
                    offset,
                    remaining = data.len() - offset,
                    "truncated record header; stopping"
                );
                break;
            };

            let value_len = size - TIMESTAMP_SIZE;
            if value_len < 0 {
                warn!(offset, size, "record size smaller than its timestamp; stopping");
                break;
            }

            let start = offset + HEADER_SIZE;
            let available = data.len() - start;
            let take = usize::try_from(value_len).map_or(available, |len| len.min(available));
            if (take as u64) < value_len as u64 {
                debug!(offset, declared = value_len, available, "short record value");
            }

            records.push(TimelineRecord {
                timestamp,
                value: String::from_utf8_lossy(&data[start..start + take]).into_owned(),
            });
            offset = start + take;
        }

        debug!(records = records.len(), bytes = data.len(), "native decode complete");
        records
    }
}

impl Decoder for NativeDecoder {
    fn decode(&self, payload: &[u8]) -> DecodeResult<Value> {
        let records = Self::read_records(payload);
        serde_json::to_value(records).map_err(|e| DecodeError::ResultMalformed {
            reason: e.to_string(),
            excerpt: String::new(),
        })
    }

    fn name(&self) -> &'static str {
        "native"
    }
}

fn read_i64(data: &[u8], at: usize) -> Option<i64> {
    let bytes: [u8; 8] = data.get(at..at.checked_add(8)?)?.try_into().ok()?;
    Some(i64::from_be_bytes(bytes))
}
