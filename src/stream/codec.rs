//! SSE frame codec.
//!
//! Encode side: each frame becomes one self-delimited `data: <json>` record,
//! records separated by a blank line. Decode side: an accumulation buffer
//! yields complete records regardless of how the transport chunked the bytes;
//! a malformed record is skipped with an explicit outcome instead of aborting
//! the stream.

use crate::error::Result;
use crate::stream::frame::StreamFrame;

/// Marker prefix for payload lines inside a record.
const DATA_PREFIX: &str = "data:";

/// Record separator: two consecutive line terminators.
const RECORD_SEPARATOR: &[u8] = b"\n\n";

/// Serialize one frame as a self-delimited event-stream record.
pub fn encode_frame(frame: &StreamFrame) -> Result<String> {
    Ok(format!("data: {}\n\n", serde_json::to_string(frame)?))
}

/// Accumulates raw transport bytes and yields complete records.
///
/// Records are located at the byte level and converted to text only once the
/// separator has arrived, so a chunk that ends mid-codepoint stays buffered
/// instead of being decoded in isolation.
#[derive(Debug, Default)]
pub struct RecordBuffer {
    buf: Vec<u8>,
}

impl RecordBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one transport chunk.
    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Extract the next complete record, without its separator.
    ///
    /// Returns `None` when no separator is buffered yet; the remainder stays
    /// buffered for the next [`push`](Self::push).
    pub fn next_record(&mut self) -> Option<String> {
        let pos = self
            .buf
            .windows(RECORD_SEPARATOR.len())
            .position(|w| w == RECORD_SEPARATOR)?;
        let record: Vec<u8> = self.buf.drain(..pos + RECORD_SEPARATOR.len()).collect();
        Some(String::from_utf8_lossy(&record[..pos]).into_owned())
    }

    /// Bytes buffered but not yet forming a complete record.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

/// Outcome of decoding one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    Frame(StreamFrame),
    /// A record that did not parse as a frame. The stream continues.
    Malformed { error: String, record: String },
}

/// Incremental decoder for the frame stream.
///
/// Feed chunks as they arrive; each call returns the frames those bytes
/// completed, in arrival order. Empty-payload records (keep-alive comments)
/// produce no outcome at all.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    records: RecordBuffer,
    skipped: usize,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one transport chunk.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Decoded> {
        self.records.push(chunk);
        let mut out = Vec::new();
        while let Some(record) = self.records.next_record() {
            match Self::decode_record(&record) {
                Ok(Some(frame)) => out.push(Decoded::Frame(frame)),
                Ok(None) => {}
                Err(error) => {
                    self.skipped += 1;
                    tracing::warn!("[codec] Skipping malformed record: {}", error);
                    out.push(Decoded::Malformed { error, record });
                }
            }
        }
        out
    }

    /// Number of malformed records skipped so far.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Parse one record. `Ok(None)` means the record carried no payload.
    fn decode_record(record: &str) -> std::result::Result<Option<StreamFrame>, String> {
        let payload: Vec<&str> = record
            .lines()
            .filter_map(|line| {
                line.strip_prefix(DATA_PREFIX)
                    .map(|rest| rest.strip_prefix(' ').unwrap_or(rest))
            })
            .collect();
        let payload = payload.join("\n");
        if payload.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&payload)
            .map(Some)
            .map_err(|e| e.to_string())
    }
}
