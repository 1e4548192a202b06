//! Record framing for the execution stream.
//!
//! The backend writes `data: <payload>` records separated by a blank line.
//! Chunks arrive at arbitrary byte boundaries, including inside a multi-byte
//! character, so splitting happens on raw bytes and text is only decoded once
//! a record is complete.

use bytes::BytesMut;

use crate::wire::WireEvent;

const SEPARATOR: &[u8] = b"\n\n";
const DATA_PREFIX: &str = "data: ";
const DONE: &str = "[DONE]";

/// Buffers chunks and yields complete records.
///
/// Carriage returns are dropped on input, so `\r\n\r\n` separates records
/// the same way `\n\n` does.
#[derive(Debug, Default)]
pub struct RecordDecoder {
  buffer: BytesMut,
  /// Bytes of `buffer` already searched for a separator.
  scanned: usize,
}

impl RecordDecoder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Feed one chunk and return every record it completed, in order.
  pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
    self
      .buffer
      .extend(chunk.iter().copied().filter(|b| *b != b'\r'));

    let mut records = Vec::new();
    while let Some(pos) = self.find_separator() {
      let record = self.buffer.split_to(pos + SEPARATOR.len());
      self.scanned = 0;
      records.push(String::from_utf8_lossy(&record[..pos]).into_owned());
    }
    records
  }

  /// Search only the bytes added since the last miss. The window starts one
  /// byte early so a separator split across chunks is still found.
  fn find_separator(&mut self) -> Option<usize> {
    let from = self.scanned.saturating_sub(SEPARATOR.len() - 1);
    let found = self.buffer[from..]
      .windows(SEPARATOR.len())
      .position(|w| w == SEPARATOR)
      .map(|pos| from + pos);
    if found.is_none() {
      self.scanned = self.buffer.len();
    }
    found
  }

  /// Whatever is left once the stream has closed, if it is not blank.
  pub fn finish(&mut self) -> Option<String> {
    let rest = self.buffer.split();
    self.scanned = 0;
    let text = String::from_utf8_lossy(&rest);
    if text.trim().is_empty() {
      None
    } else {
      Some(text.into_owned())
    }
  }
}

/// A decoded data record.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamRecord {
  Event(WireEvent),
  /// The `[DONE]` sentinel.
  Done,
}

/// Classify one raw record.
///
/// `Ok(None)` means the record is not a data record and should be ignored.
/// `Err` means it was a data record whose payload is not a known event.
pub fn parse_record(raw: &str) -> Result<Option<StreamRecord>, serde_json::Error> {
  let Some(payload) = raw.trim().strip_prefix(DATA_PREFIX) else {
    return Ok(None);
  };
  let payload = payload.trim();
  if payload == DONE {
    return Ok(Some(StreamRecord::Done));
  }
  serde_json::from_str(payload).map(|event| Some(StreamRecord::Event(event)))
}
