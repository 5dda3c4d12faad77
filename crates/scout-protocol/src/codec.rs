//! Tokio codec for newline-delimited response records

use bytes::{Buf, BytesMut};
use tokio_util::codec::Decoder;

use crate::error::ProtocolError;
use crate::event::StreamEvent;
use crate::message::StreamRecord;

/// Maximum size of a single record (1 MiB)
pub const MAX_RECORD_SIZE: usize = 1024 * 1024;

/// One line of a streaming response after parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    /// A well-formed record
    Event(StreamEvent),
    /// The server reported an error in place of further output
    ServerError(String),
    /// The line could not be parsed; carries the parser message
    Malformed(String),
}

/// Codec that splits a byte stream into lines and parses each as a record
///
/// Blank lines are skipped. A trailing line without a newline is decoded
/// at end of stream.
#[derive(Debug)]
pub struct RecordCodec {
    /// Index up to which `src` has already been scanned for a newline
    next_index: usize,
    /// Maximum record size
    max_length: usize,
}

impl RecordCodec {
    /// Create a new codec
    pub fn new() -> Self {
        Self::with_max_length(MAX_RECORD_SIZE)
    }

    /// Create a codec with a custom record size limit
    pub fn with_max_length(max_length: usize) -> Self {
        Self {
            next_index: 0,
            max_length,
        }
    }
}

impl Default for RecordCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for RecordCodec {
    type Item = Record;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let newline = src[self.next_index..]
                .iter()
                .position(|b| *b == b'\n')
                .map(|pos| self.next_index + pos);

            let Some(newline) = newline else {
                if src.len() > self.max_length {
                    return Err(ProtocolError::RecordTooLarge {
                        size: src.len(),
                        max: self.max_length,
                    });
                }
                // Need more data
                self.next_index = src.len();
                return Ok(None);
            };

            self.next_index = 0;
            if newline > self.max_length {
                return Err(ProtocolError::RecordTooLarge {
                    size: newline,
                    max: self.max_length,
                });
            }

            let line = src.split_to(newline + 1);
            if let Some(record) = parse_line(&line[..newline]) {
                return Ok(Some(record));
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(record) = self.decode(src)? {
            return Ok(Some(record));
        }

        self.next_index = 0;
        let rest = src.split_to(src.len());
        Ok(parse_line(&rest))
    }
}

/// Parse one line; `None` for blank lines
fn parse_line(line: &[u8]) -> Option<Record> {
    let line = trim_ascii(line);
    if line.is_empty() {
        return None;
    }

    let record = match serde_json::from_slice::<StreamRecord>(line) {
        Ok(record) => record,
        Err(e) => return Some(Record::Malformed(e.to_string())),
    };

    if let Some(error) = record.error {
        return Some(Record::ServerError(error));
    }

    let text_fragment = record
        .response
        .or_else(|| record.message.and_then(|m| m.content));

    Some(Record::Event(StreamEvent {
        text_fragment,
        done: record.done,
    }))
}

fn trim_ascii(mut bytes: &[u8]) -> &[u8] {
    while bytes.first().is_some_and(u8::is_ascii_whitespace) {
        bytes.advance(1);
    }
    while bytes.last().is_some_and(u8::is_ascii_whitespace) {
        bytes = &bytes[..bytes.len() - 1];
    }
    bytes
}
