//! `tokio_util` codec over the record framing.

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{encode_frame, parse_frame, Parsed, Record, DEFAULT_READ_CHUNK, HEADER_SIZE};
use crate::error::FrameError;

/// Streams records through `FramedRead` / `FramedWrite`.
///
/// Tracks the stream offset of each decoded record. A stream that ends
/// inside a frame yields [`FrameError::Truncated`].
#[derive(Debug, Clone, Default)]
pub struct RecordCodec {
    max_payload_size: Option<u64>,
    offset: u64,
}

impl RecordCodec {
    /// Codec with no payload limit, starting at stream offset zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse records whose payload exceeds `max` bytes.
    pub fn with_max_payload_size(max: u64) -> Self {
        Self {
            max_payload_size: Some(max),
            offset: 0,
        }
    }

    /// Stream offset of the next record to decode.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl Decoder for RecordCodec {
    type Item = Record;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Record>, FrameError> {
        let parsed = parse_frame(&src[..]);
        if let (Some(len), Some(max)) = (parsed.payload_len(), self.max_payload_size) {
            if len > max {
                return Err(FrameError::PayloadTooLarge { size: len, max });
            }
        }

        let (payload_len, frame_len) = match parsed {
            Parsed::Complete { payload, frame_len } => (payload.len(), frame_len),
            Parsed::Incomplete { needed, .. } => {
                // The header length is unverified against the real stream
                // size, so only reserve up to one chunk ahead.
                let missing = needed.saturating_sub(src.len() as u64);
                src.reserve(missing.min(DEFAULT_READ_CHUNK as u64) as usize);
                return Ok(None);
            }
            Parsed::Corrupt(field) => {
                return Err(FrameError::Corrupt {
                    field,
                    offset: self.offset,
                })
            }
        };

        let mut frame = src.split_to(frame_len);
        frame.advance(HEADER_SIZE);
        frame.truncate(payload_len);

        let record = Record::new(self.offset, frame.freeze());
        self.offset = record.end_offset();
        Ok(Some(record))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Record>, FrameError> {
        match self.decode(buf)? {
            Some(record) => Ok(Some(record)),
            None if buf.is_empty() => Ok(None),
            None => {
                let needed = match parse_frame(&buf[..]) {
                    Parsed::Incomplete { needed, .. } => needed,
                    _ => buf.len() as u64,
                };
                Err(FrameError::Truncated {
                    offset: self.offset,
                    available: buf.len() as u64,
                    needed,
                })
            }
        }
    }
}

impl Encoder<Bytes> for RecordCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), FrameError> {
        encode_frame(&item, dst);
        Ok(())
    }
}

impl<'a> Encoder<&'a [u8]> for RecordCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &'a [u8], dst: &mut BytesMut) -> Result<(), FrameError> {
        encode_frame(item, dst);
        Ok(())
    }
}
