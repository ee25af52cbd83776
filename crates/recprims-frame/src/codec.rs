use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::checksum::masked_crc32c;
use crate::error::{ChecksumField, FrameError, Result};

/// Length prefix: u64 little-endian.
pub const LENGTH_SIZE: usize = 8;

/// One masked CRC-32C: u32 little-endian.
pub const CHECKSUM_SIZE: usize = 4;

/// Frame header: length (8) + length checksum (4) = 12 bytes.
pub const HEADER_SIZE: usize = LENGTH_SIZE + CHECKSUM_SIZE;

/// Frame footer: payload checksum (4).
pub const FOOTER_SIZE: usize = CHECKSUM_SIZE;

/// Bytes every frame adds around its payload.
pub const FRAME_OVERHEAD: usize = HEADER_SIZE + FOOTER_SIZE;

/// Default size of each read from a byte source: 8 KiB.
pub const DEFAULT_READ_CHUNK: usize = 8 * 1024;

/// A decoded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Stream offset of the first byte of this record's frame.
    pub offset: u64,
    /// The record payload.
    pub payload: Bytes,
}

impl Record {
    /// Create a new record.
    pub fn new(offset: u64, payload: impl Into<Bytes>) -> Self {
        Self {
            offset,
            payload: payload.into(),
        }
    }

    /// The total wire size of this record (framing + payload).
    pub fn wire_size(&self) -> u64 {
        frame_size(self.payload.len() as u64)
    }

    /// Stream offset just past this record.
    pub fn end_offset(&self) -> u64 {
        self.offset.saturating_add(self.wire_size())
    }
}

/// Wire size of a frame carrying `payload_len` bytes.
pub fn frame_size(payload_len: u64) -> u64 {
    payload_len.saturating_add(FRAME_OVERHEAD as u64)
}

/// Encode one record frame into `dst`.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────┬──────────────────┬──────────────┐
/// │ Length       │ Length CRC   │ Payload          │ Payload CRC  │
/// │ (8B LE u64)  │ (4B LE u32)  │ (Length bytes)   │ (4B LE u32)  │
/// └──────────────┴──────────────┴──────────────────┴──────────────┘
/// ```
///
/// Both CRCs are masked CRC-32C. Exactly `16 + payload.len()` bytes are
/// appended; any payload size is accepted, including zero.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) {
    let length = (payload.len() as u64).to_le_bytes();
    dst.reserve(FRAME_OVERHEAD + payload.len());
    dst.put_slice(&length);
    dst.put_u32_le(masked_crc32c(&length));
    dst.put_slice(payload);
    dst.put_u32_le(masked_crc32c(payload));
}

/// Result of one parse attempt over a byte window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed<'a> {
    /// A whole, verified frame sits at the start of the window.
    Complete {
        payload: &'a [u8],
        /// Bytes the frame occupies; the caller advances by this much.
        frame_len: usize,
    },
    /// More bytes are required before the frame can be judged.
    Incomplete {
        /// Total frame size known so far (the header size until the
        /// length has been read and verified).
        needed: u64,
        /// Payload length, once the length prefix has been verified.
        payload_len: Option<u64>,
    },
    /// A stored checksum does not match.
    Corrupt(ChecksumField),
}

impl Parsed<'_> {
    /// Verified payload length, when known.
    pub fn payload_len(&self) -> Option<u64> {
        match self {
            Parsed::Complete { payload, .. } => Some(payload.len() as u64),
            Parsed::Incomplete { payload_len, .. } => *payload_len,
            Parsed::Corrupt(_) => None,
        }
    }
}

/// Try to parse one frame from the start of `window`.
///
/// Pure: nothing is consumed. The length checksum is verified before payload
/// availability is considered, so a damaged length never makes the caller
/// wait for bytes that will not come.
pub fn parse_frame(window: &[u8]) -> Parsed<'_> {
    if window.len() < HEADER_SIZE {
        return Parsed::Incomplete {
            needed: HEADER_SIZE as u64,
            payload_len: None,
        };
    }

    let length_bytes = &window[..LENGTH_SIZE];
    let mut header = &window[..HEADER_SIZE];
    let length = header.get_u64_le();
    let length_crc = header.get_u32_le();

    if length_crc != masked_crc32c(length_bytes) {
        return Parsed::Corrupt(ChecksumField::Length);
    }

    let needed = frame_size(length);
    if (window.len() as u64) < needed {
        return Parsed::Incomplete {
            needed,
            payload_len: Some(length),
        };
    }

    // `needed` fits in the window, so it fits in usize.
    let payload_end = HEADER_SIZE + length as usize;
    let payload = &window[HEADER_SIZE..payload_end];
    let mut footer = &window[payload_end..payload_end + FOOTER_SIZE];
    let payload_crc = footer.get_u32_le();

    if payload_crc != masked_crc32c(payload) {
        return Parsed::Corrupt(ChecksumField::Payload);
    }

    Parsed::Complete {
        payload,
        frame_len: payload_end + FOOTER_SIZE,
    }
}

/// Decode a frame from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer; otherwise the buffer
/// is left untouched. Offsets in errors are relative to the buffer start.
pub fn decode_frame(src: &mut BytesMut, max_payload: Option<u64>) -> Result<Option<Bytes>> {
    let parsed = parse_frame(&src[..]);
    if let (Some(len), Some(max)) = (parsed.payload_len(), max_payload) {
        if len > max {
            return Err(FrameError::PayloadTooLarge { size: len, max });
        }
    }

    let (payload_len, frame_len) = match parsed {
        Parsed::Complete { payload, frame_len } => (payload.len(), frame_len),
        Parsed::Incomplete { .. } => return Ok(None), // Need more data
        Parsed::Corrupt(field) => return Err(FrameError::Corrupt { field, offset: 0 }),
    };

    let mut frame = src.split_to(frame_len);
    frame.advance(HEADER_SIZE);
    frame.truncate(payload_len);
    Ok(Some(frame.freeze()))
}

/// Configuration for record writers and readers.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Largest payload a reader accepts. Default: unlimited.
    ///
    /// Writers never refuse a payload on size.
    pub max_payload_size: Option<u64>,
    /// Bytes requested from the source per read. Default: 8 KiB.
    pub read_chunk_size: usize,
    /// Flush the sink after every appended record. Default: false.
    pub flush_after_append: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: None,
            read_chunk_size: DEFAULT_READ_CHUNK,
            flush_after_append: false,
        }
    }
}
